use serde::Serialize;

use std::fmt;
use std::ops::{Index, IndexMut};

//
// The keys of the controller, in the order the host reads them.
//

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Left = 0,
    Right = 1,
    Down = 2,
    Jump = 3,
    Speed = 4,
    Up = 5,
}

pub const NUMBER_OF_KEYS: usize = 6;

impl Key {
    pub const ALL: [Key; NUMBER_OF_KEYS] = [
        Key::Left,
        Key::Right,
        Key::Down,
        Key::Jump,
        Key::Speed,
        Key::Up,
    ];

    fn label(self) -> &'static str {
        match self {
            Key::Left => "L",
            Key::Right => "R",
            Key::Down => "D",
            Key::Jump => "J",
            Key::Speed => "S",
            Key::Up => "U",
        }
    }
}

/// Which keys are held down for one frame.
#[derive(Copy, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Action {
    keys: [bool; NUMBER_OF_KEYS],
}

impl Action {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn right_only() -> Self {
        let mut action = Self::new();
        action[Key::Right] = true;
        action
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self[key]
    }

    pub fn pressed(&self) -> impl Iterator<Item = Key> + '_ {
        Key::ALL.iter().copied().filter(move |key| self.is_pressed(*key))
    }

    pub fn as_array(&self) -> [bool; NUMBER_OF_KEYS] {
        self.keys
    }
}

impl Index<Key> for Action {
    type Output = bool;

    fn index(&self, key: Key) -> &bool {
        &self.keys[key as usize]
    }
}

impl IndexMut<Key> for Action {
    fn index_mut(&mut self, key: Key) -> &mut bool {
        &mut self.keys[key as usize]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.pressed().map(Key::label).collect();
        if labels.is_empty() {
            formatter.write_str("-")
        } else {
            formatter.write_str(&labels.join(" "))
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Action({})", self)
    }
}
