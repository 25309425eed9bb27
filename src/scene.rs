use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;

// How many cells the agent sees to the left, right, top and bottom of itself
pub const VIEW_SIZE: usize = 9;

// The receptive field is a 19x19 square of cells with the agent in the middle.
pub const RECEPTIVE_FIELD_SIZE: usize = (VIEW_SIZE * 2) + 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("grid has no rows")]
    Empty,
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown {layer} glyph {glyph:?} at row {row}, column {col}")]
    UnknownGlyph {
        layer: &'static str,
        glyph: char,
        row: usize,
        col: usize,
    },
}

/// Generalized level-scene classification of a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Terrain {
    Empty,
    Brick,
    BorderCannotPassThrough,
    FlowerPotOrCannon,
    Ladder,
    Other(i32),
}

impl Terrain {
    pub const EMPTY_CODE: i32 = 0;
    pub const BRICK_CODE: i32 = -24;
    pub const BORDER_CANNOT_PASS_THROUGH_CODE: i32 = -60;
    pub const FLOWER_POT_OR_CANNON_CODE: i32 = -85;
    pub const LADDER_CODE: i32 = 61;

    pub fn from_code(code: i32) -> Self {
        use self::Terrain::*;

        match code {
            Self::EMPTY_CODE => Empty,
            Self::BRICK_CODE => Brick,
            Self::BORDER_CANNOT_PASS_THROUGH_CODE => BorderCannotPassThrough,
            Self::FLOWER_POT_OR_CANNON_CODE => FlowerPotOrCannon,
            Self::LADDER_CODE => Ladder,
            other => Other(other),
        }
    }

    pub fn code(self) -> i32 {
        use self::Terrain::*;

        match self {
            Empty => Self::EMPTY_CODE,
            Brick => Self::BRICK_CODE,
            BorderCannotPassThrough => Self::BORDER_CANNOT_PASS_THROUGH_CODE,
            FlowerPotOrCannon => Self::FLOWER_POT_OR_CANNON_CODE,
            Ladder => Self::LADDER_CODE,
            Other(code) => code,
        }
    }

    /// Cells the agent cannot walk through and can stand on.
    pub fn is_obstacle(self) -> bool {
        use self::Terrain::*;

        match self {
            Brick | BorderCannotPassThrough | FlowerPotOrCannon | Ladder => true,
            Empty | Other(_) => false,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Terrain::Empty
    }

    fn from_glyph(glyph: char) -> Option<Self> {
        use self::Terrain::*;

        match glyph {
            '.' => Some(Empty),
            '#' => Some(Brick),
            'B' => Some(BorderCannotPassThrough),
            'P' => Some(FlowerPotOrCannon),
            'H' => Some(Ladder),
            // Coins, hills and the rest of the decorative codes
            'o' => Some(Other(1)),
            _ => None,
        }
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Terrain::Empty
    }
}

impl From<i32> for Terrain {
    fn from(code: i32) -> Self {
        Terrain::from_code(code)
    }
}

impl From<Terrain> for i32 {
    fn from(terrain: Terrain) -> Self {
        terrain.code()
    }
}

/// Hostile entity occupying a cell, if any.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum EnemyKind {
    None,
    Goomba,
    GoombaWinged,
    RedKoopa,
    RedKoopaWinged,
    GreenKoopa,
    GreenKoopaWinged,
    BulletBill,
    Spiky,
    SpikyWinged,
    EnemyFlower,
    Shell,
    Other(i32),
}

// Sprite kind codes as reported in the enemies layer
const ENEMY_CODES: [(EnemyKind, i32); 12] = [
    (EnemyKind::None, 0),
    (EnemyKind::Goomba, 80),
    (EnemyKind::GoombaWinged, 95),
    (EnemyKind::RedKoopa, 82),
    (EnemyKind::RedKoopaWinged, 97),
    (EnemyKind::GreenKoopa, 81),
    (EnemyKind::GreenKoopaWinged, 96),
    (EnemyKind::BulletBill, 84),
    (EnemyKind::Spiky, 93),
    (EnemyKind::SpikyWinged, 99),
    (EnemyKind::EnemyFlower, 91),
    (EnemyKind::Shell, 13),
];

impl EnemyKind {
    pub fn from_code(code: i32) -> Self {
        ENEMY_CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(kind, _)| *kind)
            .unwrap_or(EnemyKind::Other(code))
    }

    pub fn code(self) -> i32 {
        match self {
            EnemyKind::Other(code) => code,
            kind => ENEMY_CODES
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, code)| *code)
                .unwrap_or_default(),
        }
    }

    pub fn is_none(self) -> bool {
        self == EnemyKind::None
    }

    fn from_glyph(glyph: char) -> Option<Self> {
        use self::EnemyKind::*;

        match glyph {
            '.' => Some(None),
            'g' => Some(Goomba),
            'G' => Some(GoombaWinged),
            'r' => Some(RedKoopa),
            'R' => Some(RedKoopaWinged),
            'k' => Some(GreenKoopa),
            'K' => Some(GreenKoopaWinged),
            'b' => Some(BulletBill),
            's' => Some(Spiky),
            'S' => Some(SpikyWinged),
            'f' => Some(EnemyFlower),
            'c' => Some(Shell),
            _ => Option::None,
        }
    }
}

impl Default for EnemyKind {
    fn default() -> Self {
        EnemyKind::None
    }
}

impl From<i32> for EnemyKind {
    fn from(code: i32) -> Self {
        EnemyKind::from_code(code)
    }
}

impl From<EnemyKind> for i32 {
    fn from(kind: EnemyKind) -> Self {
        kind.code()
    }
}

/// Row-major receptive field. Reads outside the field yield the default cell.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

pub type TerrainGrid = Grid<Terrain>;
pub type EnemyGrid = Grid<EnemyKind>;

impl<T: Copy + Default> Grid<T> {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![T::default(); rows * cols],
        }
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, SceneError> {
        let cols = rows.first().map(Vec::len).ok_or(SceneError::Empty)?;
        if cols == 0 {
            return Err(SceneError::Empty);
        }
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(SceneError::RaggedRow {
                    row: i,
                    expected: cols,
                    actual: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    pub fn get(&self, row: i32, col: i32) -> T {
        if self.contains(row, col) {
            self.cells[row as usize * self.cols + col as usize]
        } else {
            T::default()
        }
    }

    /// Writes are silently dropped outside the field.
    pub fn set(&mut self, row: i32, col: i32, value: T) {
        if self.contains(row, col) {
            self.cells[row as usize * self.cols + col as usize] = value;
        }
    }

    fn parse_glyphs<R, F>(rows: &[R], layer: &'static str, from_glyph: F) -> Result<Self, SceneError>
    where
        R: AsRef<str>,
        F: Fn(char) -> Option<T>,
    {
        let mut parsed = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let cells = row
                .as_ref()
                .chars()
                .enumerate()
                .map(|(j, glyph)| {
                    from_glyph(glyph).ok_or(SceneError::UnknownGlyph {
                        layer,
                        glyph,
                        row: i,
                        col: j,
                    })
                })
                .collect::<Result<Vec<T>, _>>()?;
            parsed.push(cells);
        }
        Self::from_rows(parsed)
    }
}

impl Grid<Terrain> {
    /// Builds a terrain grid from ASCII rows (`.` empty, `#` brick, `B` border,
    /// `P` pipe or cannon, `H` ladder, `o` anything else).
    pub fn parse<R: AsRef<str>>(rows: &[R]) -> Result<Self, SceneError> {
        Self::parse_glyphs(rows, "terrain", Terrain::from_glyph)
    }
}

impl Grid<EnemyKind> {
    pub fn parse<R: AsRef<str>>(rows: &[R]) -> Result<Self, SceneError> {
        Self::parse_glyphs(rows, "enemy", EnemyKind::from_glyph)
    }
}

impl Default for Grid<Terrain> {
    fn default() -> Self {
        Grid::new(RECEPTIVE_FIELD_SIZE, RECEPTIVE_FIELD_SIZE)
    }
}

impl Default for Grid<EnemyKind> {
    fn default() -> Self {
        Grid::new(RECEPTIVE_FIELD_SIZE, RECEPTIVE_FIELD_SIZE)
    }
}

impl<T: Copy + Default + Into<i32>> fmt::Debug for Grid<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.cols.max(1)) {
            let codes: Vec<i32> = row.iter().map(|cell| (*cell).into()).collect();
            writeln!(formatter, "{:?}", codes)?;
        }
        Ok(())
    }
}
