//! Terrain and enemy predicates the rule agent decides on.
//!
//! Rows grow downwards and columns grow in the running direction, so
//! "ahead" is a positive column offset and "below" a positive row offset.

use super::Perception;
use crate::scene::RECEPTIVE_FIELD_SIZE;

use thiserror::Error;

// How many cells below a column are probed for something to land on
const GROUND_PROBE_DEPTH: u8 = 9;

// How many columns ahead are probed for holes
const LOOKAHEAD_COLUMNS: u8 = 4;

// Stalled frames tolerated before the next jump is shortened
const STALL_THRESHOLD: u32 = 1;

/// Longest probe that still stays inside a receptive field.
pub const MAX_PROBE_CELLS: u8 = (RECEPTIVE_FIELD_SIZE - 1) as u8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("{name} must be between 1 and {max}, got {value}")]
    ProbeOutOfRange { name: &'static str, value: u8, max: u8 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RuleOptions {
    pub ground_probe_depth: u8,
    pub lookahead_columns: u8,
    pub stall_threshold: u32,
}

impl RuleOptions {
    /// Both probes must cover at least one cell and stay within
    /// `MAX_PROBE_CELLS`.
    pub fn validate(&self) -> Result<(), OptionsError> {
        let probes = [
            ("ground_probe_depth", self.ground_probe_depth),
            ("lookahead_columns", self.lookahead_columns),
        ];
        for &(name, value) in probes.iter() {
            if value == 0 || value > MAX_PROBE_CELLS {
                return Err(OptionsError::ProbeOutOfRange {
                    name,
                    value,
                    max: MAX_PROBE_CELLS,
                });
            }
        }
        Ok(())
    }
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            ground_probe_depth: GROUND_PROBE_DEPTH,
            lookahead_columns: LOOKAHEAD_COLUMNS,
            stall_threshold: STALL_THRESHOLD,
        }
    }
}

pub fn is_obstacle<P: Perception>(view: &P, row: i32, col: i32) -> bool {
    view.terrain(row, col).is_obstacle()
}

pub fn is_empty<P: Perception>(view: &P, row: i32, col: i32) -> bool {
    view.terrain(row, col).is_empty()
}

pub fn is_over_ground<P: Perception>(view: &P, options: &RuleOptions, row: i32, col: i32) -> bool {
    (1..=i32::from(options.ground_probe_depth)).any(|depth| is_obstacle(view, row + depth, col))
}

/// True when one of the columns ahead has nothing to land on. The agent's own
/// column is not probed.
pub fn is_toward_hole<P: Perception>(view: &P, options: &RuleOptions) -> bool {
    (1..=i32::from(options.lookahead_columns)).any(|col| !is_over_ground(view, options, 0, col))
}

/// About to walk off solid ground while a jump is not available.
pub fn should_cancel_jump_and_back<P: Perception>(view: &P, options: &RuleOptions) -> bool {
    if view.is_able_to_jump() || !view.is_on_ground() {
        return false;
    }
    is_over_ground(view, options, 0, 0) && !is_over_ground(view, options, 0, 1)
}

/// Ground continues one column ahead and stops two columns ahead.
pub fn is_at_edge<P: Perception>(view: &P, options: &RuleOptions) -> bool {
    is_over_ground(view, options, 0, 1) && !is_over_ground(view, options, 0, 2)
}

pub fn should_jump<P: Perception>(view: &P) -> bool {
    if view.is_on_ground() && !view.is_able_to_jump() {
        // Just landed: the jump key has to be released before it works again
        return false;
    }
    if !view.is_on_ground() {
        // Keep holding for the highest jump
        return true;
    }
    is_obstacle(view, 0, 1)
        || !view.enemy(0, 2).is_none()
        || !view.enemy(0, 1).is_none()
        || is_empty(view, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Observation;
    use crate::scene::{EnemyGrid, TerrainGrid};

    // 5 columns wide, agent at row 1 column 0
    fn view(scene: &[&str], enemies: &[&str]) -> Observation {
        Observation {
            level_scene: TerrainGrid::parse(scene).unwrap(),
            enemies: EnemyGrid::parse(enemies).unwrap(),
            ego_row: 1,
            ego_col: 0,
            on_ground: true,
            able_to_jump: true,
            ..Observation::default()
        }
    }

    const NO_ENEMIES: [&str; 3] = [".....", ".....", "....."];

    #[test]
    fn ground_probe_reaches_nine_rows_down() {
        let mut scene = vec!["..."; 11];
        scene[10] = "#..";
        let observation = view(&scene, &["..."]);
        let options = RuleOptions::default();
        assert!(is_over_ground(&observation, &options, 0, 0));
        assert!(!is_over_ground(&observation, &options, 0, 1));

        let shallow = RuleOptions {
            ground_probe_depth: 8,
            ..options
        };
        assert!(!is_over_ground(&observation, &shallow, 0, 0));
    }

    #[test]
    fn probe_lengths_are_bounded() {
        assert_eq!(RuleOptions::default().validate(), Ok(()));
        let longest = RuleOptions {
            ground_probe_depth: MAX_PROBE_CELLS,
            lookahead_columns: MAX_PROBE_CELLS,
            ..RuleOptions::default()
        };
        assert_eq!(longest.validate(), Ok(()));

        let no_ground_probe = RuleOptions {
            ground_probe_depth: 0,
            ..RuleOptions::default()
        };
        assert_eq!(
            no_ground_probe.validate(),
            Err(OptionsError::ProbeOutOfRange {
                name: "ground_probe_depth",
                value: 0,
                max: MAX_PROBE_CELLS,
            })
        );

        let far_lookahead = RuleOptions {
            lookahead_columns: u8::MAX,
            ..RuleOptions::default()
        };
        let err = far_lookahead.validate().unwrap_err();
        assert_eq!(err.to_string(), "lookahead_columns must be between 1 and 18, got 255");
    }

    #[test]
    fn deepest_probe_past_the_grid_reads_nothing() {
        let observation = view(&[".....", ".....", "#####"], &NO_ENEMIES);
        let options = RuleOptions {
            ground_probe_depth: u8::MAX,
            lookahead_columns: u8::MAX,
            ..RuleOptions::default()
        };
        assert!(is_over_ground(&observation, &options, 0, 0));
        assert!(is_toward_hole(&observation, &options));
    }

    #[test]
    fn the_ego_cell_does_not_count_as_ground() {
        let observation = view(&[".....", "#....", "....."], &NO_ENEMIES);
        assert!(!is_over_ground(&observation, &RuleOptions::default(), 0, 0));
    }

    #[test]
    fn hole_in_any_lookahead_column() {
        let options = RuleOptions::default();
        let flat = view(&[".....", ".....", "#####"], &NO_ENEMIES);
        assert!(!is_toward_hole(&flat, &options));

        let far_gap = view(&[".....", ".....", "####."], &NO_ENEMIES);
        assert!(is_toward_hole(&far_gap, &options));

        let own_column_gap = view(&[".....", ".....", ".####"], &NO_ENEMIES);
        assert!(!is_toward_hole(&own_column_gap, &options));
    }

    #[test]
    fn cancel_and_back_needs_a_blocked_jump() {
        let options = RuleOptions::default();
        let mut observation = view(&[".....", ".....", "#...."], &NO_ENEMIES);
        assert!(!should_cancel_jump_and_back(&observation, &options));

        observation.able_to_jump = false;
        assert!(should_cancel_jump_and_back(&observation, &options));

        observation.on_ground = false;
        assert!(!should_cancel_jump_and_back(&observation, &options));
    }

    #[test]
    fn edge_detection() {
        let options = RuleOptions::default();
        assert!(is_at_edge(&view(&[".....", ".....", "##..."], &NO_ENEMIES), &options));
        assert!(!is_at_edge(&view(&[".....", ".....", "###.."], &NO_ENEMIES), &options));
        assert!(!is_at_edge(&view(&[".....", ".....", "#...."], &NO_ENEMIES), &options));
    }

    #[test]
    fn jump_triggers_on_the_ground() {
        let flat = [".....", ".....", "#####"];
        assert!(!should_jump(&view(&flat, &NO_ENEMIES)));
        assert!(should_jump(&view(&[".....", ".#...", "#####"], &NO_ENEMIES)));
        assert!(should_jump(&view(&flat, &[".....", "..g..", "....."])));
        assert!(should_jump(&view(&flat, &[".....", ".k...", "....."])));
        assert!(should_jump(&view(&[".....", ".....", "#.###"], &NO_ENEMIES)));
        // Enemies further ahead are ignored
        assert!(!should_jump(&view(&flat, &[".....", "...g.", "....."])));
    }

    #[test]
    fn jump_after_landing_and_in_the_air() {
        let mut observation = view(&[".....", ".#...", "#####"], &NO_ENEMIES);
        observation.able_to_jump = false;
        assert!(!should_jump(&observation));

        let mut airborne = view(&[".....", ".....", "....."], &NO_ENEMIES);
        airborne.on_ground = false;
        airborne.able_to_jump = false;
        assert!(should_jump(&airborne));
    }
}
