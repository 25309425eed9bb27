mod progress;
mod rule_agent;
pub mod rules;

pub use self::progress::{ProgressSnapshot, StallTracker};
pub use self::rule_agent::{Branch, Decision, RuleAgent};
pub use self::rules::{OptionsError, RuleOptions};

use crate::input::Action;
use crate::scene::{EnemyGrid, EnemyKind, Terrain, TerrainGrid, VIEW_SIZE};

/// Read-only view of the world around the agent for a single frame.
///
/// Cell lookups are relative to the agent's own cell: `(1, 0)` is the cell
/// directly below it, `(0, 1)` the one in front of it.
pub trait Perception {
    fn terrain(&self, row_offset: i32, col_offset: i32) -> Terrain;
    fn enemy(&self, row_offset: i32, col_offset: i32) -> EnemyKind;
    fn is_on_ground(&self) -> bool;
    fn is_able_to_jump(&self) -> bool;
    fn time_spent(&self) -> i32;
    fn distance_passed_cells(&self) -> i32;
}

/// Everything the host tells an agent about one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub level_scene: TerrainGrid,
    pub enemies: EnemyGrid,
    pub ego_row: i32,
    pub ego_col: i32,
    pub on_ground: bool,
    pub able_to_jump: bool,
    pub time_spent: i32,
    pub distance_passed_cells: i32,
}

impl Default for Observation {
    fn default() -> Self {
        Self {
            level_scene: TerrainGrid::default(),
            enemies: EnemyGrid::default(),
            ego_row: VIEW_SIZE as i32,
            ego_col: VIEW_SIZE as i32,
            on_ground: false,
            able_to_jump: false,
            time_spent: 0,
            distance_passed_cells: 0,
        }
    }
}

impl Perception for Observation {
    fn terrain(&self, row_offset: i32, col_offset: i32) -> Terrain {
        self.level_scene
            .get(self.ego_row.saturating_add(row_offset), self.ego_col.saturating_add(col_offset))
    }

    fn enemy(&self, row_offset: i32, col_offset: i32) -> EnemyKind {
        self.enemies
            .get(self.ego_row.saturating_add(row_offset), self.ego_col.saturating_add(col_offset))
    }

    fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    fn is_able_to_jump(&self) -> bool {
        self.able_to_jump
    }

    fn time_spent(&self) -> i32 {
        self.time_spent
    }

    fn distance_passed_cells(&self) -> i32 {
        self.distance_passed_cells
    }
}

/// Life cycle the host drives an agent through: `reset` once per episode,
/// then `integrate_observation` followed by `get_action` every frame.
pub trait Agent {
    fn name(&self) -> &str;

    fn reset(&mut self);

    fn integrate_observation(&mut self, observation: Observation);

    fn get_action(&mut self) -> Action;

    fn give_intermediate_reward(&mut self, _reward: f32) {}
}
