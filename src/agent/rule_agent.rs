use super::progress::{ProgressSnapshot, StallTracker};
use super::rules::{self, OptionsError, RuleOptions};
use super::{Agent, Observation, Perception};
use crate::input::{Action, Key};

use serde::{Serialize, Serializer};
use tracing::debug;

use std::fmt;

/// Which rule produced the action of a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Branch {
    CancelJumpBack,
    CancelJump,
    Jump,
    Default,
}

impl Branch {
    pub const ALL: [Branch; 4] = [
        Branch::CancelJumpBack,
        Branch::CancelJump,
        Branch::Jump,
        Branch::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Branch::CancelJumpBack => "cancel jump back",
            Branch::CancelJump => "cancel jump",
            Branch::Jump => "jump",
            Branch::Default => "default",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// Same tag as the log line, so reports and logs can be grepped together
impl Serialize for Branch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub branch: Branch,
}

/// Hand written controller: run right, jump over whatever is in the way and
/// back off from holes it cannot jump over yet.
pub struct RuleAgent {
    name: String,
    options: RuleOptions,
    action: Action,
    stall: StallTracker,
    // Set when a jump is issued while stuck, so the next frame shortens it
    should_short_jump: bool,
    last_branch: Option<Branch>,
    observation: Option<Observation>,
}

impl RuleAgent {
    pub const NAME: &'static str = "RuleAgent";

    /// Fails when a probe length in `options` is out of range.
    pub fn new(options: RuleOptions) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self::with_options(options))
    }

    fn with_options(options: RuleOptions) -> Self {
        let mut agent = Self {
            name: Self::NAME.to_string(),
            options,
            action: Action::right_only(),
            stall: StallTracker::default(),
            should_short_jump: false,
            last_branch: None,
            observation: None,
        };
        agent.reset();
        agent
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn stall_counter(&self) -> u32 {
        self.stall.stall_counter()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.stall.snapshot()
    }

    pub fn should_short_jump(&self) -> bool {
        self.should_short_jump
    }

    /// Branch taken on the most recent frame of the current episode.
    pub fn last_branch(&self) -> Option<Branch> {
        self.last_branch
    }

    /// Resets the episode state, seeding the progress snapshot from `view`.
    pub fn reset_from<P: Perception>(&mut self, view: &P) {
        self.reset_with(view.time_spent(), view.distance_passed_cells());
    }

    fn reset_with(&mut self, time: i32, distance: i32) {
        self.action = Action::right_only();
        self.should_short_jump = false;
        self.last_branch = None;
        self.stall.reseed(time, distance);
    }

    fn hold(&mut self, left: bool, right: bool, jump: bool) {
        self.action[Key::Left] = left;
        self.action[Key::Right] = right;
        self.action[Key::Jump] = jump;
    }

    /// Picks the keys to hold for the frame `view` describes.
    pub fn decide<P: Perception>(&mut self, view: &P) -> Decision {
        let time = view.time_spent();
        let distance = view.distance_passed_cells();
        self.stall.begin_frame(time, distance);

        self.action[Key::Speed] = rules::is_toward_hole(view, &self.options);

        let branch = if rules::should_cancel_jump_and_back(view, &self.options) {
            self.hold(true, false, false);
            Branch::CancelJumpBack
        } else if self.should_short_jump {
            self.hold(false, true, false);
            if rules::is_at_edge(view, &self.options) {
                // Running backwards through the jump shortens it
                self.hold(true, false, false);
            }
            self.should_short_jump = false;
            Branch::CancelJump
        } else if rules::should_jump(view) {
            self.hold(false, true, true);
            self.should_short_jump = self.stall.stall_counter() > self.options.stall_threshold;
            Branch::Jump
        } else {
            self.hold(false, true, false);
            Branch::Default
        };

        debug!(
            branch = %branch,
            time,
            distance,
            stall_counter = self.stall.stall_counter(),
            short_jump_pending = self.should_short_jump,
            action = %self.action,
            "frame decided"
        );

        self.stall.end_frame(time, distance);
        self.last_branch = Some(branch);

        Decision {
            action: self.action,
            branch,
        }
    }
}

impl Default for RuleAgent {
    fn default() -> Self {
        Self::with_options(RuleOptions::default())
    }
}

impl fmt::Debug for RuleAgent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RuleAgent")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("progress", &self.stall.snapshot())
            .field("stall_counter", &self.stall.stall_counter())
            .field("should_short_jump", &self.should_short_jump)
            .finish()
    }
}

impl Agent for RuleAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        let (time, distance) = self
            .observation
            .as_ref()
            .map(|o| (o.time_spent, o.distance_passed_cells))
            .unwrap_or((0, 0));
        self.reset_with(time, distance);
    }

    fn integrate_observation(&mut self, observation: Observation) {
        self.observation = Some(observation);
    }

    fn get_action(&mut self) -> Action {
        // Nothing observed yet: keep running right
        let observation = match self.observation.take() {
            Some(observation) => observation,
            None => return self.action,
        };
        let decision = self.decide(&observation);
        self.observation = Some(observation);
        decision.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{EnemyGrid, TerrainGrid};

    fn frame(scene: &[&str], time: i32, distance: i32) -> Observation {
        let cols = scene[0].len();
        let enemies = vec![".".repeat(cols); scene.len()];
        Observation {
            level_scene: TerrainGrid::parse(scene).unwrap(),
            enemies: EnemyGrid::parse(&enemies).unwrap(),
            ego_row: 1,
            ego_col: 0,
            on_ground: true,
            able_to_jump: true,
            time_spent: time,
            distance_passed_cells: distance,
        }
    }

    #[test]
    fn flat_ground_runs_right() {
        let mut agent = RuleAgent::default();
        let decision = agent.decide(&frame(&[".....", ".....", "#####"], 1, 1));
        assert_eq!(decision.branch, Branch::Default);
        assert_eq!(decision.action, Action::right_only());
    }

    #[test]
    fn get_action_without_an_observation_keeps_running() {
        let mut agent = RuleAgent::default();
        assert_eq!(agent.get_action(), Action::right_only());
        assert_eq!(agent.stall_counter(), 0);
    }

    #[test]
    fn reset_seeds_from_the_last_observation() {
        let mut agent = RuleAgent::default();
        agent.integrate_observation(frame(&[".....", ".....", "#####"], 30, 12));
        agent.reset();
        assert_eq!(agent.snapshot(), ProgressSnapshot { time: 30, distance: 12 });
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        let options = RuleOptions {
            ground_probe_depth: 0,
            ..RuleOptions::default()
        };
        assert!(matches!(
            RuleAgent::new(options),
            Err(OptionsError::ProbeOutOfRange {
                name: "ground_probe_depth",
                ..
            })
        ));
        assert!(RuleAgent::new(RuleOptions::default()).is_ok());
    }

    #[test]
    fn branch_tags_serialize_like_the_log_line() {
        for branch in Branch::ALL.iter() {
            let json = serde_json::to_string(branch).unwrap();
            assert_eq!(json, format!("\"{}\"", branch));
        }
        assert_eq!(
            serde_json::to_string(&Branch::CancelJumpBack).unwrap(),
            "\"cancel jump back\""
        );

        let mut counts = std::collections::HashMap::new();
        counts.insert(Branch::CancelJump, 2u64);
        assert_eq!(serde_json::to_string(&counts).unwrap(), r#"{"cancel jump":2}"#);
    }

    #[test]
    fn debug_names_the_agent() {
        let agent = RuleAgent::default().with_name("runner");
        assert_eq!(agent.name(), "runner");
        assert!(format!("{:?}", agent).contains("runner"));
    }
}
