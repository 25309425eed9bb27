pub mod agent;
pub mod input;
pub mod replay;
pub mod scene;

use agent::{Agent, Observation};
use input::Action;

use anyhow::{Context, Result};
use tracing::info;

/// A host simulation an agent can be run against.
pub trait Environment {
    /// Puts the host back at the start of an episode.
    fn reset(&mut self) -> Result<()>;

    /// The observation for the current frame, or `None` once the episode is over.
    fn observe(&mut self) -> Result<Option<Observation>>;

    fn perform_action(&mut self, action: Action) -> Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct EpisodeOptions {
    /// Stop after this many frames even if the host has more.
    pub max_frames: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EpisodeEnd {
    HostFinished,
    FrameLimit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpisodeSummary {
    pub agent: String,
    pub frames: u64,
    pub time_spent: i32,
    pub distance_passed_cells: i32,
    pub end: EpisodeEnd,
}

/// Plays one episode of `agent` against `env`. `on_frame` is called after
/// every action with the frame index, the agent and the action it chose.
pub fn run_episode<E, A, F>(
    env: &mut E,
    agent: &mut A,
    options: &EpisodeOptions,
    mut on_frame: F,
) -> Result<EpisodeSummary>
where
    E: Environment,
    A: Agent,
    F: FnMut(u64, &A, Action),
{
    env.reset().context("failed to reset environment")?;
    agent.reset();
    info!(agent = agent.name(), "episode started");

    let mut frames = 0;
    let mut time_spent = 0;
    let mut distance_passed_cells = 0;

    let end = loop {
        if options.max_frames.map_or(false, |max| frames >= max) {
            break EpisodeEnd::FrameLimit;
        }

        let observation = match env
            .observe()
            .with_context(|| format!("failed to observe frame {}", frames))?
        {
            Some(observation) => observation,
            None => break EpisodeEnd::HostFinished,
        };
        time_spent = observation.time_spent;
        distance_passed_cells = observation.distance_passed_cells;

        agent.integrate_observation(observation);
        let action = agent.get_action();
        env.perform_action(action)
            .with_context(|| format!("failed to perform action on frame {}", frames))?;

        on_frame(frames, agent, action);
        frames += 1;
    };

    info!(
        agent = agent.name(),
        frames,
        distance = distance_passed_cells,
        end = ?end,
        "episode finished"
    );

    Ok(EpisodeSummary {
        agent: agent.name().to_string(),
        frames,
        time_spent,
        distance_passed_cells,
        end,
    })
}
