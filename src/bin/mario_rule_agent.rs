use mario_rule_agent::agent::rules::MAX_PROBE_CELLS;
use mario_rule_agent::agent::{Branch, RuleAgent, RuleOptions};
use mario_rule_agent::input::Action;
use mario_rule_agent::replay::{ReplayEnvironment, Scenario};
use mario_rule_agent::{run_episode, EpisodeOptions, EpisodeSummary};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Replays recorded frames through the rule agent and prints what it pressed.
#[derive(Debug, Parser)]
#[command(name = "mario_rule_agent", version)]
struct Args {
    /// Scenario files (JSON) to replay
    #[arg(required = true)]
    scenarios: Vec<PathBuf>,

    /// Stalled frames tolerated before the next jump is shortened
    #[arg(long)]
    stall_threshold: Option<u32>,

    /// Rows probed below a column when looking for ground
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=MAX_PROBE_CELLS as i64))]
    ground_probe_depth: Option<u8>,

    /// Columns ahead probed for holes
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=MAX_PROBE_CELLS as i64))]
    lookahead_columns: Option<u8>,

    /// Stop each replay after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Print one JSON document per scenario instead of text
    #[arg(long)]
    json: bool,
}

impl Args {
    fn rule_options(&self) -> RuleOptions {
        let defaults = RuleOptions::default();
        RuleOptions {
            ground_probe_depth: self.ground_probe_depth.unwrap_or(defaults.ground_probe_depth),
            lookahead_columns: self.lookahead_columns.unwrap_or(defaults.lookahead_columns),
            stall_threshold: self.stall_threshold.unwrap_or(defaults.stall_threshold),
        }
    }
}

#[derive(Serialize)]
struct FrameLine {
    frame: u64,
    branch: Option<Branch>,
    action: Action,
}

#[derive(Serialize)]
struct Report<'a> {
    scenario: &'a str,
    frames: u64,
    distance: i32,
    branches: HashMap<Branch, u64>,
    actions: Vec<FrameLine>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mario_rule_agent=info,warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn replay(args: &Args, path: &Path) -> Result<()> {
    let scenario = Scenario::from_path(path)
        .with_context(|| format!("failed to load scenario {}", path.display()))?;
    let name = scenario.name.clone();

    let mut env = ReplayEnvironment::new(scenario);
    let mut agent = RuleAgent::new(args.rule_options())
        .context("invalid rule options")?
        .with_name(name.clone());
    let options = EpisodeOptions {
        max_frames: args.max_frames,
    };

    let mut lines = Vec::new();
    let summary: EpisodeSummary = run_episode(&mut env, &mut agent, &options, |frame, agent, action| {
        lines.push(FrameLine {
            frame,
            branch: agent.last_branch(),
            action,
        });
    })
    .with_context(|| format!("failed to replay {}", name))?;

    let mut branches = HashMap::new();
    for line in &lines {
        if let Some(branch) = line.branch {
            *branches.entry(branch).or_insert(0) += 1;
        }
    }

    if args.json {
        let report = Report {
            scenario: &name,
            frames: summary.frames,
            distance: summary.distance_passed_cells,
            branches,
            actions: lines,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("== {}", name);
    for line in &lines {
        let branch = line.branch.map(Branch::as_str).unwrap_or("-");
        println!("{:>5}  {:<16}  {}", line.frame, branch, line.action);
    }
    let counts: Vec<String> = Branch::ALL
        .iter()
        .map(|branch| format!("{}={}", branch, branches.get(branch).unwrap_or(&0)))
        .collect();
    println!(
        "{} frames, distance {}, {:?} ({})",
        summary.frames,
        summary.distance_passed_cells,
        summary.end,
        counts.join(", ")
    );
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    for path in &args.scenarios {
        replay(&args, path)?;
    }
    Ok(())
}
