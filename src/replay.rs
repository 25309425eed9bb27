//! Headless host that plays back recorded frames.
//!
//! A scenario is a JSON document listing frames; each frame draws the
//! terrain and enemy layers either as ASCII rows (see `scene` for the
//! legend) or as rows of raw cell codes, as a host dumps them.
//!
//! ```json
//! {
//!   "name": "pipe",
//!   "frames": [
//!     { "scene": ["...", ".#.", "###"], "ego": [1, 0],
//!       "on_ground": true, "able_to_jump": true, "time": 1, "distance": 0 },
//!     { "scene_codes": [[0, 0, 0], [0, -85, 0], [-24, -24, -24]],
//!       "enemy_codes": [[0, 0, 0], [0, 0, 80], [0, 0, 0]], "ego": [1, 0],
//!       "on_ground": true, "able_to_jump": true, "time": 2, "distance": 0 }
//!   ]
//! }
//! ```

use crate::agent::Observation;
use crate::input::Action;
use crate::scene::{EnemyGrid, EnemyKind, Grid, SceneError, Terrain, TerrainGrid};
use crate::Environment;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read scenario {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scenario")]
    Json(#[from] serde_json::Error),
    #[error("frame {frame}: bad {layer} layer")]
    Scene {
        frame: usize,
        layer: &'static str,
        #[source]
        source: SceneError,
    },
    #[error("frame {frame}: {layer} layer must be given either as ASCII rows or as codes")]
    LayerSource { frame: usize, layer: &'static str },
    #[error("frame {frame}: enemy layer is {enemies:?}, terrain layer is {terrain:?}")]
    ShapeMismatch {
        frame: usize,
        terrain: (usize, usize),
        enemies: (usize, usize),
    },
    #[error("frame {frame}: ego cell ({row}, {col}) is outside the grid")]
    EgoOutOfRange { frame: usize, row: i32, col: i32 },
    #[error("scenario has no frames")]
    NoFrames,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameRecord {
    #[serde(default)]
    pub scene: Option<Vec<String>>,
    #[serde(default)]
    pub scene_codes: Option<Vec<Vec<Terrain>>>,
    #[serde(default)]
    pub enemies: Option<Vec<String>>,
    #[serde(default)]
    pub enemy_codes: Option<Vec<Vec<EnemyKind>>>,
    #[serde(default)]
    pub ego: Option<(i32, i32)>,
    pub on_ground: bool,
    pub able_to_jump: bool,
    pub time: i32,
    pub distance: i32,
}

// At most one of `ascii` and `codes` may be given for a layer.
fn build_layer<T, F>(
    frame: usize,
    layer: &'static str,
    ascii: Option<Vec<String>>,
    codes: Option<Vec<Vec<T>>>,
    parse: F,
) -> Result<Option<Grid<T>>, ReplayError>
where
    T: Copy + Default,
    F: FnOnce(&[String]) -> Result<Grid<T>, SceneError>,
{
    let grid = match (ascii, codes) {
        (Some(_), Some(_)) => return Err(ReplayError::LayerSource { frame, layer }),
        (Some(rows), None) => parse(&rows),
        (None, Some(rows)) => Grid::from_rows(rows),
        (None, None) => return Ok(None),
    };
    grid.map(Some)
        .map_err(|source| ReplayError::Scene { frame, layer, source })
}

impl FrameRecord {
    fn into_observation(self, frame: usize) -> Result<Observation, ReplayError> {
        let level_scene = build_layer(frame, "terrain", self.scene, self.scene_codes, |rows| {
            TerrainGrid::parse(rows)
        })?
        .ok_or(ReplayError::LayerSource {
            frame,
            layer: "terrain",
        })?;
        let shape = (level_scene.rows(), level_scene.cols());

        let enemies = build_layer(frame, "enemy", self.enemies, self.enemy_codes, |rows| {
            EnemyGrid::parse(rows)
        })?
        .unwrap_or_else(|| EnemyGrid::new(shape.0, shape.1));
        if (enemies.rows(), enemies.cols()) != shape {
            return Err(ReplayError::ShapeMismatch {
                frame,
                terrain: shape,
                enemies: (enemies.rows(), enemies.cols()),
            });
        }

        let (ego_row, ego_col) = self
            .ego
            .unwrap_or((shape.0 as i32 / 2, shape.1 as i32 / 2));
        if !level_scene.contains(ego_row, ego_col) {
            return Err(ReplayError::EgoOutOfRange {
                frame,
                row: ego_row,
                col: ego_col,
            });
        }

        Ok(Observation {
            level_scene,
            enemies,
            ego_row,
            ego_col,
            on_ground: self.on_ground,
            able_to_jump: self.able_to_jump,
            time_spent: self.time,
            distance_passed_cells: self.distance,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioRecord {
    #[serde(default)]
    name: Option<String>,
    frames: Vec<FrameRecord>,
}

#[derive(Clone, Debug)]
pub struct Scenario {
    pub name: String,
    pub frames: Vec<Observation>,
}

impl Scenario {
    pub fn from_json(json: &str, default_name: &str) -> Result<Self, ReplayError> {
        let record: ScenarioRecord = serde_json::from_str(json)?;
        if record.frames.is_empty() {
            return Err(ReplayError::NoFrames);
        }
        let frames = record
            .frames
            .into_iter()
            .enumerate()
            .map(|(i, frame)| frame.into_observation(i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: record.name.unwrap_or_else(|| default_name.to_string()),
            frames,
        })
    }

    /// Loads a scenario file; unnamed scenarios are named after the file stem.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let default_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_json(&json, &default_name)
    }
}

/// Plays a scenario's frames back in order, recording what the agent did.
pub struct ReplayEnvironment {
    scenario: Scenario,
    cursor: usize,
    actions: Vec<Action>,
}

impl ReplayEnvironment {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            cursor: 0,
            actions: Vec::new(),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

impl Environment for ReplayEnvironment {
    fn reset(&mut self) -> anyhow::Result<()> {
        debug!(scenario = %self.scenario.name, "rewinding replay");
        self.cursor = 0;
        self.actions.clear();
        Ok(())
    }

    fn observe(&mut self) -> anyhow::Result<Option<Observation>> {
        Ok(self.scenario.frames.get(self.cursor).cloned())
    }

    fn perform_action(&mut self, action: Action) -> anyhow::Result<()> {
        self.actions.push(action);
        self.cursor += 1;
        Ok(())
    }
}
