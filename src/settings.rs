//! run settings for shapetrace
//! these drive the host loop: which shapes to try, how hard to search, when to stop

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TraceError, TraceResult};
use crate::shapes::ShapeKind;
use crate::worker::{StepParams, StepRequest};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// kinds sampled per step; repeating a kind makes it proportionally more likely
    pub shape_types: Vec<ShapeKind>,
    /// paint opacity of every shape (0-255)
    pub alpha: u8,
    /// hill-climb iterations per step
    pub mutations: u32,
    /// optimizer steps per host request
    pub batch_size: u32,
    /// stop once this many shapes have been accepted
    pub target_shapes: usize,
    /// wider targets are downscaled to this width before init (aspect kept)
    pub max_resolution: u32,
    /// stop after this many batches in a row accept nothing
    pub max_idle_batches: u32,
    /// fixed RNG seed (None = fresh entropy per run)
    pub seed: Option<u64>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            shape_types: vec![
                ShapeKind::RotatedEllipse,
                ShapeKind::Triangle,
                ShapeKind::RotatedRectangle,
                ShapeKind::RotatedEllipse,
            ],
            alpha: 96,
            mutations: 200,
            batch_size: 10,
            target_shapes: 5000,
            max_resolution: 300,
            max_idle_batches: 50,
            seed: None,
        }
    }
}

impl RunSettings {
    /// save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> TraceResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load settings, falling back to defaults when the file is missing or unreadable
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse settings, using defaults");
                    Self::default()
                }
            },
            // file doesn't exist or can't be read - use defaults
            Err(_) => Self::default(),
        }
    }

    /// load settings, surfacing every failure
    pub fn load_strict(path: impl AsRef<Path>) -> TraceResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> TraceResult<()> {
        if self.shape_types.is_empty() {
            return Err(TraceError::Settings("shape_types must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(TraceError::Settings("batch_size must be >= 1".into()));
        }
        if self.max_resolution == 0 {
            return Err(TraceError::Settings("max_resolution must be >= 1".into()));
        }
        Ok(())
    }

    /// wire form of one host step
    pub fn step_request(&self) -> StepRequest {
        StepRequest {
            shape_types: self.shape_types.iter().map(|k| k.as_str().to_owned()).collect(),
            alpha: self.alpha as i64,
            mutations: self.mutations as i64,
            count: self.batch_size as i64,
        }
    }

    pub fn step_params(&self) -> StepParams {
        StepParams {
            kinds: self.shape_types.clone(),
            alpha: self.alpha,
            mutations: self.mutations,
            count: self.batch_size,
        }
    }

    /// size the target is scaled to before init; only width is limited
    pub fn working_size(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.max_resolution || width == 0 {
            return (width, height);
        }
        let scaled_h = (height as u64 * self.max_resolution as u64 / width as u64).max(1) as u32;
        (self.max_resolution, scaled_h)
    }
}
