//! Engine configuration.
//!
//! Defaults reproduce the stock game: a 1000×1000 logical canvas, contours at
//! 30% of its shorter edge, five cutting attempts. Every field is optional in
//! serialized form; missing fields take their default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cut::CutCfg;
use crate::shape::ShapeCfg;

/// Error for configuration values that would break an invariant downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Invalid { reason: String },
}

impl ConfigError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { reason } => write!(f, "invalid engine config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub shape: ShapeCfg,
    pub cut: CutCfg,
    /// Snap distance for completing a piece, in logical canvas units.
    pub snap_tolerance: f64,
    /// Scattered centroids keep this fraction of each canvas edge as margin.
    pub scatter_margin_frac: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shape: ShapeCfg::default(),
            cut: CutCfg::default(),
            snap_tolerance: 20.0,
            scatter_margin_frac: 0.1,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.shape;
        if !(s.logical_size.is_finite() && s.logical_size > 0.0) {
            return Err(ConfigError::invalid("shape.logical_size must be finite and > 0"));
        }
        if !(s.diameter_frac > 0.0 && s.diameter_frac <= 1.0) {
            return Err(ConfigError::invalid("shape.diameter_frac must be in (0, 1]"));
        }
        if s.polygon_min_vertices < 3 || s.polygon_max_vertices <= s.polygon_min_vertices {
            return Err(ConfigError::invalid(
                "polygon vertex range must satisfy 3 <= min < max",
            ));
        }
        if s.curve_vertices < 3 {
            return Err(ConfigError::invalid("shape.curve_vertices must be >= 3"));
        }
        if !(0.0..0.5).contains(&s.cloud_amplitude) {
            return Err(ConfigError::invalid("shape.cloud_amplitude must be in [0, 0.5)"));
        }
        if !(0.0..0.9).contains(&s.jagged_jitter) {
            return Err(ConfigError::invalid("shape.jagged_jitter must be in [0, 0.9)"));
        }
        if self.cut.max_attempts == 0 {
            return Err(ConfigError::invalid("cut.max_attempts must be > 0"));
        }
        let g = &self.cut.geom;
        if !(g.eps_on_line > 0.0 && g.eps_merge >= 0.0 && g.min_area >= 0.0) {
            return Err(ConfigError::invalid("geometry tolerances must be non-negative"));
        }
        if !(self.snap_tolerance.is_finite() && self.snap_tolerance >= 0.0) {
            return Err(ConfigError::invalid("snap_tolerance must be finite and >= 0"));
        }
        if !(0.0..0.5).contains(&self.scatter_margin_frac) {
            return Err(ConfigError::invalid("scatter_margin_frac must be in [0, 0.5)"));
        }
        Ok(())
    }
}
