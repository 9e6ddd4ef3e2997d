//! Game tuning and balance
//!
//! Loaded from a JSON file; any field left out falls back to `consts`.

use std::fs;
use std::io;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed tuning file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Playfield ===
    pub playfield_width: f32,
    pub playfield_height: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_y: f32,
    /// Duration of each smoothed move command
    pub paddle_move_duration: f32,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_mass: f32,
    /// Impulse applied on both axes at session start
    pub ball_impulse: f32,
    pub ball_reset_pos: Vec2,
    /// k in speed' = speed * (1 + k / speed)
    pub speed_nudge: f32,
    pub min_vertical_speed: f32,
    pub vertical_kick: f32,

    // === Blocks ===
    pub block_width: f32,
    pub block_height: f32,
    pub block_rows: usize,
    pub block_columns: usize,
    pub block_recover_time: f64,
    pub burst_lifetime: f32,

    // === Control signal ===
    pub sample_warmup: f64,
    pub sample_period: f64,
    pub sensitivity_gain: f32,
    pub centering_offset: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            playfield_width: PLAYFIELD_WIDTH,
            playfield_height: PLAYFIELD_HEIGHT,

            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_y: PADDLE_Y,
            paddle_move_duration: PADDLE_MOVE_DURATION,

            ball_radius: BALL_RADIUS,
            ball_mass: BALL_MASS,
            ball_impulse: BALL_IMPULSE,
            ball_reset_pos: Vec2::new(BALL_RESET_X, BALL_RESET_Y),
            speed_nudge: SPEED_NUDGE,
            min_vertical_speed: MIN_VERTICAL_SPEED,
            vertical_kick: VERTICAL_KICK,

            block_width: BLOCK_WIDTH,
            block_height: BLOCK_HEIGHT,
            block_rows: BLOCK_ROWS,
            block_columns: BLOCK_COLUMNS,
            block_recover_time: BLOCK_RECOVER_TIME,
            burst_lifetime: BURST_LIFETIME,

            sample_warmup: SAMPLE_WARMUP,
            sample_period: SAMPLE_PERIOD,
            sensitivity_gain: SENSITIVITY_GAIN,
            centering_offset: CENTERING_OFFSET,
        }
    }
}

impl Tuning {
    /// Read and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let tuning: Tuning = serde_json::from_str(&json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning file, or fall back to defaults if it is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No tuning file at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring tuning file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
            ConfigError::Invalid { field, reason }
        }

        if !(self.playfield_width > 0.0 && self.playfield_height > 0.0) {
            return Err(invalid("playfield", "dimensions must be positive"));
        }
        if !(self.paddle_width > 0.0) || self.paddle_width > self.playfield_width {
            return Err(invalid("paddle_width", "must be positive and fit the playfield"));
        }
        if !(self.paddle_height > 0.0) {
            return Err(invalid("paddle_height", "must be positive"));
        }
        if !(self.ball_radius > 0.0) {
            return Err(invalid("ball_radius", "must be positive"));
        }
        let diameter = self.ball_radius * 2.0;
        if diameter > self.playfield_width || diameter > self.playfield_height {
            return Err(invalid("ball_radius", "ball does not fit the playfield"));
        }
        if !(self.ball_mass > 0.0) {
            return Err(invalid("ball_mass", "must be positive"));
        }
        if !(self.ball_impulse > 0.0) {
            return Err(invalid("ball_impulse", "must be positive"));
        }
        if self.block_rows == 0 || self.block_columns == 0 {
            return Err(invalid("block_grid", "needs at least one row and column"));
        }
        let cells = self.block_rows.checked_mul(self.block_columns);
        if cells.and_then(|n| u32::try_from(n).ok()).is_none() {
            return Err(invalid("block_grid", "too many blocks"));
        }
        if !(self.block_width > 0.0 && self.block_height > 0.0) {
            return Err(invalid("block_size", "dimensions must be positive"));
        }
        if !(self.burst_lifetime >= 0.0) {
            return Err(invalid("burst_lifetime", "must not be negative"));
        }
        if !(self.block_recover_time >= 0.0) {
            return Err(invalid("block_recover_time", "must not be negative"));
        }
        if !(self.sample_period > 0.0) || !(self.sample_warmup >= 0.0) {
            return Err(invalid("sample_period", "period must be positive, warm-up not negative"));
        }
        if !(self.paddle_move_duration > 0.0) {
            return Err(invalid("paddle_move_duration", "must be positive"));
        }
        Ok(())
    }

    pub fn half_playfield_width(&self) -> f32 {
        self.playfield_width / 2.0
    }

    pub fn half_paddle_width(&self) -> f32 {
        self.paddle_width / 2.0
    }

    /// Leftmost and rightmost paddle centre that keeps it on screen
    pub fn paddle_x_range(&self) -> (f32, f32) {
        let limit = self.half_playfield_width() - self.half_paddle_width();
        (-limit, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_paddle_x_range() {
        let tuning = Tuning::default();
        let (lo, hi) = tuning.paddle_x_range();
        assert_eq!(lo, -412.0);
        assert_eq!(hi, 412.0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "block_rows": 4, "block_recover_time": 3.5 }}"#).unwrap();

        let tuning = Tuning::load(file.path()).unwrap();
        assert_eq!(tuning.block_rows, 4);
        assert_eq!(tuning.block_recover_time, 3.5);
        assert_eq!(tuning.block_columns, BLOCK_COLUMNS);
        assert_eq!(tuning.sensitivity_gain, SENSITIVITY_GAIN);
    }

    #[test]
    fn test_rejects_empty_grid() {
        let tuning = Tuning {
            block_columns: 0,
            ..Default::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::Invalid { field: "block_grid", .. })
        ));
    }

    #[test]
    fn test_rejects_grid_beyond_block_id_range() {
        let tuning = Tuning {
            block_rows: 70_000,
            block_columns: 70_000,
            ..Default::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::Invalid { field: "block_grid", .. })
        ));

        let tuning = Tuning {
            block_rows: usize::MAX,
            block_columns: 2,
            ..Default::default()
        };
        assert!(tuning.validate().is_err(), "overflowing product must be rejected");
    }

    #[test]
    fn test_rejects_degenerate_block_size() {
        for (width, height) in [(0.0, 25.0), (90.0, -1.0), (f32::NAN, 25.0)] {
            let tuning = Tuning {
                block_width: width,
                block_height: height,
                ..Default::default()
            };
            assert!(
                matches!(
                    tuning.validate(),
                    Err(ConfigError::Invalid { field: "block_size", .. })
                ),
                "block {width}x{height} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_bad_paddle_ball_and_burst() {
        let flat_paddle = Tuning {
            paddle_height: 0.0,
            ..Default::default()
        };
        assert!(flat_paddle.validate().is_err());

        let huge_ball = Tuning {
            ball_radius: 600.0,
            ..Default::default()
        };
        assert!(matches!(
            huge_ball.validate(),
            Err(ConfigError::Invalid { field: "ball_radius", .. })
        ));

        let negative_burst = Tuning {
            burst_lifetime: -0.5,
            ..Default::default()
        };
        assert!(matches!(
            negative_burst.validate(),
            Err(ConfigError::Invalid { field: "burst_lifetime", .. })
        ));
    }

    #[test]
    fn test_rejects_oversized_paddle() {
        let tuning = Tuning {
            paddle_width: 2000.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_load_or_default_on_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert_eq!(Tuning::load_or_default(file.path()), Tuning::default());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let tuning = Tuning::load_or_default(dir.path().join("missing.json"));
        assert_eq!(tuning, Tuning::default());
    }
}
