//! Face Breakout - a Breakout core driven by a face-tracking control signal
//!
//! Core modules:
//! - `sim`: Match state machine, block lifecycle, respawn timers, contact dispatch
//! - `physics`: Physics engine port plus a small headless implementation
//! - `render`: Rendering sink port
//! - `control`: External paddle control signal port
//! - `best_score`: Best score persistence
//! - `tuning`: Data-driven game balance

pub mod best_score;
pub mod control;
pub mod palette;
pub mod physics;
pub mod render;
pub mod sim;
pub mod tuning;

pub use best_score::{FileScoreStore, MemoryScoreStore, ScoreStore, StoreError};
pub use tuning::{ConfigError, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Frame loop step (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Playfield dimensions (origin at the centre)
    pub const PLAYFIELD_WIDTH: f32 = 1024.0;
    pub const PLAYFIELD_HEIGHT: f32 = 768.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 200.0;
    pub const PADDLE_HEIGHT: f32 = 20.0;
    pub const PADDLE_Y: f32 = -320.0;
    /// Duration of one smoothed paddle move command
    pub const PADDLE_MOVE_DURATION: f32 = 0.2;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 12.0;
    pub const BALL_MASS: f32 = 0.1;
    /// Diagonal launch impulse (applied on both axes)
    pub const BALL_IMPULSE: f32 = 30.0;
    pub const BALL_RESET_X: f32 = 0.0;
    pub const BALL_RESET_Y: f32 = -150.0;

    /// Speed nudge per scored block: speed' = speed * (1 + k / speed)
    pub const SPEED_NUDGE: f32 = 5.0;
    /// Below this |vy| the ball gets a vertical kick
    pub const MIN_VERTICAL_SPEED: f32 = 20.0;
    pub const VERTICAL_KICK: f32 = 1.0;

    /// Block grid defaults
    pub const BLOCK_WIDTH: f32 = 90.0;
    pub const BLOCK_HEIGHT: f32 = 25.0;
    pub const BLOCK_ROWS: usize = 8;
    pub const BLOCK_COLUMNS: usize = 8;
    /// Grid starts this fraction of the playfield height above the centre
    pub const BLOCK_Y_OFFSET_FRACTION: f32 = 0.1;
    /// Delay before a destroyed block comes back
    pub const BLOCK_RECOVER_TIME: f64 = 10.0;

    /// Break effect lifetime
    pub const BURST_LIFETIME: f32 = 1.0;

    /// Control signal sampling
    pub const SAMPLE_WARMUP: f64 = 0.8;
    pub const SAMPLE_PERIOD: f64 = 0.1;
    pub const SENSITIVITY_GAIN: f32 = 2.5;
    pub const CENTERING_OFFSET: f32 = -2500.0;
}

/// Scale a velocity so its length changes by `ratio`
#[inline]
pub fn extend(velocity: Vec2, ratio: f32) -> Vec2 {
    velocity * ratio
}

/// Linear interpolation between two scalars, `t` clamped to [0, 1]
#[inline]
pub fn lerp_clamped(from: f32, to: f32, t: f32) -> f32 {
    if t >= 1.0 {
        return to;
    }
    from + (to - from) * t.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_scales_length() {
        let v = Vec2::new(3.0, 4.0);
        assert!((extend(v, 2.0).length() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_lerp_clamped_bounds() {
        assert_eq!(lerp_clamped(0.0, 10.0, -1.0), 0.0);
        assert_eq!(lerp_clamped(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp_clamped(0.0, 10.0, 2.0), 10.0);
    }
}
