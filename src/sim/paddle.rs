//! Paddle control
//!
//! Maps control-signal samples to smoothed horizontal paddle moves. A new
//! sample supersedes whatever move is in flight; with no samples the
//! paddle stays where it was last sent.

use crate::lerp_clamped;
use crate::tuning::Tuning;

/// Signal-to-playfield mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleController {
    pub sensitivity_gain: f32,
    pub centering_offset: f32,
    pub min_x: f32,
    pub max_x: f32,
    pub move_duration: f32,
}

impl PaddleController {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        let (min_x, max_x) = tuning.paddle_x_range();
        Self {
            sensitivity_gain: tuning.sensitivity_gain,
            centering_offset: tuning.centering_offset,
            min_x,
            max_x,
            move_duration: tuning.paddle_move_duration,
        }
    }

    /// Clamped paddle centre for a raw sample
    pub fn target_x(&self, sample: f32) -> f32 {
        let x = sample * self.sensitivity_gain + self.centering_offset;
        x.clamp(self.min_x, self.max_x)
    }

    /// Move command toward the sample's target, starting from `from_x`
    pub fn command(&self, sample: f32, from_x: f32, now: f64) -> MoveCommand {
        MoveCommand {
            from_x,
            target_x: self.target_x(sample),
            started_at: now,
            duration: self.move_duration,
        }
    }
}

/// A timed linear move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCommand {
    pub from_x: f32,
    pub target_x: f32,
    pub started_at: f64,
    pub duration: f32,
}

impl MoveCommand {
    pub fn position_at(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return self.target_x;
        }
        let t = ((now - self.started_at) / self.duration as f64) as f32;
        lerp_clamped(self.from_x, self.target_x, t)
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now - self.started_at >= self.duration as f64
    }
}

/// Paddle position driven by move commands
#[derive(Debug, Clone, Default)]
pub struct PaddleMotion {
    x: f32,
    active: Option<MoveCommand>,
}

impl PaddleMotion {
    pub fn new(x: f32) -> Self {
        Self { x, active: None }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    /// Command currently being played, if any
    pub fn active(&self) -> Option<&MoveCommand> {
        self.active.as_ref()
    }

    /// Start tracking a sample; replaces any in-flight command
    pub fn track(&mut self, controller: &PaddleController, sample: f32, now: f64) -> MoveCommand {
        let from_x = self.advance(now);
        let command = controller.command(sample, from_x, now);
        self.active = Some(command);
        command
    }

    /// Position at `now`
    pub fn advance(&mut self, now: f64) -> f32 {
        if let Some(command) = self.active {
            self.x = command.position_at(now);
            if command.is_finished(now) {
                self.active = None;
            }
        }
        self.x
    }
}
