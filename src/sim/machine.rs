//! Match state machine
//!
//! `transition` is a pure function from (state, event) to the next state
//! plus the side effects the session has to carry out. The machine itself
//! keeps the bookkeeping that has no physical counterpart: score, best
//! score, the session's reference ball speed and a stashed velocity while
//! paused. It never touches physics or rendering directly.

use glam::Vec2;
use thiserror::Error;

use super::state::{MatchState, Score};
use crate::best_score::ScoreStore;
use crate::tuning::Tuning;

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// User "begin" trigger
    Begin,
    /// Ball touched the floor sensor
    BallReachedFloor,
    /// External pause toggle
    TogglePause,
    /// External reset
    Reset,
    /// Ball speed hit zero while running
    Stalled,
    /// Session shutdown
    Quit,
}

/// Side effects of a transition, in the order they must be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ResetScore,
    /// Show the start prompt in the score label
    ShowPrompt,
    /// Show the numeric score in the score label
    ShowScore,
    /// Move the ball to its reset position and stop it
    ParkBall,
    /// Apply the diagonal launch impulse
    LaunchBall,
    /// Record the ball speed right after launch
    CaptureReferenceSpeed,
    StashBallVelocity,
    RestoreBallVelocity,
    StopBall,
    RestoreAllBlocks,
    /// Show blocks queued while paused
    FlushQueuedBlocks,
    CancelSampling,
    RestartSampling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: MatchState,
    pub to: MatchState,
    pub event: MatchEvent,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

fn enter_new() -> Vec<Effect> {
    vec![
        Effect::ParkBall,
        Effect::RestoreAllBlocks,
        Effect::ResetScore,
        Effect::ShowPrompt,
    ]
}

/// Next state and effects for an event. Unhandled pairs stay put with no
/// effects.
pub fn transition(state: MatchState, event: MatchEvent) -> Transition {
    use Effect::*;
    use MatchEvent::*;
    use MatchState::*;

    let (to, effects) = match (state, event) {
        (New, Begin) => (
            Running,
            vec![
                ResetScore,
                ShowScore,
                LaunchBall,
                CaptureReferenceSpeed,
                FlushQueuedBlocks,
            ],
        ),

        (Running | Paused, BallReachedFloor) | (Running | Paused, Reset) | (Running, Stalled) => {
            (New, enter_new())
        }

        (Running, TogglePause) => (Paused, vec![StashBallVelocity]),
        (Paused, TogglePause) => (Running, vec![RestoreBallVelocity, FlushQueuedBlocks]),

        (New | Running | Paused, Quit) => (
            GameOver,
            vec![StopBall, CancelSampling, ResetScore, ShowPrompt],
        ),
        (GameOver, Reset) => {
            let mut effects = vec![RestartSampling];
            effects.extend(enter_new());
            (New, effects)
        }

        (state, _) => (state, Vec::new()),
    };

    Transition {
        from: state,
        to,
        event,
        effects,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SimError {
    #[error("ball stalled while running (speed {speed})")]
    BallStalled { speed: f32 },
}

/// Velocity maintenance constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityPolicy {
    /// k in speed' = speed * (1 + k / speed)
    pub speed_nudge: f32,
    pub min_vertical_speed: f32,
    pub vertical_kick: f32,
}

impl VelocityPolicy {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            speed_nudge: tuning.speed_nudge,
            min_vertical_speed: tuning.min_vertical_speed,
            vertical_kick: tuning.vertical_kick,
        }
    }

    /// Factor applied to the ball velocity after a score
    pub fn nudge_ratio(&self, speed: f32) -> f32 {
        if speed > 0.0 {
            1.0 + self.speed_nudge / speed
        } else {
            1.0
        }
    }
}

/// Result of a scoring event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub score: u64,
    /// Set when this score beat the stored best
    pub new_best: Option<u64>,
    /// Multiply the ball velocity by this
    pub speed_ratio: f32,
}

/// Per-frame ball correction
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BallFix {
    /// Replacement velocity (anti-stall)
    pub velocity: Option<Vec2>,
    /// Impulse to apply after the replacement (anti-horizontal-lock)
    pub impulse: Option<Vec2>,
}

impl BallFix {
    pub fn is_noop(&self) -> bool {
        self.velocity.is_none() && self.impulse.is_none()
    }
}

pub struct MatchStateMachine {
    state: MatchState,
    score: Score,
    best: u64,
    reference_speed: f32,
    stashed_velocity: Option<Vec2>,
    policy: VelocityPolicy,
    store: Box<dyn ScoreStore>,
}

impl MatchStateMachine {
    /// Start in New with the best score read from `store`
    pub fn new(store: Box<dyn ScoreStore>, policy: VelocityPolicy) -> Self {
        let best = match store.get() {
            Ok(best) => best,
            Err(e) => {
                log::warn!("Could not read best score, starting from 0: {}", e);
                0
            }
        };
        log::info!("Best score: {}", best);

        Self {
            state: MatchState::New,
            score: Score::new(),
            best,
            reference_speed: 0.0,
            stashed_velocity: None,
            policy,
            store,
        }
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn score(&self) -> u64 {
        self.score.value()
    }

    pub fn best_score(&self) -> u64 {
        self.best
    }

    pub fn reference_speed(&self) -> f32 {
        self.reference_speed
    }

    pub fn policy(&self) -> &VelocityPolicy {
        &self.policy
    }

    pub fn store(&self) -> &dyn ScoreStore {
        self.store.as_ref()
    }

    /// Apply an event. Score bookkeeping happens here; the returned
    /// effects are for the caller to carry out.
    pub fn handle(&mut self, event: MatchEvent) -> Transition {
        let transition = transition(self.state, event);

        if transition.changed() {
            log::info!(
                "Match {:?} -> {:?} on {:?}",
                transition.from,
                transition.to,
                event
            );
        } else {
            log::trace!("{:?} ignored in {:?}", event, self.state);
        }

        for effect in &transition.effects {
            match effect {
                Effect::ResetScore => self.score.reset(),
                Effect::ParkBall | Effect::StopBall => self.stashed_velocity = None,
                _ => {}
            }
        }
        if transition.to != MatchState::Running && transition.to != MatchState::Paused {
            self.reference_speed = 0.0;
        }

        self.state = transition.to;
        transition
    }

    /// Ball speed right after the launch impulse
    pub fn set_reference_speed(&mut self, speed: f32) {
        log::debug!("Reference ball speed {:.2}", speed);
        self.reference_speed = speed;
    }

    pub fn stash_velocity(&mut self, velocity: Vec2) {
        self.stashed_velocity = Some(velocity);
    }

    pub fn take_stashed_velocity(&mut self) -> Option<Vec2> {
        self.stashed_velocity.take()
    }

    /// Count a destroyed block. Only meaningful while running.
    pub fn on_scored(&mut self, current_speed: f32) -> Option<Scored> {
        if self.state != MatchState::Running {
            return None;
        }

        let score = self.score.increment();
        let new_best = if score > self.best {
            self.best = score;
            if let Err(e) = self.store.set(score) {
                log::warn!("Could not persist best score {}: {}", score, e);
            }
            Some(score)
        } else {
            None
        };

        log::debug!("Score {} (best {})", score, self.best);
        Some(Scored {
            score,
            new_best,
            speed_ratio: self.policy.nudge_ratio(current_speed),
        })
    }

    /// Per-frame velocity invariants while running: restore the reference
    /// speed if the ball slowed down, and kick it vertically if it is
    /// travelling (almost) sideways.
    pub fn check_ball(&self, velocity: Vec2) -> Result<BallFix, SimError> {
        if self.state != MatchState::Running {
            return Ok(BallFix::default());
        }

        let speed = velocity.length();
        if speed <= f32::EPSILON {
            return Err(SimError::BallStalled { speed });
        }

        let mut fix = BallFix::default();
        let mut corrected = velocity;

        if self.reference_speed > 0.0 {
            let ratio = speed / self.reference_speed;
            if ratio < 1.0 {
                corrected = crate::extend(velocity, 1.0 / ratio);
                fix.velocity = Some(corrected);
            }
        }

        if corrected.y.abs() < self.policy.min_vertical_speed {
            fix.impulse = Some(Vec2::new(0.0, self.policy.vertical_kick));
        }

        Ok(fix)
    }
}
