//! Session
//!
//! Top-level owner of one game: the scene, the block field, the state
//! machine, the respawn timers and the paddle sampler. External ports
//! (physics, rendering, score store, control signal) are injected at
//! construction. Everything runs from `advance`, one frame at a time, and
//! from the external triggers (`begin`, `toggle_pause`, `reset`, `quit`).

use glam::Vec2;

use super::blocks::BlockField;
use super::contact::{self, Reaction};
use super::machine::{Effect, MatchEvent, MatchStateMachine, Transition, VelocityPolicy};
use super::paddle::{PaddleController, PaddleMotion};
use super::respawn::{RespawnOutcome, RespawnScheduler, RespawnTimer};
use super::sampling::{CancelToken, SamplingTimer};
use super::scene::Scene;
use super::state::MatchState;
use crate::best_score::ScoreStore;
use crate::control::ControlSignalSource;
use crate::palette;
use crate::physics::{Contact, PhysicsWorld};
use crate::render::{Label, LabelStyle, PaddleSprite, RenderSink};
use crate::tuning::{ConfigError, Tuning};

/// Score label text while waiting for the player
pub const START_PROMPT: &str = "Press the screen to start";

pub fn best_label_text(best: u64) -> String {
    format!("Best: {}", best)
}

fn paddle_sprite(tuning: &Tuning, x: f32) -> PaddleSprite {
    PaddleSprite {
        position: Vec2::new(x, tuning.paddle_y),
        size: Vec2::new(tuning.paddle_width, tuning.paddle_height),
        color: palette::PADDLE,
    }
}

pub struct Session<P: PhysicsWorld, R: RenderSink> {
    tuning: Tuning,
    physics: P,
    render: R,
    scene: Scene,
    blocks: BlockField,
    machine: MatchStateMachine,
    scheduler: RespawnScheduler,
    controller: PaddleController,
    paddle: PaddleMotion,
    /// Paddle x last sent to the renderer
    drawn_paddle_x: f32,
    sampler: SamplingTimer,
    source: Box<dyn ControlSignalSource>,
    now: f64,
}

impl<P: PhysicsWorld, R: RenderSink> Session<P, R> {
    /// Build the scene and enter New. Sampling starts right away, with the
    /// warm-up delay.
    pub fn new(
        tuning: Tuning,
        mut physics: P,
        mut render: R,
        store: Box<dyn ScoreStore>,
        source: Box<dyn ControlSignalSource>,
    ) -> Result<Self, ConfigError> {
        tuning.validate()?;

        let scene = Scene::build(&tuning, &mut physics);
        let blocks = BlockField::build(&tuning, &mut physics, &mut render);
        let machine = MatchStateMachine::new(store, VelocityPolicy::from_tuning(&tuning));
        let scheduler = RespawnScheduler::new(tuning.block_recover_time);
        let controller = PaddleController::from_tuning(&tuning);
        let sampler = SamplingTimer::start(0.0, tuning.sample_warmup, tuning.sample_period);

        render.set_background(palette::BACKGROUND);
        render.set_paddle(&paddle_sprite(&tuning, 0.0));
        render.set_label(
            Label::Best,
            &best_label_text(machine.best_score()),
            LabelStyle::Plain,
        );
        render.set_label(Label::Score, START_PROMPT, LabelStyle::Prompt);

        log::info!(
            "Session ready: {} blocks, respawn after {:.1}",
            blocks.len(),
            tuning.block_recover_time
        );

        Ok(Self {
            tuning,
            physics,
            render,
            scene,
            blocks,
            machine,
            scheduler,
            controller,
            paddle: PaddleMotion::new(0.0),
            drawn_paddle_x: 0.0,
            sampler,
            source,
            now: 0.0,
        })
    }

    // === External triggers ===

    pub fn begin(&mut self) -> Transition {
        self.dispatch(MatchEvent::Begin)
    }

    pub fn toggle_pause(&mut self) -> Transition {
        self.dispatch(MatchEvent::TogglePause)
    }

    pub fn reset(&mut self) -> Transition {
        self.dispatch(MatchEvent::Reset)
    }

    pub fn quit(&mut self) -> Transition {
        self.dispatch(MatchEvent::Quit)
    }

    /// Run one event through the state machine and apply its effects
    pub fn dispatch(&mut self, event: MatchEvent) -> Transition {
        let transition = self.machine.handle(event);
        for effect in &transition.effects {
            self.apply(*effect);
        }
        transition
    }

    fn apply(&mut self, effect: Effect) {
        let ball = self.scene.ball;
        match effect {
            // Score bookkeeping lives in the machine
            Effect::ResetScore => {}
            Effect::ShowPrompt => {
                self.render
                    .set_label(Label::Score, START_PROMPT, LabelStyle::Prompt);
            }
            Effect::ShowScore => {
                let text = self.machine.score().to_string();
                self.render.set_label(Label::Score, &text, LabelStyle::Score);
            }
            Effect::ParkBall => {
                self.physics.set_position(ball, self.tuning.ball_reset_pos);
                self.physics.set_velocity(ball, Vec2::ZERO);
            }
            Effect::LaunchBall => {
                let impulse = self.tuning.ball_impulse;
                self.physics.apply_impulse(ball, Vec2::new(impulse, impulse));
            }
            Effect::CaptureReferenceSpeed => {
                let speed = self.physics.velocity(ball).length();
                self.machine.set_reference_speed(speed);
            }
            Effect::StashBallVelocity => {
                let velocity = self.physics.velocity(ball);
                self.machine.stash_velocity(velocity);
                self.physics.set_velocity(ball, Vec2::ZERO);
            }
            Effect::RestoreBallVelocity => {
                if let Some(velocity) = self.machine.take_stashed_velocity() {
                    self.physics.set_velocity(ball, velocity);
                }
            }
            Effect::StopBall => self.physics.set_velocity(ball, Vec2::ZERO),
            Effect::RestoreAllBlocks => {
                self.blocks
                    .restore_all(&mut self.scheduler, &mut self.physics, &mut self.render);
            }
            Effect::FlushQueuedBlocks => {
                self.flush_queued();
            }
            Effect::CancelSampling => {
                log::debug!("Control sampling cancelled");
                self.sampler.token().cancel();
            }
            Effect::RestartSampling => {
                self.sampler = SamplingTimer::start(
                    self.now,
                    self.tuning.sample_warmup,
                    self.tuning.sample_period,
                );
            }
        }
    }

    /// Show every block queued during a pause, in one batch
    fn flush_queued(&mut self) -> usize {
        let mut shown = 0;
        for id in self.scheduler.take_queued() {
            if self.blocks.revive(id, &mut self.physics, &mut self.render) {
                shown += 1;
            }
        }
        if shown > 0 {
            log::debug!("Flushed {} queued blocks", shown);
        }
        shown
    }

    // === Frame loop ===

    /// Advance one frame of `dt`
    pub fn advance(&mut self, dt: f32) {
        self.now += dt as f64;

        for timer in self.scheduler.take_due(self.now) {
            self.fire_respawn(&timer);
        }

        if self.sampler.poll(self.now) {
            match self.source.sample() {
                Some(sample) => {
                    self.paddle.track(&self.controller, sample, self.now);
                }
                None => log::trace!("No control sample at {:.2}", self.now),
            }
        }

        let x = self.paddle.advance(self.now);
        self.physics
            .set_position(self.scene.paddle, Vec2::new(x, self.tuning.paddle_y));
        if x != self.drawn_paddle_x {
            self.render.set_paddle(&paddle_sprite(&self.tuning, x));
            self.drawn_paddle_x = x;
        }

        self.enforce_ball_invariants();

        let contacts = self.physics.step(dt);
        for contact in &contacts {
            self.handle_contact(contact);
        }
    }

    /// Reconcile a respawn timer that has come due
    pub fn fire_respawn(&mut self, timer: &RespawnTimer) -> RespawnOutcome {
        let outcome = self.scheduler.fire(timer, self.machine.state());
        match outcome {
            RespawnOutcome::Reinsert(id) => {
                if self.blocks.revive(id, &mut self.physics, &mut self.render) {
                    log::debug!("Block {:?} respawned", id);
                }
            }
            RespawnOutcome::Queued(moved) => {
                log::debug!("Paused: {} blocks queued for display", moved);
            }
            RespawnOutcome::Noop => {}
        }
        outcome
    }

    /// Act on one physics contact. Returns what the contact meant, if
    /// anything.
    pub fn handle_contact(&mut self, contact: &Contact) -> Option<Reaction> {
        let reaction = contact::resolve(contact, &self.blocks)?;

        match reaction {
            Reaction::BallLost => {
                self.dispatch(MatchEvent::BallReachedFloor);
            }
            Reaction::BlockHit(id) => {
                if self.machine.state() != MatchState::Running {
                    log::trace!("Ignoring hit on {:?} in {:?}", id, self.machine.state());
                    return Some(reaction);
                }
                let destroyed = self.blocks.destroy(
                    id,
                    self.now,
                    self.tuning.burst_lifetime,
                    &mut self.scheduler,
                    &mut self.physics,
                    &mut self.render,
                );
                if destroyed {
                    self.on_scored();
                }
            }
        }

        Some(reaction)
    }

    fn on_scored(&mut self) {
        let ball = self.scene.ball;
        let velocity = self.physics.velocity(ball);
        let Some(scored) = self.machine.on_scored(velocity.length()) else {
            return;
        };

        self.physics
            .set_velocity(ball, crate::extend(velocity, scored.speed_ratio));
        self.render
            .set_label(Label::Score, &scored.score.to_string(), LabelStyle::Score);

        if let Some(best) = scored.new_best {
            log::info!("New best score: {}", best);
            self.render
                .set_label(Label::Best, &best_label_text(best), LabelStyle::Plain);
        }
    }

    fn enforce_ball_invariants(&mut self) {
        if self.machine.state() != MatchState::Running {
            return;
        }

        let ball = self.scene.ball;
        match self.machine.check_ball(self.physics.velocity(ball)) {
            Ok(fix) => {
                if let Some(velocity) = fix.velocity {
                    self.physics.set_velocity(ball, velocity);
                }
                if let Some(impulse) = fix.impulse {
                    self.physics.apply_impulse(ball, impulse);
                }
            }
            Err(e) => {
                log::warn!("{}, restarting match", e);
                self.dispatch(MatchEvent::Stalled);
            }
        }
    }

    // === Accessors ===

    pub fn state(&self) -> MatchState {
        self.machine.state()
    }

    pub fn score(&self) -> u64 {
        self.machine.score()
    }

    pub fn best_score(&self) -> u64 {
        self.machine.best_score()
    }

    pub fn reference_speed(&self) -> f32 {
        self.machine.reference_speed()
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn blocks(&self) -> &BlockField {
        &self.blocks
    }

    pub fn scheduler(&self) -> &RespawnScheduler {
        &self.scheduler
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut R {
        &mut self.render
    }

    pub fn ball_position(&self) -> Vec2 {
        self.physics.position(self.scene.ball)
    }

    pub fn ball_velocity(&self) -> Vec2 {
        self.physics.velocity(self.scene.ball)
    }

    pub fn paddle_x(&self) -> f32 {
        self.paddle.x()
    }

    /// Token that stops control sampling when cancelled
    pub fn sampling_token(&self) -> CancelToken {
        self.sampler.token()
    }

    pub fn store(&self) -> &dyn ScoreStore {
        self.machine.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::best_score::MemoryScoreStore;
    use crate::consts::FRAME_DT;
    use crate::control::ScriptedSource;
    use crate::physics::{ContactBody, HeadlessPhysics};
    use crate::render::RecordingSink;
    use crate::sim::state::{BlockId, CategoryTag};

    type TestSession = Session<HeadlessPhysics, RecordingSink>;

    fn session_with(source: ScriptedSource) -> TestSession {
        Session::new(
            Tuning::default(),
            HeadlessPhysics::new(),
            RecordingSink::new(),
            Box::new(MemoryScoreStore::new()),
            Box::new(source),
        )
        .unwrap()
    }

    fn session() -> TestSession {
        session_with(ScriptedSource::silent())
    }

    fn hit(session: &TestSession, id: u32) -> Contact {
        Contact {
            a: ContactBody {
                body: session.scene().ball,
                tag: CategoryTag::Ball,
            },
            b: ContactBody {
                body: session.blocks().get(BlockId(id)).unwrap().body,
                tag: CategoryTag::Block,
            },
        }
    }

    fn floor(session: &TestSession) -> Contact {
        Contact {
            a: ContactBody {
                body: session.scene().floor,
                tag: CategoryTag::FloorSensor,
            },
            b: ContactBody {
                body: session.scene().ball,
                tag: CategoryTag::Ball,
            },
        }
    }

    #[test]
    fn test_starts_in_new_with_prompt() {
        let s = session();
        assert_eq!(s.state(), MatchState::New);
        assert_eq!(s.render().label(Label::Score), Some(START_PROMPT));
        assert_eq!(s.render().label_style(Label::Score), Some(LabelStyle::Prompt));
        assert_eq!(s.render().label(Label::Best), Some("Best: 0"));
        assert_eq!(s.ball_velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_rejects_invalid_tuning() {
        let tuning = Tuning {
            sample_period: 0.0,
            ..Default::default()
        };
        let result = Session::new(
            tuning,
            HeadlessPhysics::new(),
            RecordingSink::new(),
            Box::new(MemoryScoreStore::new()),
            Box::new(ScriptedSource::silent()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_begin_launches_ball_and_captures_reference() {
        let mut s = session();
        s.begin();
        assert_eq!(s.state(), MatchState::Running);
        assert!(s.ball_velocity().abs_diff_eq(Vec2::new(300.0, 300.0), 1e-3));
        assert!((s.reference_speed() - 300.0 * 2f32.sqrt()).abs() < 1e-2);
        assert_eq!(s.render().label(Label::Score), Some("0"));
    }

    #[test]
    fn test_block_hit_scores_and_speeds_up() {
        let mut s = session();
        s.begin();
        let before = s.ball_velocity().length();

        let contact = hit(&s, 19);
        assert_eq!(s.handle_contact(&contact), Some(Reaction::BlockHit(BlockId(19))));
        assert_eq!(s.score(), 1);
        assert!(!s.blocks().is_alive(BlockId(19)));
        assert!((s.ball_velocity().length() - (before + 5.0)).abs() < 1e-2);
        assert_eq!(s.render().label(Label::Score), Some("1"));
        assert_eq!(s.render().label(Label::Best), Some("Best: 1"));

        // Same block again in the same frame
        s.handle_contact(&contact);
        assert_eq!(s.score(), 1);
    }

    #[test]
    fn test_block_hit_ignored_before_begin() {
        let mut s = session();
        let contact = hit(&s, 3);
        s.handle_contact(&contact);
        assert_eq!(s.score(), 0);
        assert!(s.blocks().is_alive(BlockId(3)));
    }

    #[test]
    fn test_floor_contact_parks_ball() {
        let mut s = session();
        s.begin();
        let contact = floor(&s);
        assert_eq!(s.handle_contact(&contact), Some(Reaction::BallLost));
        assert_eq!(s.state(), MatchState::New);
        assert_eq!(s.ball_position(), Vec2::new(0.0, -150.0));
        assert_eq!(s.ball_velocity(), Vec2::ZERO);
        assert_eq!(s.render().label(Label::Score), Some(START_PROMPT));
    }

    #[test]
    fn test_pause_stashes_and_restores_velocity() {
        let mut s = session();
        s.begin();
        let launched = s.ball_velocity();
        s.toggle_pause();
        assert_eq!(s.state(), MatchState::Paused);
        assert_eq!(s.ball_velocity(), Vec2::ZERO);

        s.toggle_pause();
        assert_eq!(s.ball_velocity(), launched);
    }

    #[test]
    fn test_samples_move_paddle_after_warmup() {
        let mut s = session_with(ScriptedSource::new([Some(1100.0), None]));
        let dt = 1.0 / 60.0;

        // Warm-up: nothing sampled yet
        for _ in 0..45 {
            s.advance(dt);
        }
        assert_eq!(s.paddle_x(), 0.0);

        // First sample at 0.8, move lasts 0.2
        for _ in 0..30 {
            s.advance(dt);
        }
        assert!((s.paddle_x() - 250.0).abs() < 1e-3);

        // Missing samples hold the position
        for _ in 0..60 {
            s.advance(dt);
        }
        assert!((s.paddle_x() - 250.0).abs() < 1e-3);
        let paddle = s.scene().paddle;
        assert!((s.physics().position(paddle).x - 250.0).abs() < 1e-3);
    }

    #[test]
    fn test_scene_is_drawn_with_palette_colors() {
        let s = session();
        assert_eq!(s.render().background(), Some(palette::BACKGROUND));

        let paddle = s.render().paddle().unwrap();
        assert_eq!(paddle.color, palette::PADDLE);
        assert_eq!(paddle.position, Vec2::new(0.0, -320.0));
        assert_eq!(paddle.size, Vec2::new(200.0, 20.0));
    }

    #[test]
    fn test_paddle_sprite_follows_control_samples() {
        // 1040 * 2.5 - 2500 = 100
        let mut s = session_with(ScriptedSource::new(vec![Some(1040.0)]));
        for _ in 0..120 {
            s.advance(FRAME_DT);
        }

        assert_eq!(s.paddle_x(), 100.0);
        let paddle = s.render().paddle().unwrap();
        assert_eq!(paddle.position.x, 100.0, "sprite tracks the paddle body");
        assert_eq!(paddle.color, palette::PADDLE);

        s.render_mut().clear_commands();
        s.advance(FRAME_DT);
        assert!(
            !s.render()
                .commands
                .iter()
                .any(|c| matches!(c, crate::render::RenderCommand::Paddle(_))),
            "a resting paddle is not redrawn"
        );
    }

    #[test]
    fn test_quit_clears_score_and_shows_prompt() {
        let mut s = session();
        s.begin();
        let c1 = hit(&s, 1);
        let c2 = hit(&s, 2);
        s.handle_contact(&c1);
        s.handle_contact(&c2);
        assert_eq!(s.score(), 2);

        s.quit();
        assert_eq!(s.state(), MatchState::GameOver);
        assert_eq!(s.score(), 0, "a finished match keeps no score");
        assert_eq!(s.best_score(), 2);
        assert_eq!(s.render().label(Label::Score), Some(START_PROMPT));
    }

    #[test]
    fn test_quit_cancels_sampling_and_reset_rearms() {
        let mut s = session();
        s.begin();
        let token = s.sampling_token();
        s.quit();
        assert_eq!(s.state(), MatchState::GameOver);
        assert!(token.is_cancelled());
        assert_eq!(s.ball_velocity(), Vec2::ZERO);

        s.reset();
        assert_eq!(s.state(), MatchState::New);
        assert!(!s.sampling_token().is_cancelled());
    }

    #[test]
    fn test_stalled_ball_restarts_match() {
        let mut s = session();
        s.begin();
        let ball = s.scene().ball;
        s.physics_mut().set_velocity(ball, Vec2::ZERO);

        s.advance(1.0 / 60.0);
        assert_eq!(s.state(), MatchState::New);
    }

    #[test]
    fn test_slow_ball_restored_to_reference() {
        let mut s = session();
        s.begin();
        let ball = s.scene().ball;
        s.physics_mut().set_velocity(ball, Vec2::new(100.0, 100.0));

        s.advance(1.0 / 60.0);
        assert!(s.ball_velocity().length() >= s.reference_speed() * (1.0 - 1e-4));
    }
}
