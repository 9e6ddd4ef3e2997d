//! Face Breakout headless driver
//!
//! Runs a session without a window: the physics is `HeadlessPhysics`, the
//! renderer only records commands, and the "face tracker" is a synthetic
//! signal that follows the ball with some jitter and the occasional
//! missing frame.
//!
//! Example:
//!   RUST_LOG=info cargo run -- --seconds 60 --seed 7 --pause-at 20

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use face_breakout::consts::FRAME_DT;
use face_breakout::physics::HeadlessPhysics;
use face_breakout::render::RecordingSink;
use face_breakout::sim::{MatchState, Session};
use face_breakout::{FileScoreStore, MemoryScoreStore, ScoreStore, Tuning};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a headless face-controlled Breakout session", long_about = None)]
struct Args {
    /// Simulated time to run
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,
    /// Seed for the synthetic tracker
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Tuning JSON (missing fields use defaults)
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Best score JSON file (in-memory if omitted)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Pause for two seconds at this time
    #[arg(long)]
    pause_at: Option<f64>,
}

/// Chance that the tracker finds no face in a frame
const DROP_RATE: f64 = 0.1;
/// Tracker noise, in signal units
const JITTER: f32 = 8.0;
const PAUSE_LENGTH: f64 = 2.0;

/// A fake face tracker that looks at where the ball is
fn synthetic_tracker(
    gain: f32,
    offset: f32,
    ball_x: Rc<Cell<f32>>,
    seed: u64,
) -> impl FnMut() -> Option<f32> + 'static {
    let mut rng = Pcg32::seed_from_u64(seed);

    move || {
        if rng.random_bool(DROP_RATE) {
            return None;
        }
        let jitter = rng.random_range(-JITTER..=JITTER);
        Some((ball_x.get() - offset) / gain + jitter)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path).with_context(|| format!("load tuning {:?}", path))?,
        None => Tuning::default(),
    };

    let store: Box<dyn ScoreStore> = match &args.store {
        Some(path) => Box::new(FileScoreStore::new(path)),
        None => Box::new(MemoryScoreStore::new()),
    };

    let ball_x = Rc::new(Cell::new(tuning.ball_reset_pos.x));
    let tracker = synthetic_tracker(
        tuning.sensitivity_gain,
        tuning.centering_offset,
        Rc::clone(&ball_x),
        args.seed,
    );

    let mut session = Session::new(
        tuning,
        HeadlessPhysics::new(),
        RecordingSink::new(),
        store,
        Box::new(tracker),
    )
    .context("start session")?;

    log::info!(
        "Face Breakout (headless) running for {:.1}s, seed {}",
        args.seconds,
        args.seed
    );

    let mut paused_until: Option<f64> = None;
    let mut rounds = 0u32;

    while session.now() < args.seconds {
        let now = session.now();

        match session.state() {
            MatchState::New => {
                rounds += 1;
                log::info!("Round {} (best {})", rounds, session.best_score());
                session.begin();
            }
            MatchState::Running => {
                if args.pause_at.is_some_and(|t| now >= t) && paused_until.is_none() {
                    session.toggle_pause();
                    paused_until = Some(now + PAUSE_LENGTH);
                }
            }
            MatchState::Paused => {
                if paused_until.is_some_and(|t| now >= t) {
                    session.toggle_pause();
                }
            }
            MatchState::GameOver => break,
        }

        session.advance(FRAME_DT);
        ball_x.set(session.ball_position().x);
    }

    let final_score = session.score();
    session.quit();

    log::info!(
        "Done after {:.1}s: {} rounds, last score {}, best {}, {} blocks up",
        session.now(),
        rounds,
        final_score,
        session.best_score(),
        session.blocks().alive_count()
    );
    println!(
        "rounds={} score={} best={}",
        rounds,
        final_score,
        session.best_score()
    );

    Ok(())
}
