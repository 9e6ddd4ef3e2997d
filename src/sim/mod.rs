//! Game core
//!
//! All gameplay logic lives here. It talks to the outside world only
//! through the ports in `physics`, `render`, `control` and `best_score`:
//! - Time only advances through `Session::advance`
//! - Contacts are handled in the order the physics engine reports them
//! - Stable iteration order (by block id)

pub mod blocks;
pub mod contact;
pub mod machine;
pub mod paddle;
pub mod respawn;
pub mod sampling;
pub mod scene;
pub mod session;
pub mod state;

pub use blocks::{Block, BlockField, cell_position};
pub use contact::{ContactKind, Reaction, classify};
pub use machine::{
    BallFix, Effect, MatchEvent, MatchStateMachine, Scored, SimError, Transition, VelocityPolicy,
    transition,
};
pub use paddle::{MoveCommand, PaddleController, PaddleMotion};
pub use respawn::{RespawnOutcome, RespawnScheduler, RespawnTimer};
pub use sampling::{CancelToken, SamplingTimer};
pub use scene::Scene;
pub use session::{START_PROMPT, Session, best_label_text};
pub use state::{BlockId, CategoryMask, CategoryTag, GridCell, MatchState, Score};
