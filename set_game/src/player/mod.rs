//! Player actors.
//!
//! Each player runs as its own Tokio task:
//!
//! ```text
//! Idle -> AwaitingInput -> (token update) -> AwaitingInput
//!              |
//!              +-> AwaitingVerdict -> Frozen(Point | Penalty) -> AwaitingInput
//!              +-> AwaitingVerdict -> AwaitingInput              (neutral verdict)
//!
//! any state -> Terminated
//! ```
//!
//! Every suspension (input buffer, verdict, freeze tick) also waits on the
//! player's cancellation token, so termination reaches a player wherever it
//! is parked. Computer players get a second task, an [`InputGenerator`],
//! feeding the same bounded input buffer a human input source would use.

pub mod actor;
pub mod generator;
pub mod state;

pub use actor::{PlayerActor, PlayerHandle, PlayerKind};
pub use generator::InputGenerator;
pub use state::{PlayerState, TokenSet, TokenUpdate};
