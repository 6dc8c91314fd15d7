//! The arbiter: sole owner of the deck and every table mutation.
//!
//! Players hand claims to the [`ClaimIntake`]; the [`ArbiterActor`] drains
//! them into its [`Examiner`] and examines them one at a time in arrival
//! order, between countdown updates.

pub mod actor;
pub mod examiner;
pub mod messages;

pub use actor::{ArbiterActor, ArbiterHandle, GameSummary, winners};
pub use examiner::{ExaminationStats, Examiner};
pub use messages::{Claim, ClaimIntake};
