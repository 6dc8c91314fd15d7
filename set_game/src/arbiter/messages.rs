//! Claim intake message types.

use crate::{
    errors::{GameError, GameResult},
    game::entities::{Card, Pick, PlayerId, Slot, Verdict},
};
use tokio::sync::{mpsc, oneshot};

/// A player's request to have its tokened cards examined.
///
/// Carries the only sender for the claim's verdict, so a claim is resolved at
/// most once: [`Claim::resolve`] consumes it.
#[derive(Debug)]
pub struct Claim {
    player: PlayerId,
    picks: Vec<Pick>,
    verdict: oneshot::Sender<Verdict>,
}

impl Claim {
    /// Create a claim and the receiver its owner suspends on
    ///
    /// # Panics
    ///
    /// Panics if two picks share a slot.
    pub fn new(player: PlayerId, picks: Vec<Pick>) -> (Self, oneshot::Receiver<Verdict>) {
        for (i, pick) in picks.iter().enumerate() {
            assert!(
                picks[i + 1..].iter().all(|other| other.slot != pick.slot),
                "{player} claimed slot {} twice",
                pick.slot
            );
        }

        let (verdict, receiver) = oneshot::channel();
        (
            Self {
                player,
                picks,
                verdict,
            },
            receiver,
        )
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    pub fn cards(&self) -> Vec<Card> {
        self.picks.iter().map(|pick| pick.card).collect()
    }

    pub fn references(&self, slot: Slot) -> bool {
        self.picks.iter().any(|pick| pick.slot == slot)
    }

    /// Deliver the verdict to the claim's owner
    pub fn resolve(self, verdict: Verdict) {
        if self.verdict.send(verdict).is_err() {
            // Only a terminated player drops its receiver
            log::debug!(
                "{} stopped waiting before its {} verdict arrived",
                self.player,
                verdict
            );
        }
    }
}

/// Sending side of the arbiter's claim queue
#[derive(Debug, Clone)]
pub struct ClaimIntake {
    sender: mpsc::Sender<Claim>,
}

impl ClaimIntake {
    pub fn new(sender: mpsc::Sender<Claim>) -> Self {
        Self { sender }
    }

    /// Queue a claim for examination and wake the arbiter.
    ///
    /// Claims are examined in the order they are received here.
    pub async fn request_examination(&self, claim: Claim) -> GameResult<()> {
        self.sender
            .send(claim)
            .await
            .map_err(|_| GameError::ArbiterClosed)
    }
}
