//! Presentation events emitted by the arbiter and player actors.
//!
//! Presentation is a pure consumer: nothing in the game waits on a
//! subscriber, and a subscriber that falls behind loses events instead of
//! slowing the game down.

use crate::game::entities::{Card, PlayerId, Slot};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::sync::mpsc;

/// Event sent to presentation subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A card was dealt into a slot
    CardShown { slot: Slot, card: Card },
    /// A slot was emptied
    CardHidden { slot: Slot },
    /// A player placed a token
    TokenShown { player: PlayerId, slot: Slot },
    /// A player removed a token
    TokenHidden { player: PlayerId, slot: Slot },
    /// Every player's token on a slot went away with its card
    TokensCleared { slot: Slot },
    ScoreChanged { player: PlayerId, score: u32 },
    /// Time left on the round clock
    Countdown { remaining: Duration, urgent: bool },
    /// Time left on a player's freeze; zero when the freeze ends
    FreezeChanged { player: PlayerId, remaining: Duration },
    RoundStarted { round: u32 },
    RoundEnded { round: u32 },
    /// All players tied at the maximum score
    WinnersAnnounced(Vec<PlayerId>),
}

/// Cloneable fan-out of game events to any number of subscribers
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    inner: Arc<Mutex<Subscribers>>,
}

#[derive(Debug, Default)]
struct Subscribers {
    next_id: usize,
    senders: HashMap<usize, mpsc::Sender<GameEvent>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event emitted from now on
    ///
    /// # Arguments
    ///
    /// * `capacity` - Events buffered before this subscriber starts losing them
    pub fn subscribe(&self, capacity: usize) -> mpsc::Receiver<GameEvent> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let mut subscribers = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.senders.insert(id, sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .len()
    }

    /// Broadcast an event without waiting on any subscriber
    pub fn emit(&self, event: GameEvent) {
        let mut subscribers = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers
            .senders
            .retain(|id, sender| match sender.try_send(event.clone()) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Subscriber {} channel full, dropping event", id);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", id);
                    false
                }
            });
    }
}
