//! Player actor: token bookkeeping, claim submission and freezes.

use super::{
    generator::InputGenerator,
    state::{PlayerState, TokenSet, TokenUpdate},
};
use crate::{
    arbiter::messages::{Claim, ClaimIntake},
    events::{EventSink, GameEvent},
    game::{
        config::GameConfig,
        entities::{FreezeKind, Pick, PlayerId, Slot, Verdict},
        table::SharedTable,
    },
};
use rand::{SeedableRng, rngs::StdRng};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU32, Ordering},
};
use tokio::{
    sync::{Notify, mpsc, watch},
    time::{Duration, Instant, sleep},
};
use tokio_util::sync::CancellationToken;

/// Longest uninterrupted sleep while frozen; bounds how stale the freeze
/// display can get
const FREEZE_TICK: Duration = Duration::from_millis(1000);

/// Where a player's key presses come from
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlayerKind {
    /// Presses arrive through [`PlayerHandle::key_pressed`] from outside
    Human,
    /// Presses are synthesized by an [`InputGenerator`]
    Computer,
}

/// Counters the actor writes and handles read
#[derive(Debug)]
struct PlayerShared {
    id: PlayerId,
    kind: PlayerKind,
    score: AtomicU32,
    blocked: AtomicBool,
}

/// Player actor handle for feeding input and observing the player
#[derive(Clone)]
pub struct PlayerHandle {
    shared: Arc<PlayerShared>,
    input: mpsc::Sender<Pick>,
    table: SharedTable,
    state: watch::Receiver<PlayerState>,
    cancel: CancellationToken,
}

impl PlayerHandle {
    pub fn id(&self) -> PlayerId {
        self.shared.id
    }

    pub fn kind(&self) -> PlayerKind {
        self.shared.kind
    }

    pub fn score(&self) -> u32 {
        self.shared.score.load(Ordering::Acquire)
    }

    /// Whether the player is refusing input (claim pending or frozen)
    pub fn is_blocked(&self) -> bool {
        self.shared.blocked.load(Ordering::Acquire)
    }

    pub fn state(&self) -> PlayerState {
        *self.state.borrow()
    }

    /// Wait until the player's state satisfies `predicate`.
    ///
    /// Returns the final state if the actor exits first.
    pub async fn wait_for_state<F>(&self, predicate: F) -> PlayerState
    where
        F: FnMut(&PlayerState) -> bool,
    {
        let mut state = self.state.clone();
        let reached = state.wait_for(predicate).await.map(|current| *current);
        reached.unwrap_or_else(|_| *state.borrow())
    }

    /// Report a key press on a slot.
    ///
    /// Never waits. The press is dropped when the player is blocked, the slot
    /// is empty, the arbiter is mid-rewrite of the table, or the input buffer
    /// already holds a claim's worth of presses.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the press was buffered
    pub fn key_pressed(&self, slot: Slot) -> bool {
        if self.is_blocked() || self.cancel.is_cancelled() {
            return false;
        }

        let Some(pick) = self.table.try_read().and_then(|table| table.pick_at(slot)) else {
            return false;
        };

        match self.input.try_send(pick) {
            Ok(()) => {
                log::trace!("{} pressed slot {}", self.shared.id, slot);
                true
            }
            Err(_) => false,
        }
    }

    /// Stop the player, waking it wherever it is suspended
    pub fn terminate(&self) {
        self.cancel.cancel();
    }

    pub fn is_terminated(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Player actor owning one player's tokens, score and freeze state
pub struct PlayerActor {
    shared: Arc<PlayerShared>,
    tokens: TokenSet,
    inbox: mpsc::Receiver<Pick>,
    table: SharedTable,
    intake: ClaimIntake,
    events: EventSink,
    state: watch::Sender<PlayerState>,
    cancel: CancellationToken,
    point_freeze: Duration,
    penalty_freeze: Duration,
    /// Signalled whenever the actor is ready for more input
    drained: Arc<Notify>,
    generator: Option<InputGenerator>,
}

impl PlayerActor {
    /// Create a new player actor
    ///
    /// # Arguments
    ///
    /// * `id` - Player ID
    /// * `kind` - Human players are fed through the handle, computer players
    ///   get their own input generator
    /// * `config` - Game configuration (claim size, freezes, generator pace)
    /// * `table` - Table the player reads
    /// * `intake` - Arbiter claim intake
    /// * `events` - Presentation sink
    /// * `cancel` - Token that terminates this player
    ///
    /// # Returns
    ///
    /// * `(PlayerActor, PlayerHandle)` - Actor and handle for sending input
    pub fn new(
        id: PlayerId,
        kind: PlayerKind,
        config: &GameConfig,
        table: SharedTable,
        intake: ClaimIntake,
        events: EventSink,
        cancel: CancellationToken,
    ) -> (Self, PlayerHandle) {
        let (input, inbox) = mpsc::channel(config.claim_size);
        let (state, state_rx) = watch::channel(PlayerState::Idle);
        let shared = Arc::new(PlayerShared {
            id,
            kind,
            score: AtomicU32::new(0),
            blocked: AtomicBool::new(false),
        });

        let handle = PlayerHandle {
            shared: shared.clone(),
            input,
            table: table.clone(),
            state: state_rx,
            cancel: cancel.clone(),
        };

        let drained = Arc::new(Notify::new());
        let generator = match kind {
            PlayerKind::Human => None,
            PlayerKind::Computer => {
                let rng = match config.seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id.0 as u64 + 1)),
                    None => StdRng::from_os_rng(),
                };
                Some(InputGenerator::new(
                    handle.clone(),
                    config.table_size,
                    config.computer_pause(),
                    drained.clone(),
                    cancel.clone(),
                    rng,
                ))
            }
        };

        let actor = Self {
            shared,
            tokens: TokenSet::new(config.claim_size),
            inbox,
            table,
            intake,
            events,
            state,
            cancel,
            point_freeze: config.point_freeze(),
            penalty_freeze: config.penalty_freeze(),
            drained,
            generator,
        };

        (actor, handle)
    }

    pub fn id(&self) -> PlayerId {
        self.shared.id
    }

    /// Run the player actor event loop until terminated
    pub async fn run(mut self) {
        let id = self.shared.id;
        log::info!("{} starting ({:?})", id, self.shared.kind);

        let generator = self.generator.take().map(|g| tokio::spawn(g.run()));

        self.set_state(PlayerState::AwaitingInput);
        while !self.cancel.is_cancelled() {
            self.drained.notify_one();

            let press = tokio::select! {
                _ = self.cancel.cancelled() => break,
                press = self.inbox.recv() => match press {
                    Some(press) => press,
                    None => break,
                },
            };

            let Some(picks) = self.handle_key_press(press) else {
                continue;
            };

            let Some(verdict) = self.submit_claim(picks).await else {
                break;
            };

            if !self.apply_verdict(verdict).await {
                break;
            }
        }

        self.set_state(PlayerState::Terminated);
        // Stops the generator when the loop ended for any reason other than
        // cancellation (e.g. the arbiter went away)
        self.cancel.cancel();

        if let Some(task) = generator
            && task.await.is_err()
        {
            log::error!("{} input generator panicked", id);
        }

        log::info!("{} terminated", id);
    }

    /// Apply one buffered key press to the token set.
    ///
    /// # Returns
    ///
    /// * `Option<Vec<Pick>>` - The claim's picks once the last token is placed
    fn handle_key_press(&mut self, press: Pick) -> Option<Vec<Pick>> {
        self.prune_tokens();

        // The card pressed has since left the table, or the round it was
        // pressed in is over
        if !self.table.read().holds(&press) {
            return None;
        }

        let player = self.shared.id;
        match self.tokens.toggle(press) {
            TokenUpdate::Removed => {
                self.events.emit(GameEvent::TokenHidden {
                    player,
                    slot: press.slot,
                });
                None
            }
            TokenUpdate::Placed => {
                self.events.emit(GameEvent::TokenShown {
                    player,
                    slot: press.slot,
                });
                None
            }
            TokenUpdate::Completed => {
                self.events.emit(GameEvent::TokenShown {
                    player,
                    slot: press.slot,
                });
                Some(self.tokens.picks().to_vec())
            }
            TokenUpdate::Ignored => None,
        }
    }

    /// Drop tokens on cards the arbiter has taken off the table, and all
    /// tokens once a sweep has started a new round.
    ///
    /// Presentation already cleared them when the cards left.
    fn prune_tokens(&mut self) {
        let table = self.table.read();
        let dropped = self.tokens.retain_present(&table);
        if !dropped.is_empty() {
            log::trace!("{} lost tokens {:?}", self.shared.id, dropped);
        }
    }

    /// Hand a claim to the arbiter and suspend until its verdict.
    ///
    /// # Returns
    ///
    /// * `Option<Verdict>` - `None` if terminated while waiting
    async fn submit_claim(&mut self, picks: Vec<Pick>) -> Option<Verdict> {
        let id = self.shared.id;
        let (claim, verdict) = Claim::new(id, picks);

        self.shared.blocked.store(true, Ordering::Release);
        self.set_state(PlayerState::AwaitingVerdict);
        log::debug!("{} submitting claim on {:?}", id, claim.cards());

        tokio::select! {
            result = self.intake.request_examination(claim) => {
                if let Err(e) = result {
                    log::debug!("{}: {}", id, e);
                    return None;
                }
            }
            _ = self.cancel.cancelled() => return None,
        }

        // A verdict already delivered wins over a simultaneous termination
        tokio::select! {
            biased;
            verdict = verdict => verdict.ok(),
            _ = self.cancel.cancelled() => None,
        }
    }

    /// Score and freeze according to the verdict, then unblock.
    ///
    /// # Returns
    ///
    /// * `bool` - `false` if terminated mid-freeze
    async fn apply_verdict(&mut self, verdict: Verdict) -> bool {
        let id = self.shared.id;
        log::debug!("{} received {} verdict", id, verdict);

        if verdict == Verdict::Point {
            let score = self.shared.score.fetch_add(1, Ordering::AcqRel) + 1;
            self.events.emit(GameEvent::ScoreChanged { player: id, score });
        }

        if let Some(kind) = verdict.freeze_kind()
            && !self.freeze(kind).await
        {
            return false;
        }

        self.prune_tokens();
        self.shared.blocked.store(false, Ordering::Release);
        self.set_state(PlayerState::AwaitingInput);
        true
    }

    /// Sleep out a freeze in ticks, reporting the time left after each.
    ///
    /// # Returns
    ///
    /// * `bool` - `false` if terminated mid-freeze
    async fn freeze(&mut self, kind: FreezeKind) -> bool {
        let player = self.shared.id;
        let duration = match kind {
            FreezeKind::Point => self.point_freeze,
            FreezeKind::Penalty => self.penalty_freeze,
        };

        self.set_state(PlayerState::Frozen(kind));
        let until = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= until {
                break;
            }
            let remaining = until - now;
            self.events
                .emit(GameEvent::FreezeChanged { player, remaining });

            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = sleep(remaining.min(FREEZE_TICK)) => {}
            }
        }

        self.events.emit(GameEvent::FreezeChanged {
            player,
            remaining: Duration::ZERO,
        });
        true
    }

    fn set_state(&self, state: PlayerState) {
        log::trace!("{} -> {}", self.shared.id, state);
        self.state.send_replace(state);
    }
}
