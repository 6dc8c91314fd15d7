//! Arbiter actor: round loop, countdown, claim intake and shutdown.

use super::{
    examiner::{ExaminationStats, Examiner},
    messages::{Claim, ClaimIntake},
};
use crate::{
    errors::{GameError, GameResult},
    events::{EventSink, GameEvent},
    game::{
        config::GameConfig,
        deck::Deck,
        entities::{PlayerId, Verdict},
        rules::CombinationRules,
        table::SharedTable,
    },
    player::{PlayerActor, PlayerHandle, PlayerKind},
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Duration, Instant, sleep},
};
use tokio_util::sync::CancellationToken;

/// Longest idle wait while the round clock is far from expiry
const IDLE_POLL: Duration = Duration::from_millis(1000);

/// Wait once the countdown turns urgent, so the deadline is met closely
const URGENT_POLL: Duration = Duration::from_millis(10);

/// Arbiter actor handle
#[derive(Clone)]
pub struct ArbiterHandle {
    intake: ClaimIntake,
    table: SharedTable,
    players: Vec<PlayerHandle>,
    cancel: CancellationToken,
}

impl ArbiterHandle {
    /// Claim intake shared with every player
    pub fn intake(&self) -> &ClaimIntake {
        &self.intake
    }

    /// Queue a claim for examination and wake the round loop
    pub async fn request_examination(&self, claim: Claim) -> GameResult<()> {
        self.intake.request_examination(claim).await
    }

    pub fn table(&self) -> &SharedTable {
        &self.table
    }

    pub fn players(&self) -> &[PlayerHandle] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerHandle> {
        self.players.get(id.0)
    }

    /// End the game: the current round stops, every player is woken and
    /// joined, and winners are announced
    pub fn terminate(&self) {
        self.cancel.cancel();
    }

    pub fn is_terminated(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Final state of a finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    /// Score per player, in player order
    pub scores: Vec<(PlayerId, u32)>,
    /// Every player tied at the maximum score
    pub winners: Vec<PlayerId>,
    pub rounds: u32,
    pub stats: ExaminationStats,
}

/// All players tied at the maximum score
pub fn winners(scores: &[(PlayerId, u32)]) -> Vec<PlayerId> {
    let Some(max) = scores.iter().map(|&(_, score)| score).max() else {
        return Vec::new();
    };
    scores
        .iter()
        .filter(|&&(_, score)| score == max)
        .map(|&(id, _)| id)
        .collect()
}

/// Arbiter actor owning the table, the deck and claim examination
pub struct ArbiterActor {
    config: GameConfig,
    examiner: Examiner,
    inbox: mpsc::Receiver<Claim>,
    events: EventSink,
    cancel: CancellationToken,
    /// Spawned when the first round has been dealt
    players: Vec<PlayerActor>,
    handles: Vec<PlayerHandle>,
    deadline: Instant,
    round: u32,
}

impl ArbiterActor {
    /// Create a new arbiter actor together with its players
    ///
    /// # Arguments
    ///
    /// * `config` - Game configuration
    /// * `rules` - Combination rule engine
    /// * `events` - Presentation sink shared with the players
    ///
    /// # Returns
    ///
    /// * `GameResult<(ArbiterActor, ArbiterHandle)>` - Actor and handle, or a
    ///   configuration error
    pub fn new(
        config: GameConfig,
        rules: Arc<dyn CombinationRules>,
        events: EventSink,
    ) -> GameResult<(Self, ArbiterHandle)> {
        config.validate()?;
        if rules.claim_size() != config.claim_size {
            return Err(GameError::RulesMismatch {
                rules: rules.claim_size(),
                configured: config.claim_size,
            });
        }

        let table = SharedTable::new(config.table_size);
        // At most one pending claim per player
        let (sender, inbox) = mpsc::channel(config.player_count());
        let intake = ClaimIntake::new(sender);
        let cancel = CancellationToken::new();

        let (players, handles): (Vec<PlayerActor>, Vec<PlayerHandle>) = (0..config
            .player_count())
            .map(|i| {
                let kind = if i < config.human_players {
                    PlayerKind::Human
                } else {
                    PlayerKind::Computer
                };
                PlayerActor::new(
                    PlayerId(i),
                    kind,
                    &config,
                    table.clone(),
                    intake.clone(),
                    events.clone(),
                    cancel.child_token(),
                )
            })
            .unzip();

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let examiner = Examiner::new(
            table.clone(),
            Deck::new(config.deck_size),
            rules,
            events.clone(),
            rng,
        );

        let handle = ArbiterHandle {
            intake,
            table,
            players: handles.clone(),
            cancel: cancel.clone(),
        };

        let actor = Self {
            config,
            examiner,
            inbox,
            events,
            cancel,
            players,
            handles,
            deadline: Instant::now(),
            round: 0,
        };

        Ok((actor, handle))
    }

    /// Run rounds until terminated or no valid combination remains
    pub async fn run(mut self) -> GameResult<GameSummary> {
        log::info!("Arbiter starting with {} players", self.handles.len());

        let mut tasks = Vec::new();
        loop {
            self.round += 1;
            let dealt = self.examiner.deal();
            log::info!(
                "Round {} starting: {} cards dealt, {} left in deck",
                self.round,
                dealt,
                self.examiner.deck_len()
            );

            // No-op after the first round
            tasks.extend(self.start_players());

            self.events.emit(GameEvent::RoundStarted { round: self.round });
            if self.config.hints {
                for hint in self.examiner.hints() {
                    log::info!("Hint: {:?}", hint);
                }
            }

            self.timer_loop().await;

            let returned = self.examiner.sweep();
            self.events.emit(GameEvent::RoundEnded { round: self.round });
            log::info!(
                "Round {} ended, {} cards returned to deck",
                self.round,
                returned
            );

            if self.should_end_game() {
                break;
            }
        }

        self.shutdown(tasks).await
    }

    fn start_players(&mut self) -> Vec<(PlayerId, JoinHandle<()>)> {
        std::mem::take(&mut self.players)
            .into_iter()
            .map(|player| (player.id(), tokio::spawn(player.run())))
            .collect()
    }

    /// Inner loop of a round, running until the clock expires, the game is
    /// terminated or no valid combination remains
    async fn timer_loop(&mut self) {
        self.reset_round_clock();
        if !self.examiner.has_combination() {
            log::info!("No valid combination left");
            return;
        }

        while !self.cancel.is_cancelled() {
            let now = Instant::now();
            if now >= self.deadline {
                break;
            }

            let remaining = self.deadline - now;
            let urgent = remaining <= self.config.urgent_threshold();
            self.events
                .emit(GameEvent::Countdown { remaining, urgent });

            self.sleep_until_woken_or_timeout(remaining, urgent).await;

            // Claims still queued are released unscored by shutdown
            if self.cancel.is_cancelled() {
                break;
            }

            if !self.examine_pending() {
                log::info!("No valid combination left");
                break;
            }
        }
    }

    /// Suspend until a claim arrives, the poll interval passes or the game
    /// is terminated
    async fn sleep_until_woken_or_timeout(&mut self, remaining: Duration, urgent: bool) {
        let poll = if urgent {
            URGENT_POLL.min(remaining)
        } else {
            // Wake no later than the moment the countdown turns urgent
            IDLE_POLL.min(remaining.saturating_sub(self.config.urgent_threshold()))
        };

        tokio::select! {
            claim = self.inbox.recv() => match claim {
                Some(claim) => self.examiner.enqueue(claim),
                None => sleep(poll).await,
            },
            _ = sleep(poll) => {}
            _ = self.cancel.cancelled() => {}
        }
    }

    /// Examine queued claims one at a time in arrival order.
    ///
    /// # Returns
    ///
    /// * `bool` - `false` once a scored claim leaves no valid combination
    fn examine_pending(&mut self) -> bool {
        loop {
            self.drain_inbox();
            match self.examiner.examine_next() {
                None => return true,
                Some(Verdict::Point) => {
                    self.reset_round_clock();
                    if !self.examiner.has_combination() {
                        return false;
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn drain_inbox(&mut self) {
        while let Ok(claim) = self.inbox.try_recv() {
            self.examiner.enqueue(claim);
        }
    }

    fn reset_round_clock(&mut self) {
        let duration = self.config.round_duration();
        self.deadline = Instant::now() + duration;
        self.events.emit(GameEvent::Countdown {
            remaining: duration,
            urgent: duration <= self.config.urgent_threshold(),
        });
    }

    fn should_end_game(&self) -> bool {
        self.cancel.is_cancelled() || !self.examiner.has_combination()
    }

    /// Release outstanding claims, stop and join every player in descending
    /// id order, then announce the winners from the final scores
    async fn shutdown(
        mut self,
        tasks: Vec<(PlayerId, JoinHandle<()>)>,
    ) -> GameResult<GameSummary> {
        self.drain_inbox();
        self.examiner.release_pending();
        self.cancel.cancel();

        let mut panicked = None;
        for (id, task) in tasks.into_iter().rev() {
            if task.await.is_err() {
                log::error!("{} panicked", id);
                panicked.get_or_insert(id);
            }
        }

        // Claims that raced the cancellation
        self.drain_inbox();
        self.examiner.release_pending();

        if let Some(id) = panicked {
            return Err(GameError::ActorPanicked {
                actor: id.to_string(),
            });
        }

        let scores: Vec<(PlayerId, u32)> = self
            .handles
            .iter()
            .map(|handle| (handle.id(), handle.score()))
            .collect();
        let winners = winners(&scores);
        log::info!("Winners: {:?} with scores {:?}", winners, scores);
        self.events
            .emit(GameEvent::WinnersAnnounced(winners.clone()));

        let pause = self.config.end_game_pause();
        if !pause.is_zero() {
            sleep(pause).await;
        }

        log::info!("Arbiter terminated after {} rounds", self.round);
        Ok(GameSummary {
            scores,
            winners,
            rounds: self.round,
            stats: self.examiner.stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winners_include_ties() {
        let scores = vec![
            (PlayerId(0), 4),
            (PlayerId(1), 2),
            (PlayerId(2), 4),
            (PlayerId(3), 0),
        ];
        assert_eq!(winners(&scores), vec![PlayerId(0), PlayerId(2)]);
    }

    #[test]
    fn test_winners_all_zero() {
        let scores = vec![(PlayerId(0), 0), (PlayerId(1), 0)];
        assert_eq!(winners(&scores), vec![PlayerId(0), PlayerId(1)]);
        assert!(winners(&[]).is_empty());
    }
}
