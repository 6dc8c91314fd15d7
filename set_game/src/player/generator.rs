//! Synthetic key presses for computer players.

use super::actor::PlayerHandle;
use rand::{Rng, rngs::StdRng};
use std::sync::Arc;
use tokio::{
    sync::Notify,
    time::{Duration, sleep},
};
use tokio_util::sync::CancellationToken;

/// Floor on the pause between presses so a blocked player is never spun on
const MIN_PAUSE: Duration = Duration::from_millis(1);

/// Presses random slots on behalf of one player.
///
/// Uses the same non-blocking [`PlayerHandle::key_pressed`] a human input
/// source would, so it is throttled by the same input buffer.
pub struct InputGenerator {
    player: PlayerHandle,
    table_size: usize,
    pause: Duration,
    drained: Arc<Notify>,
    cancel: CancellationToken,
    rng: StdRng,
}

impl InputGenerator {
    /// Create a new input generator
    ///
    /// # Arguments
    ///
    /// * `player` - Handle of the player being driven
    /// * `table_size` - Presses land in `[0, table_size)`
    /// * `pause` - Longest wait between presses
    /// * `drained` - Signalled by the player when it is ready for input
    /// * `cancel` - The player's termination token
    /// * `rng` - Slot picker
    pub fn new(
        player: PlayerHandle,
        table_size: usize,
        pause: Duration,
        drained: Arc<Notify>,
        cancel: CancellationToken,
        rng: StdRng,
    ) -> Self {
        Self {
            player,
            table_size,
            pause: pause.max(MIN_PAUSE),
            drained,
            cancel,
            rng,
        }
    }

    /// Press random slots until the player terminates
    pub async fn run(mut self) {
        let id = self.player.id();
        log::info!("{} input generator starting", id);

        while !self.cancel.is_cancelled() {
            let slot = self.rng.random_range(0..self.table_size);
            self.player.key_pressed(slot);

            // Wake early once the player has consumed input or unblocked
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.drained.notified() => {}
                _ = sleep(self.pause) => {}
            }
        }

        log::info!("{} input generator terminated", id);
    }
}
