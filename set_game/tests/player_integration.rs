//! Integration tests for player actors.
//!
//! The test plays the arbiter: it owns the table and the receiving end of
//! the claim intake and resolves claims by hand.

use set_game::{
    Card, EventSink, GameConfig, GameEvent, PlayerHandle, PlayerId, PlayerKind, PlayerState,
    Verdict,
    arbiter::{Claim, ClaimIntake},
    game::{FreezeKind, SharedTable},
    player::PlayerActor,
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Duration, Instant, timeout},
};
use tokio_util::sync::CancellationToken;

struct Harness {
    handle: PlayerHandle,
    actor: Option<PlayerActor>,
    table: SharedTable,
    claims: mpsc::Receiver<Claim>,
    events: mpsc::Receiver<GameEvent>,
}

/// One human player over a 12-slot table holding cards 0..12 in order
fn harness() -> Harness {
    let config = GameConfig {
        human_players: 1,
        computer_players: 0,
        point_freeze_ms: 1000,
        penalty_freeze_ms: 3000,
        ..GameConfig::default()
    };

    let table = SharedTable::new(config.table_size);
    {
        let mut table = table.write();
        for id in 0..12 {
            table.place(Card(id), id as usize);
        }
    }

    let (sender, claims) = mpsc::channel(4);
    let sink = EventSink::new();
    let events = sink.subscribe(1024);
    let (actor, handle) = PlayerActor::new(
        PlayerId(0),
        PlayerKind::Human,
        &config,
        table.clone(),
        ClaimIntake::new(sender),
        sink,
        CancellationToken::new(),
    );

    Harness {
        handle,
        actor: Some(actor),
        table,
        claims,
        events,
    }
}

impl Harness {
    fn spawn(&mut self) -> JoinHandle<()> {
        let actor = self.actor.take().expect("actor already spawned");
        tokio::spawn(actor.run())
    }

    fn press(&self, slots: &[usize]) {
        for &slot in slots {
            assert!(self.handle.key_pressed(slot), "press on slot {slot} dropped");
        }
    }

    async fn next_claim(&mut self) -> Claim {
        timeout(Duration::from_secs(60), self.claims.recv())
            .await
            .expect("no claim submitted")
            .expect("intake closed")
    }

    async fn next_event(&mut self) -> GameEvent {
        timeout(Duration::from_secs(60), self.events.recv())
            .await
            .expect("no event emitted")
            .expect("event stream closed")
    }
}

/// End the table round the way the arbiter's sweep does, then deal every
/// card back into the slot it came from
fn redeal_same_cards(table: &SharedTable) {
    let mut table = table.write();
    for slot in 0..12 {
        table.remove(slot);
    }
    table.advance_round();
    for id in 0..12 {
        table.place(Card(id), id as usize);
    }
}

fn slots(claim: &Claim) -> Vec<usize> {
    claim.picks().iter().map(|pick| pick.slot).collect()
}

// ============================================================================
// Token bookkeeping
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_press_toggles_token() {
    let mut h = harness();
    let task = h.spawn();

    h.press(&[4, 4]);
    assert_eq!(
        h.next_event().await,
        GameEvent::TokenShown {
            player: PlayerId(0),
            slot: 4
        }
    );
    assert_eq!(
        h.next_event().await,
        GameEvent::TokenHidden {
            player: PlayerId(0),
            slot: 4
        }
    );

    h.handle.terminate();
    task.await.unwrap();
    assert!(h.claims.try_recv().is_err());
}

#[test]
fn test_input_buffer_holds_one_claim() {
    let h = harness();

    // Actor never runs, so nothing drains the buffer
    h.press(&[0, 1, 2]);
    assert!(!h.handle.key_pressed(3));
}

#[test]
fn test_press_on_empty_slot_dropped() {
    let h = harness();
    h.table.write().remove(5);

    assert!(!h.handle.key_pressed(5));
    assert!(!h.handle.key_pressed(40));
}

#[tokio::test(start_paused = true)]
async fn test_token_on_replaced_card_pruned() {
    let mut h = harness();
    let task = h.spawn();

    h.press(&[0]);
    h.next_event().await;
    {
        let mut table = h.table.write();
        table.remove(0);
        table.place(Card(50), 0);
    }

    h.press(&[1, 2]);
    assert!(timeout(Duration::from_millis(100), h.claims.recv()).await.is_err());

    h.press(&[3]);
    let claim = h.next_claim().await;
    assert_eq!(slots(&claim), vec![1, 2, 3]);
    assert_eq!(claim.cards(), vec![Card(1), Card(2), Card(3)]);

    h.handle.terminate();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tokens_cleared_when_round_changes() {
    let mut h = harness();
    let task = h.spawn();

    h.press(&[0]);
    h.next_event().await;
    redeal_same_cards(&h.table);

    // Card 0 is back in slot 0, but the token from the last round is gone
    h.press(&[1, 2]);
    assert!(timeout(Duration::from_millis(100), h.claims.recv()).await.is_err());

    h.press(&[3]);
    let claim = h.next_claim().await;
    assert_eq!(slots(&claim), vec![1, 2, 3]);

    h.handle.terminate();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_buffered_press_discarded_when_round_changes() {
    let mut h = harness();

    // Buffered before the sweep, handled after it
    h.press(&[0]);
    redeal_same_cards(&h.table);
    let task = h.spawn();

    h.press(&[1, 2]);
    assert!(timeout(Duration::from_millis(100), h.claims.recv()).await.is_err());

    h.press(&[3]);
    let claim = h.next_claim().await;
    assert_eq!(slots(&claim), vec![1, 2, 3]);

    h.handle.terminate();
    task.await.unwrap();
}

// ============================================================================
// Claims and verdicts
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_blocked_until_verdict_then_point_freeze() {
    let mut h = harness();
    let task = h.spawn();

    h.press(&[0, 1, 2]);
    let claim = h.next_claim().await;
    assert_eq!(claim.player(), PlayerId(0));
    assert_eq!(slots(&claim), vec![0, 1, 2]);

    h.handle
        .wait_for_state(|s| *s == PlayerState::AwaitingVerdict)
        .await;
    assert!(h.handle.is_blocked());
    assert!(!h.handle.key_pressed(5));

    let started = Instant::now();
    claim.resolve(Verdict::Point);
    h.handle
        .wait_for_state(|s| *s == PlayerState::Frozen(FreezeKind::Point))
        .await;
    assert_eq!(h.handle.score(), 1);
    assert!(!h.handle.key_pressed(5));

    h.handle
        .wait_for_state(|s| *s == PlayerState::AwaitingInput)
        .await;
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1000), "unfroze after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1100), "unfroze after {elapsed:?}");
    assert!(!h.handle.is_blocked());

    h.handle.terminate();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_penalty_freezes_longer_without_scoring() {
    let mut h = harness();
    let task = h.spawn();

    h.press(&[0, 1, 3]);
    let claim = h.next_claim().await;
    let started = Instant::now();
    claim.resolve(Verdict::Penalty);

    h.handle
        .wait_for_state(|s| *s == PlayerState::Frozen(FreezeKind::Penalty))
        .await;
    h.handle
        .wait_for_state(|s| *s == PlayerState::AwaitingInput)
        .await;

    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert_eq!(h.handle.score(), 0);

    // Freeze countdown ends at zero
    let mut last_freeze = None;
    while let Ok(event) = h.events.try_recv() {
        if let GameEvent::FreezeChanged { remaining, .. } = event {
            last_freeze = Some(remaining);
        }
    }
    assert_eq!(last_freeze, Some(Duration::ZERO));

    h.handle.terminate();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_neutral_verdict_returns_to_input_immediately() {
    let mut h = harness();
    let task = h.spawn();

    h.press(&[0, 1, 2]);
    let claim = h.next_claim().await;
    let started = Instant::now();
    claim.resolve(Verdict::Neutral);

    h.handle
        .wait_for_state(|s| *s == PlayerState::AwaitingInput)
        .await;
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(h.handle.score(), 0);

    // Tokens survive a neutral verdict: one more press completes a claim
    h.press(&[2, 5]);
    let claim = h.next_claim().await;
    assert_eq!(slots(&claim), vec![0, 1, 5]);

    h.handle.terminate();
    task.await.unwrap();
}

// ============================================================================
// Termination
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_terminate_while_awaiting_verdict() {
    let mut h = harness();
    let task = h.spawn();

    h.press(&[0, 1, 2]);
    let claim = h.next_claim().await;
    h.handle
        .wait_for_state(|s| *s == PlayerState::AwaitingVerdict)
        .await;

    h.handle.terminate();
    timeout(Duration::from_secs(1), task)
        .await
        .expect("player did not stop")
        .unwrap();
    assert_eq!(h.handle.state(), PlayerState::Terminated);

    // Late verdict goes nowhere
    claim.resolve(Verdict::Point);
    assert_eq!(h.handle.score(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_terminate_while_frozen() {
    let mut h = harness();
    let task = h.spawn();

    h.press(&[0, 1, 2]);
    h.next_claim().await.resolve(Verdict::Penalty);
    h.handle
        .wait_for_state(|s| matches!(s, PlayerState::Frozen(_)))
        .await;

    h.handle.terminate();
    timeout(Duration::from_millis(10), task)
        .await
        .expect("player did not stop mid-freeze")
        .unwrap();
    assert_eq!(h.handle.state(), PlayerState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn test_player_stops_when_arbiter_gone() {
    let mut h = harness();
    let task = h.spawn();

    h.claims.close();
    h.press(&[0, 1, 2]);

    timeout(Duration::from_secs(1), task)
        .await
        .expect("player did not stop")
        .unwrap();
    assert_eq!(h.handle.state(), PlayerState::Terminated);
    assert!(h.handle.is_terminated());
}

#[tokio::test(start_paused = true)]
async fn test_computer_player_submits_claims() {
    let config = GameConfig {
        human_players: 0,
        computer_players: 1,
        seed: Some(3),
        ..GameConfig::default()
    };
    let table = SharedTable::new(config.table_size);
    {
        let mut table = table.write();
        for id in 0..12 {
            table.place(Card(id), id as usize);
        }
    }
    let (sender, mut claims) = mpsc::channel(4);
    let (actor, handle) = PlayerActor::new(
        PlayerId(0),
        PlayerKind::Computer,
        &config,
        table,
        ClaimIntake::new(sender),
        EventSink::new(),
        CancellationToken::new(),
    );
    let task = tokio::spawn(actor.run());

    for _ in 0..3 {
        let claim = timeout(Duration::from_secs(10), claims.recv())
            .await
            .expect("computer player submitted nothing")
            .expect("intake closed");
        assert_eq!(claim.picks().len(), 3);
        claim.resolve(Verdict::Neutral);
    }

    handle.terminate();
    task.await.unwrap();
}
