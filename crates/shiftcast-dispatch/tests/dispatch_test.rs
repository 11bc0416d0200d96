// Scenario tests for the fanout/escalation orchestrator, driven entirely by
// simulated time. Run with: cargo test -p shiftcast-dispatch

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use shiftcast_core::{Caregiver, ManualClock, RecordingGateway};
use shiftcast_dispatch::{ClaimOutcome, DispatchConfig, Dispatcher, FanoutOutcome};
use shiftcast_storage::{InMemoryStore, NewCaregiver, NewShift};

struct Harness {
    store: Arc<InMemoryStore>,
    gateway: Arc<RecordingGateway>,
    clock: Arc<ManualClock>,
    dispatcher: Arc<Dispatcher>,
}

impl Harness {
    fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 0).unwrap();
        let store = Arc::new(InMemoryStore::new());
        let gateway = Arc::new(RecordingGateway::new());
        let clock = Arc::new(ManualClock::new(start));
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            gateway.clone(),
            clock.clone(),
            DispatchConfig::default(),
        ));
        Self {
            store,
            gateway,
            clock,
            dispatcher,
        }
    }

    fn add_caregiver(&self, name: &str, role: &str, phone: &str) -> Caregiver {
        self.store
            .create_caregiver(NewCaregiver {
                name: name.to_string(),
                role: role.to_string(),
                phone: phone.to_string(),
            })
            .expect("unique phone")
    }

    fn add_shift(&self, role: &str) -> Uuid {
        self.store
            .create_shift(NewShift {
                organization_id: Uuid::now_v7(),
                role_required: role.to_string(),
                start_time: Utc.with_ymd_and_hms(2025, 7, 2, 8, 0, 0).unwrap(),
                end_time: Utc.with_ymd_and_hms(2025, 7, 2, 16, 0, 0).unwrap(),
            })
            .id
    }

    /// Standard roster from the scenarios: one RN, two LPNs.
    fn seed_roster(&self) -> (Caregiver, Caregiver, Caregiver) {
        (
            self.add_caregiver("Alice Ongwele", "RN", "+15550001"),
            self.add_caregiver("Wei Yan", "LPN", "+15550002"),
            self.add_caregiver("Barry Kozumikov", "LPN", "+15550003"),
        )
    }
}

/// Poll until `condition` holds; panics after two (real) seconds.
async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_fanout_texts_only_matching_role() {
    let h = Harness::new();
    h.seed_roster();
    let rn_shift = h.add_shift("RN");

    let outcome = h.dispatcher.start_fanout(rn_shift).await.unwrap();

    match outcome {
        FanoutOutcome::Started {
            role_required,
            qualifying_caregivers,
            ..
        } => {
            assert_eq!(role_required, "RN");
            assert_eq!(qualifying_caregivers, 1);
        }
        other => panic!("expected Started, got {:?}", other),
    }

    assert_eq!(h.gateway.texted_phones(), vec!["+15550001"]);
    assert!(h.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_fanout_texts_all_matching_role() {
    let h = Harness::new();
    h.seed_roster();
    let lpn_shift = h.add_shift("LPN");

    h.dispatcher.start_fanout(lpn_shift).await.unwrap();

    assert_eq!(h.gateway.texted_phones(), vec!["+15550002", "+15550003"]);
}

#[tokio::test]
async fn test_fanout_unknown_shift_is_not_found() {
    let h = Harness::new();
    assert!(h.dispatcher.start_fanout(Uuid::now_v7()).await.is_err());
}

#[tokio::test]
async fn test_second_fanout_is_short_circuited() {
    let h = Harness::new();
    h.seed_roster();
    let rn_shift = h.add_shift("RN");

    let first = h.dispatcher.start_fanout(rn_shift).await.unwrap();
    let started_at = match first {
        FanoutOutcome::Started {
            fanout_started_at, ..
        } => fanout_started_at,
        other => panic!("expected Started, got {:?}", other),
    };

    h.clock.advance(Duration::from_secs(60));
    let second = h.dispatcher.start_fanout(rn_shift).await.unwrap();

    assert_eq!(
        second,
        FanoutOutcome::AlreadyStarted {
            fanout_started_at: started_at
        }
    );
    // still exactly one text burst and one escalation task
    assert_eq!(h.gateway.texts().len(), 1);
    assert_eq!(h.dispatcher.registry().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_fanouts_send_one_burst() {
    let h = Harness::new();
    h.seed_roster();
    let lpn_shift = h.add_shift("LPN");

    let (a, b) = tokio::join!(
        h.dispatcher.start_fanout(lpn_shift),
        h.dispatcher.start_fanout(lpn_shift),
    );

    let started = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|o| matches!(o, FanoutOutcome::Started { .. }))
        .count();
    assert_eq!(started, 1);
    assert_eq!(h.gateway.texts().len(), 2); // one burst to two LPNs
    assert_eq!(h.dispatcher.registry().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_accepts_have_one_winner() {
    let h = Harness::new();
    let (alice, _, _) = h.seed_roster();
    let alice_id = alice.id;
    let eve_id = h.add_caregiver("Eve Example", "RN", "+15550004").id;
    let rn_shift = h.add_shift("RN");

    h.dispatcher.start_fanout(rn_shift).await.unwrap();

    let d1 = h.dispatcher.clone();
    let d2 = h.dispatcher.clone();
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { d1.handle_accept(alice_id, rn_shift) }),
        tokio::spawn(async move { d2.handle_accept(eve_id, rn_shift) }),
    );

    let mut statuses: Vec<&str> = [r1.unwrap().unwrap(), r2.unwrap().unwrap()]
        .iter()
        .map(|o| match o {
            ClaimOutcome::Claimed { .. } => "claimed",
            ClaimOutcome::AlreadyClaimed => "already_claimed",
        })
        .collect();
    statuses.sort();
    assert_eq!(statuses, vec!["already_claimed", "claimed"]);

    let shift = h.store.get_shift(rn_shift).unwrap();
    assert!(shift.claimed);
    let winner = shift.claimed_by.unwrap();
    assert!(winner == alice_id || winner == eve_id);
}

#[tokio::test]
async fn test_escalation_calls_audience_minus_declines() {
    let h = Harness::new();
    let (_, wei, _) = h.seed_roster();
    let lpn_shift = h.add_shift("LPN");

    h.dispatcher.start_fanout(lpn_shift).await.unwrap();
    h.dispatcher.handle_decline(wei.id, lpn_shift).unwrap();

    h.clock.advance(Duration::from_secs(600));
    wait_until(|| h.dispatcher.registry().is_empty()).await;

    assert_eq!(h.gateway.called_phones(), vec!["+15550003"]);
}

#[tokio::test]
async fn test_escalation_fires_nothing_before_deadline() {
    let h = Harness::new();
    h.seed_roster();
    let lpn_shift = h.add_shift("LPN");

    h.dispatcher.start_fanout(lpn_shift).await.unwrap();

    h.clock.advance(Duration::from_secs(9 * 60));
    // give the task a chance to run if it were (incorrectly) going to
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(h.gateway.calls().is_empty());
    assert_eq!(h.dispatcher.registry().len(), 1);

    h.clock.advance(Duration::from_secs(60));
    wait_until(|| h.dispatcher.registry().is_empty()).await;
    assert_eq!(h.gateway.called_phones(), vec!["+15550002", "+15550003"]);
}

#[tokio::test]
async fn test_claim_before_deadline_suppresses_escalation() {
    let h = Harness::new();
    let (_, wei, _) = h.seed_roster();
    let lpn_shift = h.add_shift("LPN");

    h.dispatcher.start_fanout(lpn_shift).await.unwrap();

    h.clock.advance(Duration::from_secs(5 * 60));
    let outcome = h.dispatcher.handle_accept(wei.id, lpn_shift).unwrap();
    assert!(matches!(outcome, ClaimOutcome::Claimed { .. }));

    // task must reach a terminal state without ever firing
    wait_until(|| h.dispatcher.registry().is_empty()).await;
    h.clock.advance(Duration::from_secs(5 * 60));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(h.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_repeated_declines_keep_one_entry() {
    let h = Harness::new();
    let (_, wei, _) = h.seed_roster();
    let lpn_shift = h.add_shift("LPN");

    h.dispatcher.start_fanout(lpn_shift).await.unwrap();
    h.dispatcher.handle_decline(wei.id, lpn_shift).unwrap();
    h.dispatcher.handle_decline(wei.id, lpn_shift).unwrap();

    let declined = h.store.get_shift(lpn_shift).unwrap().declined_caregiver_ids;
    assert_eq!(declined, vec![wei.id]);
}

#[tokio::test]
async fn test_caregiver_added_after_fanout_joins_escalation() {
    let h = Harness::new();
    h.seed_roster();
    let rn_shift = h.add_shift("RN");

    h.dispatcher.start_fanout(rn_shift).await.unwrap();
    assert_eq!(h.gateway.texts().len(), 1);

    // roster grows while the escalation task is suspended
    h.add_caregiver("Eve Example", "RN", "+15550004");

    h.clock.advance(Duration::from_secs(600));
    wait_until(|| h.dispatcher.registry().is_empty()).await;

    // round-2 audience is evaluated at wake time
    assert_eq!(h.gateway.called_phones(), vec!["+15550001", "+15550004"]);
}

#[tokio::test]
async fn test_shift_deleted_during_wait_supersedes_escalation() {
    let h = Harness::new();
    h.seed_roster();
    let rn_shift = h.add_shift("RN");

    h.dispatcher.start_fanout(rn_shift).await.unwrap();
    assert!(h.store.delete_shift(rn_shift));

    h.clock.advance(Duration::from_secs(600));
    wait_until(|| h.dispatcher.registry().is_empty()).await;

    assert!(h.gateway.calls().is_empty());
}
