// Escalation task
//
// One task per fanned-out shift. It suspends until the deadline computed
// from the persisted fanout timestamp (never task-local elapsed time), then
// re-reads the shift fresh and either exits quietly or places voice calls
// to the caregivers who have not declined. Cancellation is cooperative: it
// stops a suspended task cleanly, but a task that has begun dispatching
// round-2 calls finishes the batch.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use shiftcast_core::{Clock, NotificationGateway};
use shiftcast_storage::InMemoryStore;

/// Terminal state of an escalation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// Round-2 voice calls were placed.
    Fired,
    /// The task exited without sending: shift missing, never fanned out,
    /// or already claimed by the time it woke.
    Superseded,
    /// A cancellation signal arrived while the task was suspended.
    Cancelled,
}

impl std::fmt::Display for EscalationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationOutcome::Fired => write!(f, "fired"),
            EscalationOutcome::Superseded => write!(f, "superseded"),
            EscalationOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Run the escalation protocol for one shift to a terminal outcome.
pub(crate) async fn run(
    store: Arc<InMemoryStore>,
    gateway: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    delay: Duration,
    shift_id: Uuid,
    mut cancel: watch::Receiver<bool>,
) -> EscalationOutcome {
    let Some(shift) = store.get_shift(shift_id) else {
        return EscalationOutcome::Superseded;
    };
    let Some(fanout_started_at) = shift.fanout_started_at else {
        return EscalationOutcome::Superseded;
    };

    // Deadline derives from the durable timestamp, so it stays consistent
    // no matter when this task was spawned or rescheduled.
    let deadline =
        fanout_started_at + chrono::Duration::milliseconds(delay.as_millis() as i64);

    tokio::select! {
        _ = clock.sleep_until(deadline) => {}
        _ = cancel.changed() => {
            debug!(%shift_id, "escalation cancelled while suspended");
            return EscalationOutcome::Cancelled;
        }
    }

    // Re-read fresh: the shift may have been claimed or deleted while we
    // were suspended.
    let Some(shift) = store.get_shift(shift_id) else {
        return EscalationOutcome::Superseded;
    };
    if shift.claimed {
        return EscalationOutcome::Superseded;
    }

    // Audience at wake time: qualifying roles minus recorded declines.
    let audience: Vec<_> = store
        .caregivers_with_role(&shift.role_required)
        .into_iter()
        .filter(|c| !shift.has_declined(c.id))
        .collect();

    let message = format!(
        "Shift {} still needs a {}. Reply 'yes' to accept.",
        shift_id, shift.role_required
    );

    let calls = audience.iter().map(|caregiver| {
        let gateway = Arc::clone(&gateway);
        let message = message.clone();
        async move {
            let result = gateway.place_voice_call(&caregiver.phone, &message).await;
            (caregiver.phone.clone(), result)
        }
    });

    for (phone, result) in join_all(calls).await {
        if let Err(e) = result {
            // best-effort: one bad number must not suppress the rest
            warn!(%shift_id, %phone, error = %e, "voice call failed");
        }
    }

    EscalationOutcome::Fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shiftcast_core::{ManualClock, RecordingGateway};
    use shiftcast_storage::{NewCaregiver, NewShift};

    fn fixture() -> (Arc<InMemoryStore>, Arc<RecordingGateway>, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 0).unwrap();
        (
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingGateway::new()),
            Arc::new(ManualClock::new(start)),
        )
    }

    fn new_shift(role: &str) -> NewShift {
        NewShift {
            organization_id: Uuid::now_v7(),
            role_required: role.to_string(),
            start_time: Utc.with_ymd_and_hms(2025, 7, 2, 8, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 7, 2, 16, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_missing_shift_is_superseded() {
        let (store, gateway, clock) = fixture();
        let (_tx, rx) = watch::channel(false);

        let outcome = run(
            store,
            gateway.clone(),
            clock,
            Duration::from_secs(600),
            Uuid::now_v7(),
            rx,
        )
        .await;

        assert_eq!(outcome, EscalationOutcome::Superseded);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_shift_without_fanout_is_superseded() {
        let (store, gateway, clock) = fixture();
        let shift = store.create_shift(new_shift("RN"));
        let (_tx, rx) = watch::channel(false);

        let outcome = run(
            store,
            gateway,
            clock,
            Duration::from_secs(600),
            shift.id,
            rx,
        )
        .await;

        assert_eq!(outcome, EscalationOutcome::Superseded);
    }

    #[tokio::test]
    async fn test_cancel_while_suspended_sends_nothing() {
        let (store, gateway, clock) = fixture();
        let shift = store.create_shift(new_shift("RN"));
        store.begin_fanout(shift.id, clock.now()).unwrap();

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(run(
            store,
            gateway.clone(),
            clock,
            Duration::from_secs(600),
            shift.id,
            rx,
        ));

        tokio::task::yield_now().await;
        tx.send(true).unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("task should end after cancel")
            .unwrap();
        assert_eq!(outcome, EscalationOutcome::Cancelled);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_claim_during_wait_supersedes_at_wake() {
        let (store, gateway, clock) = fixture();
        let shift = store.create_shift(new_shift("RN"));
        store.begin_fanout(shift.id, clock.now()).unwrap();

        let (_tx, rx) = watch::channel(false);
        let task = tokio::spawn(run(
            store.clone(),
            gateway.clone(),
            clock.clone(),
            Duration::from_secs(600),
            shift.id,
            rx,
        ));

        tokio::task::yield_now().await;
        // claimed while the task sleeps, but no cancel signal delivered
        assert!(store.claim_if_unclaimed(shift.id, Uuid::now_v7(), clock.now()));
        clock.advance(Duration::from_secs(600));

        let outcome = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("task should wake at deadline")
            .unwrap();
        assert_eq!(outcome, EscalationOutcome::Superseded);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fires_for_audience_minus_declines() {
        let (store, gateway, clock) = fixture();
        let wei = store
            .create_caregiver(NewCaregiver {
                name: "Wei".into(),
                role: "LPN".into(),
                phone: "+15550002".into(),
            })
            .unwrap();
        store
            .create_caregiver(NewCaregiver {
                name: "Barry".into(),
                role: "LPN".into(),
                phone: "+15550003".into(),
            })
            .unwrap();

        let shift = store.create_shift(new_shift("LPN"));
        store.begin_fanout(shift.id, clock.now()).unwrap();
        store.record_decline(shift.id, wei.id).unwrap();

        let (_tx, rx) = watch::channel(false);
        let task = tokio::spawn(run(
            store,
            gateway.clone(),
            clock.clone(),
            Duration::from_secs(600),
            shift.id,
            rx,
        ));

        tokio::task::yield_now().await;
        clock.advance(Duration::from_secs(600));

        let outcome = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("task should fire at deadline")
            .unwrap();
        assert_eq!(outcome, EscalationOutcome::Fired);
        assert_eq!(gateway.called_phones(), vec!["+15550003"]);
    }
}
