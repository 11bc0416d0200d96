// Dispatcher: fanout controller, claim arbitration, decline tracking
//
// Decision: the fanout idempotency gate lives in the store (one write-lock
// critical section), so two racing callers can never both start round 1
// Decision: notification sends are best-effort; per-recipient failures are
// logged and never abort the rest of the batch

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shiftcast_core::{Clock, NotificationGateway};
use shiftcast_storage::{FanoutGate, InMemoryStore};

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::escalation;
use crate::registry::TaskRegistry;

/// Result of a fanout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanoutOutcome {
    /// Round-1 texts were sent and an escalation task was registered.
    Started {
        role_required: String,
        qualifying_caregivers: usize,
        fanout_started_at: DateTime<Utc>,
    },
    /// Fanout already ran for this shift; nothing was sent.
    AlreadyStarted { fanout_started_at: DateTime<Utc> },
}

/// Result of an accept attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caregiver won the claim.
    Claimed {
        caregiver_id: Uuid,
        claimed_at: DateTime<Utc>,
    },
    /// Another caregiver already holds the shift.
    AlreadyClaimed,
}

/// Orchestrates the staged notification protocol for open shifts.
///
/// Constructed once and shared by reference; every collaborator is injected
/// here rather than reached through process-wide state.
pub struct Dispatcher {
    store: Arc<InMemoryStore>,
    gateway: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    registry: Arc<TaskRegistry>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<InMemoryStore>,
        gateway: Arc<dyn NotificationGateway>,
        clock: Arc<dyn Clock>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            clock,
            registry: Arc::new(TaskRegistry::new()),
            config,
        }
    }

    /// Live escalation tasks, keyed by shift id.
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Start round-1 fanout for a shift, idempotently.
    ///
    /// The first call texts every caregiver whose role matches, waits for
    /// all sends, then registers the escalation task. Any later (or
    /// concurrently racing) call returns `AlreadyStarted` with the original
    /// timestamp and performs no sends and no task registration.
    pub async fn start_fanout(&self, shift_id: Uuid) -> Result<FanoutOutcome, DispatchError> {
        let gate = self
            .store
            .begin_fanout(shift_id, self.clock.now())
            .ok_or(DispatchError::ShiftNotFound(shift_id))?;

        let fanout_started_at = match gate {
            FanoutGate::AlreadyStarted(original) => {
                debug!(%shift_id, "fanout already started");
                return Ok(FanoutOutcome::AlreadyStarted {
                    fanout_started_at: original,
                });
            }
            // Gate is closed from here on: the timestamp is persisted before
            // any suspension point below.
            FanoutGate::Started(at) => at,
        };

        let shift = self
            .store
            .get_shift(shift_id)
            .ok_or(DispatchError::ShiftNotFound(shift_id))?;

        let audience = self.store.caregivers_with_role(&shift.role_required);
        info!(
            %shift_id,
            role_required = %shift.role_required,
            qualifying = audience.len(),
            "starting fanout"
        );

        let message = format!("Shift {} available. Reply 'yes' to accept.", shift_id);
        let sends = audience.iter().map(|caregiver| {
            let gateway = Arc::clone(&self.gateway);
            let message = message.clone();
            async move {
                let result = gateway.send_text(&caregiver.phone, &message).await;
                (caregiver.phone.clone(), result)
            }
        });

        for (phone, result) in join_all(sends).await {
            if let Err(e) = result {
                warn!(%shift_id, %phone, error = %e, "text send failed");
            }
        }

        self.spawn_escalation(shift_id);

        Ok(FanoutOutcome::Started {
            role_required: shift.role_required,
            qualifying_caregivers: audience.len(),
            fanout_started_at,
        })
    }

    /// Arbitrate an accept attempt.
    ///
    /// Exactly one caregiver ever wins a given shift; the winner's claim
    /// also cancels the pending escalation task (a no-op when the task is
    /// absent or already terminal).
    pub fn handle_accept(
        &self,
        caregiver_id: Uuid,
        shift_id: Uuid,
    ) -> Result<ClaimOutcome, DispatchError> {
        let claimed_at = self.clock.now();

        if self
            .store
            .claim_if_unclaimed(shift_id, caregiver_id, claimed_at)
        {
            let cancelled = self.registry.cancel(shift_id);
            info!(%shift_id, %caregiver_id, cancelled_escalation = cancelled, "shift claimed");
            return Ok(ClaimOutcome::Claimed {
                caregiver_id,
                claimed_at,
            });
        }

        // Distinguish a lost race from a shift that never existed.
        if self.store.get_shift(shift_id).is_none() {
            return Err(DispatchError::ShiftNotFound(shift_id));
        }
        Ok(ClaimOutcome::AlreadyClaimed)
    }

    /// Record a decline. Idempotent; independent of claim state; it only
    /// narrows the audience of a later escalation round.
    pub fn handle_decline(&self, caregiver_id: Uuid, shift_id: Uuid) -> Result<(), DispatchError> {
        let newly_declined = self
            .store
            .record_decline(shift_id, caregiver_id)
            .ok_or(DispatchError::ShiftNotFound(shift_id))?;

        debug!(%shift_id, %caregiver_id, newly_declined, "decline recorded");
        Ok(())
    }

    fn spawn_escalation(&self, shift_id: Uuid) {
        let (cancel_rx, guard) = self.registry.register(shift_id);

        let store = Arc::clone(&self.store);
        let gateway = Arc::clone(&self.gateway);
        let clock = Arc::clone(&self.clock);
        let delay = self.config.escalation_delay;

        tokio::spawn(async move {
            // Entry removal rides on the guard, so it survives panics too.
            let _guard = guard;
            let outcome =
                escalation::run(store, gateway, clock, delay, shift_id, cancel_rx).await;
            info!(%shift_id, %outcome, "escalation task finished");
        });
    }
}
