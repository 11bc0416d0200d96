// Escalation task registry
//
// Tracks the live escalation task per shift so a successful claim can
// request cancellation. Cleanup is a drop guard held by the task itself:
// the registry entry is removed on every exit path (fired, superseded,
// cancelled, or a panic inside the task), not by a done-callback that a
// code path could forget to run.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

struct EscalationHandle {
    cancel: watch::Sender<bool>,
}

/// Registry of live (non-terminal) escalation tasks, keyed by shift id.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<Uuid, EscalationHandle>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an escalation task for `shift_id`.
    ///
    /// Returns the cancellation receiver the task selects on, and the guard
    /// the task must hold for its whole lifetime: dropping the guard
    /// removes the registry entry.
    pub fn register(self: &Arc<Self>, shift_id: Uuid) -> (watch::Receiver<bool>, RegistryGuard) {
        let (cancel, cancel_rx) = watch::channel(false);
        self.tasks
            .lock()
            .insert(shift_id, EscalationHandle { cancel });

        let guard = RegistryGuard {
            registry: Arc::clone(self),
            shift_id,
        };
        (cancel_rx, guard)
    }

    /// Request cancellation of the escalation task for `shift_id`.
    ///
    /// Returns whether a live task was signalled. Cancelling a shift with
    /// no registered task (never fanned out, or already terminal) is a
    /// no-op.
    pub fn cancel(&self, shift_id: Uuid) -> bool {
        match self.tasks.lock().get(&shift_id) {
            Some(handle) => handle.cancel.send(true).is_ok(),
            None => false,
        }
    }

    /// Whether a non-terminal escalation task exists for `shift_id`.
    pub fn contains(&self, shift_id: Uuid) -> bool {
        self.tasks.lock().contains_key(&shift_id)
    }

    /// Number of live escalation tasks.
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    fn remove(&self, shift_id: Uuid) {
        self.tasks.lock().remove(&shift_id);
    }
}

/// Removes the task's registry entry when dropped.
pub struct RegistryGuard {
    registry: Arc<TaskRegistry>,
    shift_id: Uuid,
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.registry.remove(self.shift_id);
    }
}
