// In-memory store
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// Every read clones the row out; every mutation runs inside a single
// write-lock critical section. On a multithreaded runtime that critical
// section is what makes the check-and-set operations (claim, fanout gate,
// decline insert) atomic with respect to all other callers.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use shiftcast_core::{Caregiver, Shift};

/// Input for creating a shift.
#[derive(Debug, Clone)]
pub struct NewShift {
    pub organization_id: Uuid,
    pub role_required: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Input for creating a caregiver.
#[derive(Debug, Clone)]
pub struct NewCaregiver {
    pub name: String,
    pub role: String,
    pub phone: String,
}

/// Result of the fanout idempotency gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutGate {
    /// This caller won the gate; `fanout_started_at` is now set to the
    /// given instant.
    Started(DateTime<Utc>),
    /// Fanout already began earlier; the original timestamp is returned.
    AlreadyStarted(DateTime<Utc>),
}

/// In-memory store for shifts and caregivers.
/// All data is stored in memory and lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    shifts: RwLock<HashMap<Uuid, Shift>>,
    caregivers: RwLock<HashMap<Uuid, Caregiver>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Shifts
    // ============================================

    pub fn create_shift(&self, input: NewShift) -> Shift {
        let shift = Shift {
            id: Uuid::now_v7(),
            organization_id: input.organization_id,
            role_required: input.role_required,
            start_time: input.start_time,
            end_time: input.end_time,
            claimed: false,
            claimed_by: None,
            claimed_at: None,
            fanout_started_at: None,
            declined_caregiver_ids: vec![],
            created_at: Self::now(),
        };
        self.shifts.write().insert(shift.id, shift.clone());
        shift
    }

    pub fn get_shift(&self, id: Uuid) -> Option<Shift> {
        self.shifts.read().get(&id).cloned()
    }

    pub fn delete_shift(&self, id: Uuid) -> bool {
        self.shifts.write().remove(&id).is_some()
    }

    pub fn list_shifts(&self) -> Vec<Shift> {
        let shifts = self.shifts.read();
        let mut result: Vec<_> = shifts.values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Drop all shifts and caregivers.
    pub fn clear(&self) {
        self.shifts.write().clear();
        self.caregivers.write().clear();
    }

    /// Atomically claim a shift if it is not already claimed.
    ///
    /// For any shift, across any number of concurrent callers, exactly one
    /// call ever returns `true`; every other call (and any call for a
    /// missing shift) returns `false`. The winner's id and timestamp are
    /// recorded and never overwritten.
    pub fn claim_if_unclaimed(&self, shift_id: Uuid, claimer: Uuid, at: DateTime<Utc>) -> bool {
        let mut shifts = self.shifts.write();
        match shifts.get_mut(&shift_id) {
            Some(shift) if !shift.claimed => {
                shift.claimed = true;
                shift.claimed_by = Some(claimer);
                shift.claimed_at = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Atomically pass the fanout idempotency gate.
    ///
    /// The first caller for a shift sets `fanout_started_at = at` and gets
    /// `Started`; later callers get `AlreadyStarted` with the original
    /// timestamp. Returns `None` when the shift does not exist. Two callers
    /// racing on a never-fanned-out shift cannot both see `Started`.
    pub fn begin_fanout(&self, shift_id: Uuid, at: DateTime<Utc>) -> Option<FanoutGate> {
        let mut shifts = self.shifts.write();
        let shift = shifts.get_mut(&shift_id)?;
        match shift.fanout_started_at {
            Some(original) => Some(FanoutGate::AlreadyStarted(original)),
            None => {
                shift.fanout_started_at = Some(at);
                Some(FanoutGate::Started(at))
            }
        }
    }

    /// Record a decline with set semantics. Returns `Some(true)` when the
    /// caregiver was newly added, `Some(false)` when already present, and
    /// `None` when the shift does not exist.
    pub fn record_decline(&self, shift_id: Uuid, caregiver_id: Uuid) -> Option<bool> {
        let mut shifts = self.shifts.write();
        let shift = shifts.get_mut(&shift_id)?;
        if shift.declined_caregiver_ids.contains(&caregiver_id) {
            Some(false)
        } else {
            shift.declined_caregiver_ids.push(caregiver_id);
            Some(true)
        }
    }

    // ============================================
    // Caregivers
    // ============================================

    /// Add a caregiver to the roster. Phone numbers must be unique; they
    /// route inbound replies back to a caregiver.
    pub fn create_caregiver(&self, input: NewCaregiver) -> Result<Caregiver> {
        let mut caregivers = self.caregivers.write();
        if caregivers.values().any(|c| c.phone == input.phone) {
            return Err(anyhow!("phone {} already registered", input.phone));
        }
        let caregiver = Caregiver {
            id: Uuid::now_v7(),
            name: input.name,
            role: input.role,
            phone: input.phone,
            created_at: Self::now(),
        };
        caregivers.insert(caregiver.id, caregiver.clone());
        Ok(caregiver)
    }

    pub fn get_caregiver(&self, id: Uuid) -> Option<Caregiver> {
        self.caregivers.read().get(&id).cloned()
    }

    pub fn get_caregiver_by_phone(&self, phone: &str) -> Option<Caregiver> {
        self.caregivers
            .read()
            .values()
            .find(|c| c.phone == phone)
            .cloned()
    }

    pub fn list_caregivers(&self) -> Vec<Caregiver> {
        let caregivers = self.caregivers.read();
        let mut result: Vec<_> = caregivers.values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Caregivers whose role matches `role_required`. No ordering guarantee.
    pub fn caregivers_with_role(&self, role_required: &str) -> Vec<Caregiver> {
        self.caregivers
            .read()
            .values()
            .filter(|c| c.role == role_required)
            .cloned()
            .collect()
    }
}
