// Shift domain types
//
// A shift is the unit of work being offered to the roster. Claim state and
// the fanout timestamp are owned by the store; nothing outside the storage
// crate mutates a Shift in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// An open (or claimed) shift offered to qualifying caregivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Shift {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Caregiver role required to qualify for this shift (e.g. "RN", "LPN").
    pub role_required: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// True once a caregiver has won the claim; never reverts.
    pub claimed: bool,
    /// Winning caregiver id. Set iff `claimed`, write-once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<Uuid>,
    /// When the claim was recorded. Set iff `claimed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    /// When round-1 fanout began. Transitions None -> Some exactly once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanout_started_at: Option<DateTime<Utc>>,
    /// Caregivers who declined this shift. Set semantics, only grows.
    #[serde(default)]
    pub declined_caregiver_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Shift {
    /// Whether `caregiver_id` has declined this shift.
    pub fn has_declined(&self, caregiver_id: Uuid) -> bool {
        self.declined_caregiver_ids.contains(&caregiver_id)
    }
}
