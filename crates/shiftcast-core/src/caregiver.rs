// Caregiver domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// A roster member who can be notified about and claim shifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Caregiver {
    pub id: Uuid,
    pub name: String,
    /// Role qualification matched against `Shift::role_required`.
    pub role: String,
    /// Phone number in E.164 form. Unique across the roster, since it is the
    /// lookup key for routing inbound replies back to a caregiver.
    pub phone: String,
    pub created_at: DateTime<Utc>,
}
