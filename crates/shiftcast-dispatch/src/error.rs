// Error types for dispatch operations

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the dispatcher. Idempotency short-circuits
/// (`already_fanout`, `already_claimed`) are normal outcomes and are not
/// represented here.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Shift not found
    #[error("shift not found: {0}")]
    ShiftNotFound(Uuid),
}
