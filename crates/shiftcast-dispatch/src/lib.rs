// Fanout/escalation orchestrator
//
// The Dispatcher is the explicit context object the whole protocol runs
// through: store, notification gateway, clock and task registry are wired
// in at construction and passed by reference, never reached through
// globals. One escalation task exists per fanned-out shift; the registry
// owns its cancellation channel until the task reaches a terminal state.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod escalation;
pub mod registry;

pub use config::DispatchConfig;
pub use dispatcher::{ClaimOutcome, Dispatcher, FanoutOutcome};
pub use error::DispatchError;
pub use escalation::EscalationOutcome;
pub use registry::TaskRegistry;
