// Core domain types and collaborator traits for shiftcast
//
// This crate has no dependency on storage, dispatch or the HTTP surface.
// It defines the entities and the seams the orchestrator is wired through.

pub mod caregiver;
pub mod clock;
pub mod intent;
pub mod notify;
pub mod shift;

pub use caregiver::Caregiver;
pub use clock::{Clock, ManualClock, SystemClock};
pub use intent::{IntentClassifier, KeywordClassifier, MessageIntent};
pub use notify::{NotificationGateway, RecordingGateway, TracingGateway};
pub use shift::Shift;
