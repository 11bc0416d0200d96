// Dispatch configuration

use std::time::Duration;

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How long after round-1 fanout the escalation round fires for a
    /// still-unclaimed shift.
    pub escalation_delay: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            escalation_delay: Duration::from_secs(10 * 60),
        }
    }
}

impl DispatchConfig {
    /// Load configuration from the environment.
    ///
    /// `SHIFTCAST_ESCALATION_DELAY_SECS` overrides the ten-minute default.
    pub fn from_env() -> Self {
        let escalation_delay = std::env::var("SHIFTCAST_ESCALATION_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Self::default().escalation_delay);

        Self { escalation_delay }
    }
}
