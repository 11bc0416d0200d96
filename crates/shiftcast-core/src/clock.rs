// Injectable time source
//
// The escalation wait is ten minutes of wall time. Components never call
// Utc::now() or tokio::time::sleep directly; they go through a Clock so
// tests can compress time deterministically with ManualClock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// Time source and suspension primitive.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend until `now() >= deadline`. Returns immediately if the
    /// deadline has already passed.
    async fn sleep_until(&self, deadline: DateTime<Utc>);
}

/// Wall-clock implementation backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        // to_std fails when the deadline is already in the past
        if let Ok(remaining) = (deadline - Utc::now()).to_std() {
            tokio::time::sleep(remaining).await;
        }
    }
}

/// Simulated clock for tests. Time only moves when `advance`/`set` is
/// called; sleepers are woken through a watch channel, so a test can tick
/// the clock to a deadline and observe the escalation fire without any
/// real waiting.
#[derive(Debug)]
pub struct ManualClock {
    time: watch::Sender<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        let (time, _) = watch::channel(start);
        Self { time }
    }

    /// Move the clock forward, waking any sleeper whose deadline is reached.
    pub fn advance(&self, delta: std::time::Duration) {
        let delta = chrono::Duration::milliseconds(delta.as_millis() as i64);
        self.time.send_modify(|t| *t += delta);
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, at: DateTime<Utc>) {
        self.time.send_modify(|t| *t = at);
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.borrow()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        let mut ticks = self.time.subscribe();
        loop {
            if *ticks.borrow_and_update() >= deadline {
                return;
            }
            if ticks.changed().await.is_err() {
                // clock dropped; nothing will ever wake us
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::time::Duration;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_sleep_past_deadline_returns_immediately() {
        let clock = ManualClock::new(start());
        clock.sleep_until(start() - chrono::Duration::minutes(1)).await;
        clock.sleep_until(start()).await;
    }

    #[tokio::test]
    async fn test_advance_wakes_sleeper_at_deadline() {
        let clock = Arc::new(ManualClock::new(start()));
        let deadline = start() + chrono::Duration::minutes(10);

        let sleeper = {
            let clock = clock.clone();
            tokio::spawn(async move { clock.sleep_until(deadline).await })
        };

        // Not enough: sleeper must still be pending
        clock.advance(Duration::from_secs(9 * 60));
        tokio::task::yield_now().await;
        assert!(!sleeper.is_finished());

        clock.advance(Duration::from_secs(60));
        tokio::time::timeout(Duration::from_secs(1), sleeper)
            .await
            .expect("sleeper should wake at deadline")
            .unwrap();
    }

    #[tokio::test]
    async fn test_manual_clock_now_tracks_advances() {
        let clock = ManualClock::new(start());
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), start() + chrono::Duration::seconds(90));

        let later = start() + chrono::Duration::hours(2);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
