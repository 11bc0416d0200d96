// Notification gateway seam
//
// SMS/voice delivery is an external collaborator. Sends are best-effort:
// the gateway reports per-recipient failures but the orchestrator never
// retries them. TracingGateway is the dev-mode transport; RecordingGateway
// captures sends for tests and examples.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Outbound notification transport (SMS + voice).
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Send a text message to `phone`.
    async fn send_text(&self, phone: &str, message: &str) -> Result<()>;

    /// Place a voice call to `phone` reading out `message`.
    async fn place_voice_call(&self, phone: &str, message: &str) -> Result<()>;
}

/// Gateway that logs every send instead of delivering it. Default for dev
/// mode, where no SMS/voice provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingGateway;

#[async_trait]
impl NotificationGateway for TracingGateway {
    async fn send_text(&self, phone: &str, message: &str) -> Result<()> {
        tracing::info!(%phone, %message, "send_text");
        Ok(())
    }

    async fn place_voice_call(&self, phone: &str, message: &str) -> Result<()> {
        tracing::info!(%phone, %message, "place_voice_call");
        Ok(())
    }
}

/// Gateway that records every send in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    texts: Mutex<Vec<(String, String)>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(phone, message)` pairs sent as texts, in completion order.
    pub fn texts(&self) -> Vec<(String, String)> {
        self.texts.lock().clone()
    }

    /// All `(phone, message)` pairs placed as voice calls.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    /// Phone numbers texted so far, sorted for order-insensitive assertions.
    pub fn texted_phones(&self) -> Vec<String> {
        let mut phones: Vec<_> = self.texts.lock().iter().map(|(p, _)| p.clone()).collect();
        phones.sort();
        phones
    }

    /// Phone numbers called so far, sorted.
    pub fn called_phones(&self) -> Vec<String> {
        let mut phones: Vec<_> = self.calls.lock().iter().map(|(p, _)| p.clone()).collect();
        phones.sort();
        phones
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send_text(&self, phone: &str, message: &str) -> Result<()> {
        self.texts
            .lock()
            .push((phone.to_string(), message.to_string()));
        Ok(())
    }

    async fn place_voice_call(&self, phone: &str, message: &str) -> Result<()> {
        self.calls
            .lock()
            .push((phone.to_string(), message.to_string()));
        Ok(())
    }
}
