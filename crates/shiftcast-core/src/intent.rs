// Inbound message intent classification
//
// The classifier is an external collaborator in production (an NLU service);
// the trait keeps the routing layer independent of how classification
// happens. KeywordClassifier is the shipped heuristic implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Classified meaning of an inbound reply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MessageIntent {
    Accept,
    Decline,
    Unknown,
}

impl std::fmt::Display for MessageIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageIntent::Accept => write!(f, "accept"),
            MessageIntent::Decline => write!(f, "decline"),
            MessageIntent::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classifies the free text of an inbound reply into an intent.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, body: &str) -> MessageIntent;
}

/// Keyword-based classifier. Matches common accept/decline phrasings on the
/// first word of the normalized message body.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, body: &str) -> MessageIntent {
        let normalized = body.trim().to_lowercase();
        let first_word = normalized
            .split_whitespace()
            .next()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .unwrap_or("");

        match first_word {
            "yes" | "y" | "accept" | "ok" | "sure" | "confirm" => MessageIntent::Accept,
            "no" | "n" | "decline" | "pass" | "cant" | "cannot" => MessageIntent::Decline,
            _ => MessageIntent::Unknown,
        }
    }
}
