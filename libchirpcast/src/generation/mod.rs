//! Post generation with a text model
//!
//! The generator turns an [`AgentContext`](crate::types::AgentContext) into a
//! post: it renders the tweet prompt, asks the small model tier for a single
//! JSON object, validates it, and bounds its length. Model access goes through
//! the [`ModelClient`] trait so the pipeline can run against any
//! OpenAI-compatible endpoint or a scripted mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub mod composer;
pub mod openai;
pub mod template;
pub mod truncate;

// Mock client is available for all builds to support integration tests
pub mod mock;

pub use composer::{compose_tweet, parse_json_object};
pub use truncate::truncate_to_complete_sentence;

/// Size/cost tier of the model used for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Small,
    Medium,
    Large,
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelTier::Small => write!(f, "small"),
            ModelTier::Medium => write!(f, "medium"),
            ModelTier::Large => write!(f, "large"),
        }
    }
}

/// A single structured-output completion request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fully rendered prompt
    pub prompt: String,
    pub tier: ModelTier,
    /// JSON schema the output object must satisfy
    pub schema: Value,
    /// Stop sequences
    pub stop: Vec<String>,
}

/// Raw completion returned by a model provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    /// Model that actually served the request
    pub model: String,
}

/// Model provider client
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one completion and return the raw text of the first choice
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Provider` for transport failures, non-success
    /// statuses, or responses without a choice.
    async fn complete(&self, request: GenerationRequest) -> Result<Completion>;

    /// Provider name reported with successful posts (e.g. "openai")
    fn provider_name(&self) -> &str;
}
