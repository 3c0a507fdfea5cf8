//! Mock model client for testing
//!
//! Replays scripted completions and records every request it receives, so
//! tests can check both what the generator asked for and how it handled the
//! answer without a model provider.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{Completion, GenerationRequest, ModelClient};
use crate::error::{GenerationError, Result};

/// Scripted reply for a single completion
#[derive(Debug, Clone)]
pub enum MockReply {
    Content(String),
    Error(String),
}

/// Mock model client
#[derive(Debug, Clone)]
pub struct MockModelClient {
    provider: String,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    /// Reply used once the script runs out
    fallback: MockReply,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockModelClient {
    /// Create a client that answers every request with `content`
    pub fn replying(content: &str) -> Self {
        Self::scripted(Vec::new(), MockReply::Content(content.to_string()))
    }

    /// Create a client whose every request fails with a provider error
    pub fn failing(message: &str) -> Self {
        Self::scripted(Vec::new(), MockReply::Error(message.to_string()))
    }

    /// Create a client that plays `replies` in order, then `fallback`
    pub fn scripted(replies: Vec<MockReply>, fallback: MockReply) -> Self {
        Self {
            provider: "mock".to_string(),
            replies: Arc::new(Mutex::new(replies.into())),
            fallback,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = provider.to_string();
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(&self, request: GenerationRequest) -> Result<Completion> {
        self.requests.lock().unwrap().push(request);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            MockReply::Content(content) => Ok(Completion {
                content,
                model: format!("{}-small", self.provider),
            }),
            MockReply::Error(message) => Err(GenerationError::Provider(message).into()),
        }
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }
}
