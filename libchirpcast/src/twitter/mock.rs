//! Mock Twitter client for testing
//!
//! Scripts login outcomes and send responses, and records every call so
//! integration tests can verify session handling and the publish paths
//! without credentials or network access. Clones share their scripts and
//! records, which lets a client factory hand out fresh clients while the
//! test keeps a handle for assertions.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::TwitterClient;
use crate::config::Credentials;
use crate::error::{PlatformError, Result};

/// Scripted outcome of one send call
#[derive(Debug, Clone)]
pub enum MockSend {
    /// Delivered response body (which may itself carry an `errors` array)
    Body(Value),
    /// Raised error, surfaced as `PlatformError::Network`
    Error(String),
}

/// Configuration for mock client behavior
#[derive(Debug, Clone)]
pub struct MockTwitterConfig {
    /// Whether the login call succeeds
    pub login_succeeds: bool,

    /// Error message for a failed login
    pub login_error: Option<String>,

    /// What `is_logged_in` reports after a successful login
    pub logged_in_after_login: bool,

    /// Responses for `send_tweet`, consumed in order
    pub tweet_responses: Arc<Mutex<VecDeque<MockSend>>>,

    /// Response once `tweet_responses` runs out
    pub tweet_fallback: MockSend,

    /// Responses for `send_note_tweet`, consumed in order
    pub note_responses: Arc<Mutex<VecDeque<MockSend>>>,

    /// Response once `note_responses` runs out
    pub note_fallback: MockSend,

    /// Usernames passed to `login`
    pub login_calls: Arc<Mutex<Vec<Option<String>>>>,

    /// Texts passed to `send_tweet`
    pub sent_tweets: Arc<Mutex<Vec<String>>>,

    /// Texts passed to `send_note_tweet`
    pub sent_notes: Arc<Mutex<Vec<String>>>,
}

impl Default for MockTwitterConfig {
    fn default() -> Self {
        Self {
            login_succeeds: true,
            login_error: None,
            logged_in_after_login: true,
            tweet_responses: Arc::new(Mutex::new(VecDeque::new())),
            tweet_fallback: MockSend::Body(created_tweet_body("1", "mock")),
            note_responses: Arc::new(Mutex::new(VecDeque::new())),
            note_fallback: MockSend::Body(json!({ "data": {} })),
            login_calls: Arc::new(Mutex::new(Vec::new())),
            sent_tweets: Arc::new(Mutex::new(Vec::new())),
            sent_notes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock Twitter client
#[derive(Debug, Clone)]
pub struct MockTwitterClient {
    config: MockTwitterConfig,
    logged_in: bool,
}

impl MockTwitterClient {
    /// Create a logged-out client with the given configuration
    pub fn new(config: MockTwitterConfig) -> Self {
        Self {
            config,
            logged_in: false,
        }
    }

    /// Create a client whose logins succeed and whose tweets get `id` by `screen_name`
    pub fn success(id: &str, screen_name: &str) -> Self {
        Self::new(MockTwitterConfig {
            tweet_fallback: MockSend::Body(created_tweet_body(id, screen_name)),
            ..Default::default()
        })
    }

    /// Create a client whose login call is rejected
    pub fn login_failure(error: &str) -> Self {
        Self::new(MockTwitterConfig {
            login_succeeds: false,
            login_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Create a client whose login call succeeds but whose session check fails
    pub fn unverified() -> Self {
        Self::new(MockTwitterConfig {
            logged_in_after_login: false,
            ..Default::default()
        })
    }

    /// Mark the client as already holding a session
    pub fn logged_in(mut self) -> Self {
        self.logged_in = true;
        self
    }

    /// Queue a `send_tweet` response
    pub fn push_tweet_response(&self, response: MockSend) {
        self.config.tweet_responses.lock().unwrap().push_back(response);
    }

    /// Queue a `send_note_tweet` response
    pub fn push_note_response(&self, response: MockSend) {
        self.config.note_responses.lock().unwrap().push_back(response);
    }

    pub fn login_calls(&self) -> Vec<Option<String>> {
        self.config.login_calls.lock().unwrap().clone()
    }

    pub fn sent_tweets(&self) -> Vec<String> {
        self.config.sent_tweets.lock().unwrap().clone()
    }

    pub fn sent_notes(&self) -> Vec<String> {
        self.config.sent_notes.lock().unwrap().clone()
    }

    /// Total send calls of either kind
    pub fn send_count(&self) -> usize {
        self.sent_tweets().len() + self.sent_notes().len()
    }

    fn play(queue: &Mutex<VecDeque<MockSend>>, fallback: &MockSend) -> Result<Value> {
        let next = queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| fallback.clone());
        match next {
            MockSend::Body(body) => Ok(body),
            MockSend::Error(message) => Err(PlatformError::Network(message).into()),
        }
    }
}

/// `CreateTweet` success body carrying `id` and `screen_name`
pub fn created_tweet_body(id: &str, screen_name: &str) -> Value {
    json!({
        "data": {
            "create_tweet": {
                "tweet_results": {
                    "result": {
                        "rest_id": id,
                        "core": {
                            "user_results": {
                                "result": {
                                    "legacy": { "screen_name": screen_name }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Delivered response carrying a single platform error
pub fn error_body(code: i64, message: &str) -> Value {
    json!({ "errors": [{ "code": code, "message": message }] })
}

#[async_trait]
impl TwitterClient for MockTwitterClient {
    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.config
            .login_calls
            .lock()
            .unwrap()
            .push(credentials.username.clone());

        if !self.config.login_succeeds {
            let message = self
                .config
                .login_error
                .clone()
                .unwrap_or_else(|| "Mock login failed".to_string());
            return Err(PlatformError::Authentication(message).into());
        }

        self.logged_in = self.config.logged_in_after_login;
        Ok(())
    }

    async fn is_logged_in(&self) -> Result<bool> {
        Ok(self.logged_in)
    }

    async fn send_tweet(&self, text: &str) -> Result<Value> {
        self.config.sent_tweets.lock().unwrap().push(text.to_string());
        Self::play(&self.config.tweet_responses, &self.config.tweet_fallback)
    }

    async fn send_note_tweet(&self, text: &str) -> Result<Value> {
        self.config.sent_notes.lock().unwrap().push(text.to_string());
        Self::play(&self.config.note_responses, &self.config.note_fallback)
    }
}
