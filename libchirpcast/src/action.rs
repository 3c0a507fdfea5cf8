//! The post action: compose, then publish
//!
//! [`PostAction`] ties the generator, the session provider and the publisher
//! together. Each invocation reports exactly one [`PostOutcome`] to the
//! caller's callback and returns whether the invocation succeeded.

use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{Config, Settings};
use crate::error::Result;
use crate::generation::openai::OpenAIClient;
use crate::generation::{compose_tweet, ModelClient};
use crate::logging::sanitize_for_logging;
use crate::publisher::publish_with_provider;
use crate::session::SessionProvider;
use crate::twitter::TwitterClient;
use crate::types::{AgentContext, PostOutcome};

/// Compose-and-publish action
pub struct PostAction {
    model: Arc<dyn ModelClient>,
    sessions: SessionProvider,
    settings: Settings,
    existing_client: Option<Arc<dyn TwitterClient>>,
}

impl PostAction {
    pub const NAME: &'static str = "POST_TWEET";
    pub const SIMILES: &'static [&'static str] = &["TWEET", "POST", "SEND_TWEET"];
    pub const DESCRIPTION: &'static str = "Post a tweet to Twitter";

    pub fn new(model: Arc<dyn ModelClient>, sessions: SessionProvider, settings: Settings) -> Self {
        Self {
            model,
            sessions,
            settings,
            existing_client: None,
        }
    }

    /// Build the production action: OpenAI-compatible model, web-protocol
    /// Twitter client, settings resolved from `config` and the environment
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = Settings::resolve(config)?;
        let api_key = config
            .generation
            .resolve_api_key(|key| std::env::var(key).ok());
        let model = OpenAIClient::new(&config.generation, api_key, &config.http)?;

        Ok(Self::new(
            Arc::new(model),
            SessionProvider::scraper(config.http.clone()),
            settings,
        ))
    }

    /// Publish through an already-authenticated client instead of logging in
    pub fn with_existing_client(mut self, client: Arc<dyn TwitterClient>) -> Self {
        self.existing_client = Some(client);
        self
    }

    /// Force dry-run mode regardless of configuration
    pub fn dry_run(mut self) -> Self {
        self.settings.dry_run = true;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether the settings carry username, password and email
    pub fn validate(settings: &Settings) -> bool {
        let valid = settings.credentials.is_complete();
        if valid {
            info!("Twitter credentials present");
        } else {
            warn!("Twitter credentials incomplete: username, password and email are required");
        }
        valid
    }

    /// Compose a post for `context` and publish it
    ///
    /// `callback` receives the posted text, the provider name, the tweet id
    /// and the screen name on success, and [`PostOutcome::none`] on every
    /// other path. In dry-run mode nothing is sent and the call succeeds.
    pub async fn handle<F>(&self, context: &AgentContext, callback: F) -> bool
    where
        F: FnOnce(PostOutcome) + Send,
    {
        let span = info_span!("post_tweet", run_id = %Uuid::new_v4());
        let (outcome, succeeded) = self.run(context).instrument(span).await;
        callback(outcome);
        succeeded
    }

    async fn run(&self, context: &AgentContext) -> (PostOutcome, bool) {
        let content =
            match compose_tweet(self.model.as_ref(), context, self.settings.max_post_length).await
            {
                Ok(Some(content)) => content,
                Ok(None) => {
                    warn!("No content generated");
                    return (PostOutcome::none(), false);
                }
                Err(e) => {
                    error!(kind = e.kind(), "Tweet generation failed: {}", e);
                    return (PostOutcome::none(), false);
                }
            };

        if self.settings.dry_run {
            info!(
                "Dry run: would have posted tweet: {}",
                sanitize_for_logging(&content, 500)
            );
            return (PostOutcome::none(), true);
        }

        let result = publish_with_provider(
            &self.sessions,
            self.existing_client.as_deref(),
            &self.settings.credentials,
            &content,
        )
        .await;

        match result {
            Some(result) => {
                let outcome = PostOutcome::posted(&content, self.model.provider_name(), result);
                info!(
                    "Successfully posted tweet{}",
                    outcome
                        .url()
                        .map(|url| format!(": {}", url))
                        .unwrap_or_default()
                );
                (outcome, true)
            }
            None => {
                warn!("Tweet was not posted");
                (PostOutcome::none(), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::generation::mock::MockModelClient;
    use crate::twitter::mock::MockTwitterClient;
    use std::sync::Mutex;

    fn action(
        model: MockModelClient,
        twitter: &MockTwitterClient,
        settings: Settings,
    ) -> PostAction {
        let twitter = twitter.clone();
        PostAction::new(
            Arc::new(model),
            SessionProvider::new(move || Ok(Box::new(twitter.clone()) as Box<dyn TwitterClient>)),
            settings,
        )
    }

    fn settings() -> Settings {
        Settings {
            credentials: Credentials::new("agent", "pw").with_email("agent@example.com"),
            ..Default::default()
        }
    }

    async fn run(action: &PostAction) -> (bool, Vec<PostOutcome>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let ok = action
            .handle(&AgentContext::new("agent"), move |outcome| {
                sink.lock().unwrap().push(outcome)
            })
            .await;
        let outcomes = seen.lock().unwrap().clone();
        (ok, outcomes)
    }

    #[test]
    fn test_metadata() {
        assert_eq!(PostAction::NAME, "POST_TWEET");
        assert_eq!(PostAction::SIMILES, &["TWEET", "POST", "SEND_TWEET"]);
        assert_eq!(PostAction::DESCRIPTION, "Post a tweet to Twitter");
    }

    #[test]
    fn test_validate_requires_email() {
        assert!(PostAction::validate(&settings()));

        let without_email = Settings {
            credentials: Credentials::new("agent", "pw"),
            ..Default::default()
        };
        assert!(!PostAction::validate(&without_email));
        assert!(!PostAction::validate(&Settings::default()));

        let empty = Settings {
            credentials: Credentials::new("", "").with_email(""),
            ..Default::default()
        };
        assert!(!PostAction::validate(&empty));

        let blank_email = Settings {
            credentials: Credentials::new("agent", "pw").with_email(""),
            ..Default::default()
        };
        assert!(!PostAction::validate(&blank_email));
    }

    #[tokio::test]
    async fn test_success_reports_provider_and_ids() {
        let twitter = MockTwitterClient::success("123", "agent");
        let model = MockModelClient::replying(r#"{"text": "Shipping v2 today!"}"#);
        let (ok, outcomes) = run(&action(model, &twitter, settings())).await;

        assert!(ok);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].text.as_deref(), Some("Shipping v2 today!"));
        assert_eq!(outcomes[0].model.as_deref(), Some("mock"));
        assert_eq!(outcomes[0].id.as_deref(), Some("123"));
        assert_eq!(outcomes[0].user_name.as_deref(), Some("agent"));
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let twitter = MockTwitterClient::success("123", "agent");
        let model = MockModelClient::replying(r#"{"text": "Shipping v2 today!"}"#);
        let dry = Settings {
            dry_run: true,
            ..settings()
        };
        let (ok, outcomes) = run(&action(model, &twitter, dry)).await;

        assert!(ok);
        assert_eq!(outcomes, vec![PostOutcome::none()]);
        assert_eq!(twitter.send_count(), 0);
        assert!(twitter.login_calls().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_reports_sentinel() {
        let twitter = MockTwitterClient::success("123", "agent");
        for model in [
            MockModelClient::failing("model offline"),
            MockModelClient::replying(r#"{"tweet": "wrong field"}"#),
        ] {
            let (ok, outcomes) = run(&action(model, &twitter, settings())).await;
            assert!(!ok);
            assert_eq!(outcomes, vec![PostOutcome::none()]);
        }
        assert_eq!(twitter.send_count(), 0);
    }

    #[tokio::test]
    async fn test_existing_client_skips_login() {
        let twitter = MockTwitterClient::success("7", "agent");
        let existing = MockTwitterClient::success("8", "other").logged_in();
        let model = MockModelClient::replying(r#"{"text": "hello"}"#);
        let action = action(model, &twitter, Settings::default())
            .with_existing_client(Arc::new(existing.clone()));

        let (ok, outcomes) = run(&action).await;
        assert!(ok);
        assert_eq!(outcomes[0].id.as_deref(), Some("8"));
        assert!(twitter.login_calls().is_empty());
        assert_eq!(existing.sent_tweets(), vec!["hello"]);
    }
}
