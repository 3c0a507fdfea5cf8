//! Web-client protocol implementation of [`TwitterClient`]
//!
//! Logs in the way the browser client does: a guest token is activated, then
//! the onboarding flow is driven one subtask at a time until the platform
//! reports success. The session lives in the cookie jar; the `ct0` cookie
//! doubles as the CSRF token for every later request. Tweets are published
//! through the `CreateTweet` and `CreateNoteTweet` GraphQL mutations.

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::totp::current_totp;
use super::TwitterClient;
use crate::config::{Credentials, HttpConfig};
use crate::error::{PlatformError, Result};
use crate::logging::sanitize_for_logging;

/// Public bearer token embedded in the web client
const WEB_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

const CREATE_TWEET_PATH: &str = "/graphql/a1p9RWpkYKBjWv_I3WzS-A/CreateTweet";
const CREATE_NOTE_TWEET_PATH: &str = "/graphql/0aWhJJmFlxkxv9TAUJPanA/CreateNoteTweet";

/// Upper bound on onboarding round trips before the flow is abandoned
const MAX_LOGIN_STEPS: usize = 20;

/// Base URLs the client talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperEndpoints {
    /// REST API base (guest activation, onboarding, credential check)
    pub api_base: String,
    /// GraphQL API base (tweet mutations)
    pub graphql_base: String,
}

impl Default for ScraperEndpoints {
    fn default() -> Self {
        Self {
            api_base: "https://api.twitter.com".to_string(),
            graphql_base: "https://twitter.com/i/api".to_string(),
        }
    }
}

impl ScraperEndpoints {
    /// Serve every endpoint from one base URL (used against local test servers)
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            api_base: base.clone(),
            graphql_base: base,
        }
    }
}

/// Where the onboarding flow currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
struct FlowStep {
    flow_token: String,
    subtask: Option<String>,
}

/// Twitter client speaking the browser client's protocol
pub struct ScraperClient {
    client: Client,
    cookies: Arc<Jar>,
    endpoints: ScraperEndpoints,
    guest_token: Option<String>,
}

impl ScraperClient {
    /// Create a client for the public endpoints
    pub fn new(http: &HttpConfig) -> Result<Self> {
        Self::with_endpoints(http, ScraperEndpoints::default())
    }

    pub fn with_endpoints(http: &HttpConfig, endpoints: ScraperEndpoints) -> Result<Self> {
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(cookies.clone())
            .connect_timeout(http.connect_timeout())
            .timeout(http.request_timeout())
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            cookies,
            endpoints,
            guest_token: None,
        })
    }

    fn url(base: &str, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", base, path))
            .map_err(|e| PlatformError::Protocol(format!("Invalid endpoint URL: {}", e)).into())
    }

    fn cookie(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.cookies.cookies(url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    /// Request with the headers the web client always sends
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url.clone())
            .bearer_auth(WEB_BEARER_TOKEN)
            .header("x-twitter-active-user", "yes")
            .header("x-twitter-client-language", "en");

        if let Some(csrf) = self.cookie(&url, "ct0") {
            builder = builder.header("x-csrf-token", csrf);
        }

        if self.cookie(&url, "auth_token").is_some() {
            builder = builder.header("x-twitter-auth-type", "OAuth2Session");
        } else if let Some(guest) = &self.guest_token {
            builder = builder.header("x-guest-token", guest);
        }

        builder
    }

    async fn read_json(response: Response, operation: &str) -> Result<Value> {
        let status = response.status();
        let text = response.text().await.map_err(PlatformError::from)?;
        serde_json::from_str(&text).map_err(|_| {
            PlatformError::Protocol(format!(
                "{} returned a non-JSON body (status {}): {}",
                operation,
                status,
                sanitize_for_logging(&text, 200)
            ))
            .into()
        })
    }

    async fn activate_guest(&self) -> Result<String> {
        let url = Self::url(&self.endpoints.api_base, "/1.1/guest/activate.json")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(WEB_BEARER_TOKEN)
            .send()
            .await
            .map_err(PlatformError::from)?;

        if !response.status().is_success() {
            return Err(PlatformError::Authentication(format!(
                "Guest token activation failed with status {}",
                response.status()
            ))
            .into());
        }

        let body = Self::read_json(response, "guest activation").await?;
        body.get("guest_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                PlatformError::Protocol("Guest activation response has no guest_token".to_string())
                    .into()
            })
    }

    async fn start_login_flow(&self) -> Result<FlowStep> {
        let mut url = Self::url(&self.endpoints.api_base, "/1.1/onboarding/task.json")?;
        url.query_pairs_mut().append_pair("flow_name", "login");

        let body = json!({
            "flow_name": "login",
            "input_flow_data": {
                "flow_context": {
                    "debug_overrides": {},
                    "start_location": { "location": "splash_screen" }
                }
            }
        });

        let response = self
            .request(Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(PlatformError::from)?;
        parse_flow_response(&Self::read_json(response, "login flow").await?)
    }

    async fn execute_flow(&self, flow_token: &str, inputs: Vec<Value>) -> Result<FlowStep> {
        let url = Self::url(&self.endpoints.api_base, "/1.1/onboarding/task.json")?;
        let body = json!({
            "flow_token": flow_token,
            "subtask_inputs": inputs,
        });

        let response = self
            .request(Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(PlatformError::from)?;
        parse_flow_response(&Self::read_json(response, "login flow").await?)
    }

    async fn graphql(&self, path: &str, variables: Value, operation: &str) -> Result<Value> {
        let url = Self::url(&self.endpoints.graphql_base, path)?;
        let body = json!({
            "variables": variables,
            "features": tweet_features(),
            "fieldToggles": {}
        });

        let response = self
            .request(Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(PlatformError::from)?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned status {}", operation, status);
        }
        Self::read_json(response, operation).await
    }
}

/// Answer for one onboarding subtask, or `None` when the subtask only needs
/// an empty acknowledgement
fn subtask_input(subtask: &str, credentials: &Credentials) -> Result<Option<Value>> {
    let input = match subtask {
        "LoginJsInstrumentationSubtask" => json!({
            "subtask_id": subtask,
            "js_instrumentation": { "response": "{}", "link": "next_link" }
        }),
        "LoginEnterUserIdentifierSSO" => {
            let username = credentials.username.as_deref().ok_or_else(|| {
                PlatformError::Authentication("Login flow asked for a username".to_string())
            })?;
            json!({
                "subtask_id": subtask,
                "settings_list": {
                    "setting_responses": [{
                        "key": "user_identifier",
                        "response_data": { "text_data": { "result": username } }
                    }],
                    "link": "next_link"
                }
            })
        }
        "LoginEnterPassword" => {
            let password = credentials.password.as_ref().ok_or_else(|| {
                PlatformError::Authentication("Login flow asked for a password".to_string())
            })?;
            json!({
                "subtask_id": subtask,
                "enter_password": { "password": password.expose_secret(), "link": "next_link" }
            })
        }
        "AccountDuplicationCheck" => json!({
            "subtask_id": subtask,
            "check_logged_in_account": { "link": "AccountDuplicationCheck_false" }
        }),
        "LoginTwoFactorAuthChallenge" => {
            let secret = credentials.two_factor_secret.as_ref().ok_or_else(|| {
                PlatformError::Authentication(
                    "Two-factor authentication required but no secret is configured".to_string(),
                )
            })?;
            let code = current_totp(secret.expose_secret())?;
            json!({
                "subtask_id": subtask,
                "enter_text": { "text": code, "link": "next_link" }
            })
        }
        "LoginAcid" | "LoginEnterAlternateIdentifierSubtask" => {
            let email = credentials.email.as_deref().ok_or_else(|| {
                PlatformError::Authentication(
                    "Login flow asked for the account email but none is configured".to_string(),
                )
            })?;
            json!({
                "subtask_id": subtask,
                "enter_text": { "text": email, "link": "next_link" }
            })
        }
        "LoginSuccessSubtask" => return Ok(None),
        "DenyLoginSubtask" => {
            let message = "Login denied by the platform".to_string();
            return Err(PlatformError::Authentication(message).into());
        }
        other => {
            return Err(
                PlatformError::Protocol(format!("Unsupported login subtask: {}", other)).into(),
            )
        }
    };
    Ok(Some(input))
}

fn parse_flow_response(body: &Value) -> Result<FlowStep> {
    if let Some(first) = body
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let code = first.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(PlatformError::Authentication(format!(
            "Login flow rejected ({}): {}",
            code, message
        ))
        .into());
    }

    let flow_token = body
        .get("flow_token")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            PlatformError::Protocol("Login flow response has no flow_token".to_string())
        })?
        .to_string();

    let subtask = body
        .get("subtasks")
        .and_then(Value::as_array)
        .and_then(|subtasks| subtasks.first())
        .and_then(|subtask| subtask.get("subtask_id"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(FlowStep {
        flow_token,
        subtask,
    })
}

fn tweet_features() -> Value {
    json!({
        "interactive_text_enabled": true,
        "longform_notetweets_inline_media_enabled": false,
        "responsive_web_text_conversations_enabled": false,
        "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": false,
        "vibe_api_enabled": false,
        "rweb_lists_timeline_redesign_enabled": true,
        "responsive_web_graphql_exclude_directive_enabled": true,
        "verified_phone_label_enabled": false,
        "creator_subscriptions_tweet_preview_api_enabled": true,
        "responsive_web_graphql_timeline_navigation_enabled": true,
        "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
        "tweetypie_unmention_optimization_enabled": true,
        "responsive_web_edit_tweet_api_enabled": true,
        "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
        "view_counts_everywhere_api_enabled": true,
        "longform_notetweets_consumption_enabled": true,
        "longform_notetweets_rich_text_read_enabled": true,
        "tweet_awards_web_tipping_enabled": false,
        "freedom_of_speech_not_reach_fetch_enabled": true,
        "standardized_nudges_misinfo": true,
        "responsive_web_enhance_cards_enabled": false,
        "premium_content_api_read_enabled": false,
        "communities_web_enable_tweet_community_results_fetch": true,
        "c9s_tweet_anatomy_moderator_badge_enabled": true,
        "articles_preview_enabled": true
    })
}

#[async_trait]
impl TwitterClient for ScraperClient {
    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        if credentials.username.is_none() || credentials.password.is_none() {
            return Err(PlatformError::Authentication(
                "Username and password are required to log in".to_string(),
            )
            .into());
        }

        self.guest_token = Some(self.activate_guest().await?);
        debug!("Guest token activated");

        let mut step = self.start_login_flow().await?;
        let mut rounds = 0;
        while let Some(subtask) = step.subtask.take() {
            rounds += 1;
            if rounds > MAX_LOGIN_STEPS {
                return Err(PlatformError::Protocol(format!(
                    "Login flow did not finish after {} steps",
                    MAX_LOGIN_STEPS
                ))
                .into());
            }

            debug!("Answering login subtask {}", subtask);
            let inputs = subtask_input(&subtask, credentials)?
                .into_iter()
                .collect::<Vec<_>>();
            step = self.execute_flow(&step.flow_token, inputs).await?;
        }

        info!("Login flow completed");
        Ok(())
    }

    async fn is_logged_in(&self) -> Result<bool> {
        let url = Self::url(&self.endpoints.api_base, "/1.1/account/verify_credentials.json")?;
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(PlatformError::from)?;

        if !response.status().is_success() {
            debug!("Credential check returned status {}", response.status());
            return Ok(false);
        }

        let body = Self::read_json(response, "credential check").await?;
        Ok(body.get("errors").is_none())
    }

    async fn send_tweet(&self, text: &str) -> Result<Value> {
        let variables = json!({
            "tweet_text": text,
            "dark_request": false,
            "media": { "media_entities": [], "possibly_sensitive": false },
            "semantic_annotation_ids": []
        });
        self.graphql(CREATE_TWEET_PATH, variables, "CreateTweet").await
    }

    async fn send_note_tweet(&self, text: &str) -> Result<Value> {
        let variables = json!({
            "tweet_text": text,
            "dark_request": false,
            "media": { "media_entities": [], "possibly_sensitive": false },
            "semantic_annotation_ids": [],
            "richtext_options": { "richtext_tags": [] }
        });
        self.graphql(CREATE_NOTE_TWEET_PATH, variables, "CreateNoteTweet").await
    }
}
