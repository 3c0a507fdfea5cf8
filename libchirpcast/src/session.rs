//! Authenticated platform sessions
//!
//! A [`SessionProvider`] hands the publisher a logged-in [`TwitterClient`].
//! A client the caller already holds is reused as-is; otherwise a fresh one
//! is built by the injected factory and logged in with the configured
//! credentials. There is no process-wide session: whoever owns the client
//! decides how long it lives.

use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Credentials, HttpConfig};
use crate::error::{ChirpcastError, PlatformError, Result};
use crate::twitter::scraper::ScraperClient;
use crate::twitter::TwitterClient;

/// Builds an unauthenticated client
pub type ClientFactory = dyn Fn() -> Result<Box<dyn TwitterClient>> + Send + Sync;

/// A client ready to publish
pub enum Session<'a> {
    /// Caller-supplied client, used without re-validation
    Reused(&'a dyn TwitterClient),
    /// Client created and logged in for this attempt
    Fresh(Box<dyn TwitterClient>),
}

impl Session<'_> {
    pub fn is_reused(&self) -> bool {
        matches!(self, Session::Reused(_))
    }
}

impl<'a> Deref for Session<'a> {
    type Target = dyn TwitterClient + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            Session::Reused(client) => *client,
            Session::Fresh(client) => client.as_ref(),
        }
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Reused(_) => f.write_str("Session::Reused"),
            Session::Fresh(_) => f.write_str("Session::Fresh"),
        }
    }
}

/// Source of authenticated sessions
#[derive(Clone)]
pub struct SessionProvider {
    factory: Arc<ClientFactory>,
}

impl SessionProvider {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn TwitterClient>> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Provider that logs in through the web client protocol
    pub fn scraper(http: HttpConfig) -> Self {
        Self::new(move || {
            let client = ScraperClient::new(&http)?;
            Ok(Box::new(client) as Box<dyn TwitterClient>)
        })
    }

    /// Return a session for publishing
    ///
    /// `existing` wins unconditionally when present. Otherwise username and
    /// password must both be set; email and the second-factor secret are
    /// passed through for the login flow to use if asked.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Authentication` when credentials are missing,
    /// the login call fails, or the post-login check reports no session.
    pub async fn get_session<'a>(
        &self,
        existing: Option<&'a dyn TwitterClient>,
        credentials: &Credentials,
    ) -> Result<Session<'a>> {
        if let Some(client) = existing {
            debug!("Reusing existing Twitter client");
            return Ok(Session::Reused(client));
        }

        if !credentials.has_login() {
            warn!("Twitter credentials not configured");
            return Err(PlatformError::Authentication(
                "Twitter credentials not configured (username and password are required)"
                    .to_string(),
            )
            .into());
        }

        let mut client = (self.factory)()?;

        client
            .login(credentials)
            .await
            .map_err(|e| as_authentication("Login failed", e))?;

        let logged_in = client
            .is_logged_in()
            .await
            .map_err(|e| as_authentication("Session check failed", e))?;

        if !logged_in {
            let message = "Failed to login to Twitter".to_string();
            return Err(PlatformError::Authentication(message).into());
        }

        info!(
            "Logged in to Twitter as {}",
            credentials.username.as_deref().unwrap_or_default()
        );
        Ok(Session::Fresh(client))
    }
}

/// Keep authentication errors as they are and recast everything else
fn as_authentication(context: &str, error: ChirpcastError) -> ChirpcastError {
    match error {
        ChirpcastError::Platform(PlatformError::Authentication(_)) => error,
        ChirpcastError::Platform(inner) => {
            PlatformError::Authentication(format!("{}: {}", context, inner)).into()
        }
        other => PlatformError::Authentication(format!("{}: {}", context, other)).into(),
    }
}
