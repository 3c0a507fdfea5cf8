//! Twitter/X platform client abstraction
//!
//! The pipeline talks to the platform only through [`TwitterClient`]. The
//! production implementation is [`scraper::ScraperClient`], which drives the
//! web client's login flow and GraphQL mutations; [`mock::MockTwitterClient`]
//! scripts responses for tests.
//!
//! # Examples
//!
//! ```no_run
//! use libchirpcast::config::{Credentials, HttpConfig};
//! use libchirpcast::twitter::{scraper::ScraperClient, TwitterClient};
//!
//! # async fn example() -> libchirpcast::Result<()> {
//! let mut client = ScraperClient::new(&HttpConfig::default())?;
//! client
//!     .login(&Credentials::new("agent", "hunter2").with_email("agent@example.com"))
//!     .await?;
//!
//! if client.is_logged_in().await? {
//!     let body = client.send_tweet("Hello from Rust!").await?;
//!     println!("{}", body);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Credentials;
use crate::error::Result;

pub mod scraper;
pub mod totp;

// Mock client is available for all builds to support integration tests
pub mod mock;

/// Social platform client used by the publisher
///
/// Send methods return the parsed JSON body whatever the HTTP status was:
/// the platform reports most failures as an `errors` array in the body, and
/// interpreting it is the publisher's job.
#[async_trait]
pub trait TwitterClient: Send + Sync {
    /// Log in with username and password; email and the second-factor secret
    /// are used only if the login flow asks for them
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Authentication` when the platform rejects the
    /// credentials or asks for something that was not provided.
    async fn login(&mut self, credentials: &Credentials) -> Result<()>;

    /// Whether the client currently holds a valid session
    async fn is_logged_in(&self) -> Result<bool>;

    /// Publish a standard (short-form) tweet
    async fn send_tweet(&self, text: &str) -> Result<Value>;

    /// Publish a long-form note tweet
    async fn send_note_tweet(&self, text: &str) -> Result<Value>;
}
