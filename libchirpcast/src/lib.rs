//! Chirpcast - compose a tweet with a language model and publish it
//!
//! The pipeline is: render a prompt from an [`AgentContext`], ask a model for
//! a `{ "text": ... }` object, bound its length, log in to Twitter (or reuse a
//! client the caller holds) and publish. [`PostAction`] runs the whole thing
//! and reports a single [`PostOutcome`].

pub mod action;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod publisher;
pub mod session;
pub mod twitter;
pub mod types;

// Re-export commonly used types
pub use action::PostAction;
pub use config::{Config, Credentials, Settings};
pub use error::{ChirpcastError, Result};
pub use session::SessionProvider;
pub use types::{AgentContext, GeneratedContent, PostOutcome, PublishResult};
