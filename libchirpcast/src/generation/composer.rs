//! Tweet composition
//!
//! Renders the tweet prompt, runs one small-tier completion and turns the
//! output into a bounded post. Output that does not match the
//! `{ "text": <non-empty string> }` contract is logged and dropped; there is
//! no retry and no attempt to repair it.

use serde_json::Value;
use tracing::{debug, error, warn};

use super::template::{compose_context, TWEET_TEMPLATE};
use super::truncate::truncate_to_complete_sentence;
use super::{GenerationRequest, ModelClient, ModelTier};
use crate::error::{GenerationError, Result};
use crate::logging::sanitize_for_logging;
use crate::types::{AgentContext, GeneratedContent};

/// Compose a post for `context`
///
/// Returns `Ok(None)` when the model output fails validation or is blank
/// after trimming. When `max_post_length` is set the post is cut back to the
/// last complete sentence that fits.
///
/// # Errors
///
/// Model invocation errors are logged and returned unchanged; the caller
/// decides how to report them.
pub async fn compose_tweet(
    model: &dyn ModelClient,
    context: &AgentContext,
    max_post_length: Option<usize>,
) -> Result<Option<String>> {
    let prompt = compose_context(TWEET_TEMPLATE, &context.template_values());
    debug!("Composed tweet prompt ({} chars)", prompt.chars().count());

    let request = GenerationRequest {
        prompt,
        tier: ModelTier::Small,
        schema: GeneratedContent::json_schema(),
        stop: vec!["\n".to_string()],
    };

    let completion = model.complete(request).await.map_err(|e| {
        error!("Error composing tweet: {}", e);
        e
    })?;
    debug!(
        "Completion served by {} ({} chars)",
        completion.model,
        completion.content.chars().count()
    );

    let content = match parse_json_object(&completion.content)
        .as_ref()
        .and_then(GeneratedContent::from_value)
    {
        Some(content) => content,
        None => {
            let rejected = GenerationError::Validation(format!(
                "expected an object with a non-empty string field named text, got: {}",
                sanitize_for_logging(&completion.content, 200)
            ));
            error!("Invalid tweet content: {}", rejected);
            return Ok(None);
        }
    };

    let trimmed = content.text.trim();
    if trimmed.is_empty() {
        warn!("Generated tweet is blank after trimming");
        return Ok(None);
    }

    let post = match max_post_length {
        Some(max) => truncate_to_complete_sentence(trimmed, max),
        None => trimmed.to_string(),
    };

    if post.is_empty() {
        warn!("Generated tweet is empty after truncation");
        return Ok(None);
    }

    Ok(Some(post))
}

/// Parse a model completion into a JSON object
///
/// Accepts a bare object, an object wrapped in a Markdown code fence, or an
/// object embedded in surrounding prose. Anything that is not an object
/// yields `None`.
pub fn parse_json_object(raw: &str) -> Option<Value> {
    let trimmed = strip_code_fence(raw.trim());

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return value.is_object().then_some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&trimmed[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
