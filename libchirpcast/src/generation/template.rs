//! Prompt templates
//!
//! Templates use `{{name}}` placeholders. Placeholders without a value render
//! as an empty string.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Length the model is asked to stay under. This is a style target; the
/// structural platform limit is enforced by the publisher.
pub const GENERATION_CHAR_TARGET: usize = 180;

pub const TWEET_TEMPLATE: &str = r#"
# Context
{{recentMessages}}

# Topics
{{topics}}

# Post Directions
{{postDirections}}

# Recent interactions between {{agentName}} and other users:
{{recentPostInteractions}}

# Task
Generate a tweet that:
1. Relates to the recent conversation or requested topic
2. Matches the character's style and voice
3. Is concise and engaging
4. Must be UNDER 180 characters (this is a strict requirement)
5. Speaks from the perspective of {{agentName}}

Generate only the tweet text, no other commentary.

Return the tweet as a single JSON object on one line with exactly one field, like: {"text": "your tweet here"}"#;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Render `template`, replacing each `{{name}}` with `values[name]`
pub fn compose_context(template: &str, values: &HashMap<String, String>) -> String {
    placeholder()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}
