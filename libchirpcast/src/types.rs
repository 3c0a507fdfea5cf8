//! Core types for Chirpcast

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Conversational state a post is composed from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentContext {
    /// Name the agent posts as
    pub agent_name: String,
    /// Recent conversation, already formatted for the prompt
    pub recent_messages: String,
    /// Topics the agent talks about
    pub topics: Vec<String>,
    /// Persona and style directives for posts
    pub post_directions: String,
    /// Recent interactions between the agent and other users
    pub recent_post_interactions: String,
    /// Additional template values
    pub extra: HashMap<String, String>,
}

impl AgentContext {
    pub fn new(agent_name: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            ..Default::default()
        }
    }

    /// Template values keyed by placeholder name
    ///
    /// Built-in fields win over `extra` entries with the same name.
    pub fn template_values(&self) -> HashMap<String, String> {
        let mut values = self.extra.clone();
        values.insert("agentName".to_string(), self.agent_name.clone());
        values.insert("recentMessages".to_string(), self.recent_messages.clone());
        values.insert("topics".to_string(), self.topics.join(", "));
        values.insert("postDirections".to_string(), self.post_directions.clone());
        values.insert(
            "recentPostInteractions".to_string(),
            self.recent_post_interactions.clone(),
        );
        values
    }
}

/// Validated model output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub text: String,
}

impl GeneratedContent {
    /// Accept only an object whose `text` field is a non-empty string
    ///
    /// Nothing is coerced: numbers, arrays and missing fields are rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = value.as_object()?.get("text")?.as_str()?;
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
        })
    }

    /// JSON schema handed to the model provider
    pub fn json_schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text of the tweet"
                }
            },
            "required": ["text"],
            "additionalProperties": false
        })
    }
}

/// Identity of a published post, as far as the response revealed it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub id: Option<String>,
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
}

/// Payload reported to the caller of the post action
///
/// Every failure, dry-run and no-content path reports [`PostOutcome::none`],
/// with all four fields null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOutcome {
    pub text: Option<String>,
    pub model: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
}

impl PostOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn posted(text: &str, model: &str, result: PublishResult) -> Self {
        Self {
            text: Some(text.to_string()),
            model: Some(model.to_string()),
            id: result.id,
            user_name: result.user_name,
        }
    }

    pub fn is_posted(&self) -> bool {
        self.text.is_some()
    }

    /// Status URL, when both the id and the screen name are known
    pub fn url(&self) -> Option<String> {
        match (&self.user_name, &self.id) {
            (Some(user), Some(id)) => Some(format!("https://x.com/{}/status/{}", user, id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_content_accepts_text_object() {
        let content = GeneratedContent::from_value(&json!({"text": "hello"})).unwrap();
        assert_eq!(content.text, "hello");

        let with_extra = GeneratedContent::from_value(&json!({"text": "hi", "action": "NONE"}));
        assert!(with_extra.is_some());
    }

    #[test]
    fn test_generated_content_rejects_without_coercion() {
        for value in [
            json!({}),
            json!({"text": 42}),
            json!({"text": ["a"]}),
            json!({"text": null}),
            json!({"text": ""}),
            json!({"tweet": "hello"}),
            json!("hello"),
            json!(["hello"]),
        ] {
            assert!(
                GeneratedContent::from_value(&value).is_none(),
                "{} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_template_values() {
        let mut context = AgentContext::new("agent");
        context.topics = vec!["rust".to_string(), "compilers".to_string()];
        context
            .extra
            .insert("agentName".to_string(), "impostor".to_string());
        context.extra.insert("mood".to_string(), "cheerful".to_string());

        let values = context.template_values();
        assert_eq!(values["agentName"], "agent");
        assert_eq!(values["topics"], "rust, compilers");
        assert_eq!(values["mood"], "cheerful");
    }

    #[test]
    fn test_outcome_serialization_shape() {
        let none = serde_json::to_value(PostOutcome::none()).unwrap();
        assert_eq!(
            none,
            json!({"text": null, "model": null, "id": null, "userName": null})
        );

        let posted = PostOutcome::posted(
            "Shipping v2 today!",
            "openai",
            PublishResult {
                id: Some("123".to_string()),
                user_name: Some("agent".to_string()),
            },
        );
        assert!(posted.is_posted());
        assert_eq!(
            serde_json::to_value(&posted).unwrap(),
            json!({
                "text": "Shipping v2 today!",
                "model": "openai",
                "id": "123",
                "userName": "agent"
            })
        );
        assert_eq!(posted.url().as_deref(), Some("https://x.com/agent/status/123"));
    }

    #[test]
    fn test_outcome_url_requires_both_fields() {
        let outcome = PostOutcome::posted(
            "hi",
            "openai",
            PublishResult {
                id: Some("1".to_string()),
                user_name: None,
            },
        );
        assert!(outcome.url().is_none());
    }

    #[test]
    fn test_agent_context_from_partial_json() {
        let context: AgentContext =
            serde_json::from_value(json!({"agent_name": "agent", "topics": ["rust"]})).unwrap();
        assert_eq!(context.agent_name, "agent");
        assert!(context.recent_messages.is_empty());
    }
}
