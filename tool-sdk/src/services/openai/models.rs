//! Azure OpenAI API data models
//!
//! Requests are strict. Responses are decoded leniently: the chat message
//! content is normalized into [`MessageContent`] at this boundary and every
//! other field falls back to a default when missing or oddly typed.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A chat message sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatCompletionRequest {
    /// Deployment name; used in the URL, not sent in the body
    #[serde(skip)]
    pub model: String,

    pub messages: Vec<ChatMessage>,

    /// Sampling temperature (0.0-2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// One typed piece of a multi-part message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPart {
    /// Part type as sent by the backend (`"text"`, `"image_url"`, ...)
    pub kind: Option<String>,

    /// Text of the part, if it has any
    pub text: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some("text".to_string()),
            text: Some(text.into()),
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self {
                kind: map.get("type").and_then(Value::as_str).map(str::to_string),
                text: map.get("text").and_then(Value::as_str).map(str::to_string),
            },
            _ => Self::default(),
        }
    }
}

/// Content of a completion message in any of the shapes the backend produces
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MessageContent {
    /// A plain string
    Text(String),

    /// A sequence of typed parts
    Parts(Vec<ContentPart>),

    /// Null, missing, or any unrecognized shape
    #[default]
    Empty,
}

impl MessageContent {
    /// Normalize a raw JSON value. Never fails.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => MessageContent::Text(s.clone()),
            Value::Array(items) => MessageContent::Parts(items.iter().map(ContentPart::from_value).collect()),
            _ => MessageContent::Empty,
        }
    }

    /// Flatten to plain text: text verbatim, parts concatenated in order
    /// with textless parts skipped, empty otherwise
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts.iter().filter_map(|p| p.text.as_deref()).collect(),
            MessageContent::Empty => String::new(),
        }
    }
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(MessageContent::from_value(&value))
    }
}

impl Serialize for MessageContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = match self {
            MessageContent::Text(s) => Value::String(s.clone()),
            MessageContent::Parts(parts) => Value::Array(
                parts
                    .iter()
                    .map(|p| {
                        let mut map = serde_json::Map::new();
                        if let Some(kind) = &p.kind {
                            map.insert("type".to_string(), Value::String(kind.clone()));
                        }
                        if let Some(text) = &p.text {
                            map.insert("text".to_string(), Value::String(text.clone()));
                        }
                        Value::Object(map)
                    })
                    .collect(),
            ),
            MessageContent::Empty => Value::Null,
        };
        value.serialize(serializer)
    }
}

/// A message in a chat completion response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub content: MessageContent,
}

/// A chat completion choice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionChoice {
    #[serde(default)]
    pub index: u32,

    #[serde(default)]
    pub message: Option<ChatCompletionMessage>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token counts for one call; zero when the backend omitted or mangled them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    /// Read counts from a raw `usage` object, degrading to zero per field
    pub fn from_value(usage: Option<&Value>) -> Self {
        let count = |key: &str| -> u64 {
            usage
                .and_then(|u| u.get(key))
                .and_then(|v| {
                    v.as_u64().or_else(|| {
                        v.as_f64()
                            .filter(|f| f.is_finite() && *f >= 0.0)
                            .map(|f| f as u64)
                    })
                })
                .unwrap_or(0)
        };

        Self {
            prompt_tokens: count("prompt_tokens"),
            completion_tokens: count("completion_tokens"),
        }
    }
}

/// Chat completion response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub created: u64,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub choices: Vec<ChatCompletionChoice>,

    /// Kept raw; see [`ChatCompletionResponse::token_usage`]
    #[serde(default)]
    pub usage: Option<Value>,
}

impl ChatCompletionResponse {
    /// Convenience constructor for a single-choice plain-text response
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![ChatCompletionChoice {
                message: Some(ChatCompletionMessage {
                    role: Some("assistant".to_string()),
                    content: MessageContent::Text(text.into()),
                }),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Content of the first choice, `Empty` if there is none
    pub fn first_content(&self) -> &MessageContent {
        static EMPTY: MessageContent = MessageContent::Empty;
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .map(|m| &m.content)
            .unwrap_or(&EMPTY)
    }

    pub fn token_usage(&self) -> TokenUsage {
        TokenUsage::from_value(self.usage.as_ref())
    }
}

/// Embedding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Deployment name; used in the URL, not sent in the body
    #[serde(skip)]
    pub model: String,

    /// Input text to embed
    pub input: Vec<String>,
}

/// A single embedding result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub embedding: Vec<f32>,

    #[serde(default)]
    pub index: u32,
}

/// Embedding response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<Embedding>,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub usage: Option<Value>,
}
