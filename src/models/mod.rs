use serde::{Deserialize, Deserializer, Serialize};

pub mod chat_request;
pub mod chat_response;

pub use chat_request::ChatRequest;
pub use chat_response::ChatResponse;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Message {
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn user(content: &str) -> Self {
        Message {
            role: "user".to_string(),
            content: content.to_string(),
            name: None,
        }
    }
}

/// API-level error carried inside an otherwise well-formed response body.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ApiError {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub param: serde_json::Value,
    #[serde(default)]
    pub code: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Choice {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub index: u64,
}

// Missing and `null` both decode to the zero value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
