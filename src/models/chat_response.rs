use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{null_as_default, ApiError, Choice};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<Choice>,
    /// Token accounting, kept as whatever the provider sends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ChatResponse {
    /// Parses a response body. Any object decodes, with missing or `null`
    /// fields left at their zero value; a bare `null` is an empty response.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Object(_) => serde_json::from_value(value),
            Value::Null => Ok(ChatResponse::default()),
            other => Err(serde_json::Error::invalid_type(
                unexpected(&other),
                &"a chat completion object",
            )),
        }
    }

    /// The provider's error, if the body reports one with a non-empty message.
    pub fn api_error(&self) -> Option<&ApiError> {
        self.error.as_ref().filter(|e| !e.message.is_empty())
    }

    /// Content of the first choice, or an empty string when there is none.
    pub fn reply(&self) -> String {
        self.choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
        Value::Null => Unexpected::Unit,
    }
}
