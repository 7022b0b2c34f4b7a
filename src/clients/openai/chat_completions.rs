use std::time::Duration;

use http::header;
use tracing::{debug, error};

use crate::error::ChatError;
use crate::models::{ChatRequest, ChatResponse};
use crate::repos::config::ChatConfig;

/// Round-trip timeout for one request, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ChatError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Sends one chat completion request and parses whatever body comes back.
///
/// The HTTP status is only logged. Providers report failures as an `error`
/// object in the body, which the caller inspects via
/// [`ChatResponse::api_error`].
pub async fn get_completion_message(
    client: &reqwest::Client,
    config: &ChatConfig,
    chat_request: &ChatRequest,
) -> Result<ChatResponse, ChatError> {
    let body = match serde_json::to_string(chat_request) {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to serialize chat request model: {}", e);
            return Err(ChatError::Request(format!(
                "failed to serialize chat request: {}",
                e
            )));
        }
    };

    let url = config.completions_url()?;
    debug!(
        "Sending request to LLM API: {} - {}\nbody:\n{}",
        config.model, url, body,
    );

    let response = client
        .post(url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", config.api_key))
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let response_text = response.text().await?;
    debug!("LLM API responded with {}: {}", status, response_text);

    ChatResponse::from_json(&response_text).map_err(|e| {
        error!(
            "Error parsing response JSON ({}): {}\nRaw response: {}",
            status, e, response_text
        );
        ChatError::Parse(e)
    })
}
