use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout_at, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::clients::openai::chat_completions::{
    build_http_client, get_completion_message, REQUEST_TIMEOUT,
};
use crate::error::ChatError;
use crate::models::{ChatRequest, ChatResponse};
use crate::repos::config::ConfigSource;

/// Linear backoff: attempt `n` waits `(n - 1) * backoff_step` first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff_step: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt.saturating_sub(1)
    }
}

enum Attempt {
    Success(ChatResponse),
    Retry(Failure),
}

enum Failure {
    /// Transport or parse failure; no usable body.
    Request(ChatError),
    /// Well-formed body carrying an `error.message`.
    Provider(ChatResponse),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Request(e) => write!(f, "{}", e),
            Failure::Provider(response) => {
                let message = response
                    .api_error()
                    .map(|e| e.message.as_str())
                    .unwrap_or_default();
                write!(f, "provider error: {}", message)
            }
        }
    }
}

pub struct ChatClient {
    config: Arc<dyn ConfigSource>,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl ChatClient {
    pub fn new(config: impl ConfigSource + 'static) -> Result<Self, ChatError> {
        ChatClient::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        config: impl ConfigSource + 'static,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        Ok(ChatClient {
            config: Arc::new(config),
            http: build_http_client(timeout)?,
            retry: RetryPolicy::default(),
        })
    }

    #[cfg(test)]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            ..retry
        };
        self
    }

    /// Ask the model for a reply to `prompt`.
    ///
    /// Transport and parse failures are retried and the last one is returned
    /// once attempts run out. A provider error in the body is retried too,
    /// but if the final attempt still carries one it is logged and dropped:
    /// the caller gets whatever reply that body holds, usually `""`.
    pub async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
        let trace_id = Uuid::new_v4();
        self.complete_with_retries(prompt)
            .instrument(info_span!("complete", %trace_id))
            .await
    }

    /// Like [`ChatClient::complete`], but gives up at `deadline`, abandoning
    /// any in-flight request and skipping the remaining attempts.
    pub async fn complete_with_deadline(
        &self,
        prompt: &str,
        deadline: Instant,
    ) -> Result<String, ChatError> {
        match timeout_at(deadline, self.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Deadline reached, abandoning chat completion");
                Err(ChatError::DeadlineExceeded)
            }
        }
    }

    async fn complete_with_retries(&self, prompt: &str) -> Result<String, ChatError> {
        let mut attempt = 1;
        loop {
            let failure = match self.attempt(prompt).await? {
                Attempt::Success(response) => {
                    info!("gpt request({}) succeeded", attempt);
                    return Ok(response.reply());
                }
                Attempt::Retry(failure) => failure,
            };
            warn!("gpt request({}) error: {}", attempt, failure);

            if attempt >= self.retry.max_attempts {
                return match failure {
                    Failure::Request(e) => Err(e),
                    Failure::Provider(response) => {
                        // Kept for compatibility: callers see a reply, not the provider error.
                        warn!(
                            "Giving up after {} attempts, returning reply despite provider error",
                            attempt
                        );
                        Ok(response.reply())
                    }
                };
            }

            attempt += 1;
            sleep(self.retry.delay_before(attempt)).await;
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<Attempt, ChatError> {
        let config = self.config.load()?;
        config.validate()?;

        let chat_request = ChatRequest::from_prompt(&config.model, prompt);
        match get_completion_message(&self.http, &config, &chat_request).await {
            Ok(response) if response.api_error().is_some() => {
                Ok(Attempt::Retry(Failure::Provider(response)))
            }
            Ok(response) => Ok(Attempt::Success(response)),
            Err(e) if e.is_retryable() => Ok(Attempt::Retry(Failure::Request(e))),
            Err(e) => Err(e),
        }
    }
}
