//! Hugging Face HTTP client with rate limiting

use super::types::ApiError;
use crate::providers::{invalid_api_key, invalid_response, rate_limited, request_failed};
use nl2sql_core::LlmError;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

const PROVIDER: &str = "huggingface";
const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Hugging Face Inference API client with rate limiting.
pub struct HuggingFaceClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: Arc<Semaphore>,
    last_request: Arc<AtomicU64>,
    min_request_interval_ms: u64,
    start_time: Instant,
}

impl HuggingFaceClient {
    /// Create a new client against the default router endpoint.
    ///
    /// # Arguments
    /// * `api_key` - Hugging Face access token
    /// * `requests_per_minute` - Maximum requests per minute (default: 60)
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, requests_per_minute)
    }

    /// Create a client against a custom OpenAI-compatible endpoint, for
    /// dedicated inference endpoints or local test servers.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        requests_per_minute: u32,
    ) -> Self {
        let rpm = requests_per_minute.max(1);
        let permits = rpm as usize;
        let min_interval_ms = (60_000 / rpm as u64).max(10);

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(Semaphore::new(permits)),
            last_request: Arc::new(AtomicU64::new(0)),
            min_request_interval_ms: min_interval_ms,
            start_time: Instant::now(),
        }
    }

    /// Make an API request with automatic rate limiting.
    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Req,
    ) -> Result<Res, LlmError> {
        // Rate limiting: acquire permit
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| request_failed(PROVIDER, 0, format!("Rate limiter error: {}", e)))?;

        // Enforce minimum interval between requests
        let now_ms = self.start_time.elapsed().as_millis() as u64;
        let last_ms = self.last_request.load(Ordering::Relaxed);
        let elapsed = now_ms.saturating_sub(last_ms);

        if elapsed < self.min_request_interval_ms {
            let wait_ms = self.min_request_interval_ms - elapsed;
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }

        self.last_request.store(now_ms, Ordering::Relaxed);

        // Make HTTP request
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, "sending inference request");
        let started = Instant::now();
        let send = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send();

        let response = match tokio::time::timeout(REQUEST_TIMEOUT, send).await {
            Ok(result) => result.map_err(|e| {
                request_failed(PROVIDER, 0, format!("HTTP request failed: {}", e))
            })?,
            Err(_) => {
                return Err(LlmError::Timeout {
                    provider: PROVIDER.to_string(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                })
            }
        };

        // Handle response
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                invalid_response(PROVIDER, format!("Failed to parse response: {}", e))
            })
        } else {
            // Parse error response
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let error_msg = if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                api_error.error.message
            } else {
                error_text
            };

            Err(match status {
                StatusCode::TOO_MANY_REQUESTS => rate_limited(PROVIDER),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => invalid_api_key(PROVIDER),
                _ => request_failed(PROVIDER, status.as_u16() as i32, error_msg),
            })
        }
    }
}

impl std::fmt::Debug for HuggingFaceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let client = HuggingFaceClient::new("hf_secret_token", 60);
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("hf_secret_token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = HuggingFaceClient::with_base_url("k", "http://localhost:8080/v1/", 60);
        assert!(format!("{:?}", client).contains("http://localhost:8080/v1"));
    }
}
