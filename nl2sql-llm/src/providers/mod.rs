//! LLM provider implementations
//!
//! This module contains concrete implementations of the SqlGenerator,
//! SqlFixer, and SqlJudge traits for hosted inference services.

pub mod huggingface;

pub use huggingface::{HuggingFaceClient, HuggingFaceProvider};

use nl2sql_core::LlmError;

pub(crate) fn request_failed(
    provider: &str,
    status: i32,
    message: impl Into<String>,
) -> LlmError {
    LlmError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    }
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> LlmError {
    LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn rate_limited(provider: &str) -> LlmError {
    LlmError::RateLimited {
        provider: provider.to_string(),
    }
}

pub(crate) fn invalid_api_key(provider: &str) -> LlmError {
    LlmError::InvalidApiKey {
        provider: provider.to_string(),
    }
}
