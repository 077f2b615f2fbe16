//! Hugging Face Inference provider
//!
//! Talks to the OpenAI-compatible chat completions surface of the Hugging
//! Face router. One provider implements all three pipeline capabilities.

mod client;
mod provider;
mod types;

pub use client::HuggingFaceClient;
pub use provider::HuggingFaceProvider;
