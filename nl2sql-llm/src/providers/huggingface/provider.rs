//! Hugging Face provider implementation for all three pipeline capabilities

use super::client::HuggingFaceClient;
use super::types::{ChatRequest, ChatResponse, Message};
use crate::providers::invalid_response;
use crate::{extract, prompts, SqlFixer, SqlGenerator, SqlJudge};
use async_trait::async_trait;
use nl2sql_core::{GenerationConfig, JudgeVerdict, LlmError};

const PROVIDER: &str = "huggingface";

/// Provider implementing SQL generation, repair, and judgment over the
/// Hugging Face chat completions API.
pub struct HuggingFaceProvider {
    client: HuggingFaceClient,
    config: GenerationConfig,
}

impl HuggingFaceProvider {
    /// Create a provider with explicit generation settings.
    pub fn new(api_key: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            client: HuggingFaceClient::new(api_key, 60),
            config,
        }
    }

    /// Create a provider with the default model and sampling settings.
    pub fn with_default_config(api_key: impl Into<String>) -> Self {
        Self::new(api_key, GenerationConfig::default())
    }

    /// Create a provider over an already-configured client, for custom
    /// endpoints and rate limits.
    pub fn with_client(client: HuggingFaceClient, config: GenerationConfig) -> Self {
        Self { client, config }
    }

    async fn complete(&self, prompt: String) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: Some(self.config.max_new_tokens),
            temperature: Some(self.config.temperature),
        };

        let response: ChatResponse = self.client.request("chat/completions", request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| invalid_response(PROVIDER, "No completion in response"))
    }
}

#[async_trait]
impl SqlGenerator for HuggingFaceProvider {
    async fn plan(&self, question: &str, schema_text: &str) -> Result<String, LlmError> {
        self.complete(prompts::reasoning_prompt(question, schema_text))
            .await
    }

    async fn generate(
        &self,
        question: &str,
        schema_text: &str,
        reasoning: &str,
    ) -> Result<String, LlmError> {
        self.complete(prompts::generation_prompt(question, schema_text, reasoning))
            .await
    }

    async fn explain(
        &self,
        question: &str,
        sql: &str,
        reasoning: &str,
    ) -> Result<String, LlmError> {
        self.complete(prompts::answer_prompt(question, sql, reasoning))
            .await
    }
}

#[async_trait]
impl SqlFixer for HuggingFaceProvider {
    async fn fix(
        &self,
        sql: &str,
        diagnostic: &str,
        schema_text: &str,
        question: &str,
    ) -> Result<String, LlmError> {
        self.complete(prompts::correction_prompt(sql, diagnostic, schema_text, question))
            .await
    }
}

#[async_trait]
impl SqlJudge for HuggingFaceProvider {
    async fn judge(
        &self,
        schema_text: &str,
        question: &str,
        gold_sql: &str,
        predicted_sql: &str,
    ) -> Result<JudgeVerdict, LlmError> {
        let raw = self
            .complete(prompts::judge_prompt(
                schema_text,
                question,
                gold_sql,
                predicted_sql,
            ))
            .await?;
        Ok(extract::parse_judge_verdict(&raw))
    }
}

impl std::fmt::Debug for HuggingFaceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceProvider")
            .field("model", &self.config.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_names_the_model_only() {
        let provider = HuggingFaceProvider::with_default_config("hf_secret");
        let rendered = format!("{:?}", provider);
        assert!(rendered.contains("Qwen/Qwen2.5-Coder-32B-Instruct"));
        assert!(!rendered.contains("hf_secret"));
    }
}
