//! Groq provider -- generate questions through an OpenAI-compatible
//! chat-completions endpoint in JSON mode.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::traits::QuestionProvider;
use crate::config::ProviderConfig;
use crate::error::GenerationFailure;
use crate::question::{Difficulty, Question};

pub struct GroqProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqProvider {
    pub fn new(settings: &ProviderConfig, api_key: impl Into<String>) -> Result<Self, GenerationFailure> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationFailure::NotConfigured("API key is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: settings.base_url.clone(),
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    /// Build from config, reading the key from `settings.api_key_env`.
    pub fn from_config(settings: &ProviderConfig) -> Result<Self, GenerationFailure> {
        let api_key = std::env::var(&settings.api_key_env).map_err(|_| {
            GenerationFailure::NotConfigured(format!("{} is not set", settings.api_key_env))
        })?;
        Self::new(settings, api_key)
    }

    pub fn prompt(category: &str, difficulty: Difficulty) -> String {
        format!(
            r#"Generate a {difficulty} difficulty {category} trivia question as a single JSON object with these fields:
- "question": the question text
- "type": "multiple_choice" or "true_false"
- "options": array of distinct answers (multiple_choice only)
- "correct_answer": exactly one of the options, or "True"/"False" for true_false
- "explanation": one or two sentences explaining the answer
- "difficulty": integer from 1 to 5
- "hint": a short clue that does not give the answer away
Example:
{{
    "question": "What is the capital of France?",
    "type": "multiple_choice",
    "options": ["London", "Berlin", "Paris", "Madrid"],
    "correct_answer": "Paris",
    "explanation": "Paris has been the capital of France since the 5th century.",
    "difficulty": 2,
    "hint": "Known as the City of Light"
}}"#
        )
    }
}

#[async_trait]
impl QuestionProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn fetch(
        &self,
        category: &str,
        difficulty: Difficulty,
    ) -> Result<Question, GenerationFailure> {
        let body = json!({
            "messages": [{ "role": "user", "content": Self::prompt(category, difficulty) }],
            "model": self.model,
            "response_format": { "type": "json_object" },
            "temperature": self.temperature,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationFailure::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let completion: ChatCompletion = resp
            .json()
            .await
            .map_err(|e| GenerationFailure::invalid(format!("unexpected completion shape: {e}")))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationFailure::invalid("completion has no message content"))?;

        Question::from_json(&content)
    }
}
