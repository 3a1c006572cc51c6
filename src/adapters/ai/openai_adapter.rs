//! OpenAI-compatible adapter for expense categorization.
//!
//! Supports OpenAI API, Azure OpenAI, and local Ollama instances.
//! Implements `AiPort` with strict JSON parsing and markdown stripping.

use crate::domain::{ClassificationRequest, DomainError, ExpenseCategory, RawSuggestion};
use crate::ports::AiPort;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// OpenAI-compatible AI adapter.
///
/// Can be configured to work with:
/// - OpenAI API (api.openai.com)
/// - Azure OpenAI
/// - Ollama (localhost)
/// - Any OpenAI-compatible API
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAdapter {
    /// Create a new OpenAI adapter.
    ///
    /// # Arguments
    /// * `api_url` - API endpoint (e.g., "https://api.openai.com/v1/chat/completions")
    /// * `api_key` - API key (can be empty for local Ollama)
    /// * `model` - Model name (e.g., "gpt-4o-mini", "llama3.2")
    /// * `timeout` - HTTP request timeout; the classifier applies its own deadline on top
    pub fn new(
        api_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }

    /// System prompt: category list with definitions plus the JSON contract.
    fn system_prompt() -> String {
        let mut categories = String::new();
        for category in ExpenseCategory::ALL {
            categories.push_str(&format!("- {}: {}\n", category, category.definition()));
        }
        format!(
            r#"You categorize expenses for a construction project management system.

## Categories
Choose exactly one of:
{}
## Output Format
You MUST respond with valid JSON only. No markdown, no explanations outside JSON.

{{"category": "<one of the categories above>", "confidence": <number between 0 and 1>, "reasoning": "<one short sentence>"}}"#,
            categories
        )
    }

    /// User prompt embedding the expense description and optional vendor/amount.
    fn user_prompt(request: &ClassificationRequest) -> String {
        let mut prompt = format!("Expense description: {}\n", request.description.trim());
        if let Some(vendor) = request.vendor.as_deref().filter(|v| !v.trim().is_empty()) {
            prompt.push_str(&format!("Vendor: {}\n", vendor.trim()));
        }
        if let Some(amount) = request.amount {
            prompt.push_str(&format!("Amount: {}\n", amount));
        }
        prompt.push_str("\nCategorize this expense.");
        prompt
    }

    /// Sanitize JSON response from LLM.
    ///
    /// LLMs sometimes wrap JSON in markdown code blocks. This strips them.
    pub(crate) fn sanitize_json(raw_text: &str) -> String {
        let trimmed = raw_text.trim();

        // Handle markdown code blocks: ```json ... ``` or ``` ... ```
        if trimmed.starts_with("```") {
            let without_prefix = trimmed
                .strip_prefix("```json")
                .or_else(|| trimmed.strip_prefix("```"))
                .unwrap_or(trimmed);

            if let Some(end_idx) = without_prefix.rfind("```") {
                return without_prefix[..end_idx].trim().to_string();
            }
            return without_prefix.trim().to_string();
        }

        // Prose around the object: keep the outermost braces
        if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
            if start < end {
                return trimmed[start..=end].to_string();
            }
        }

        trimmed.to_string()
    }

    /// Parse sanitized model text into the raw suggestion shape. Any schema violation is an error.
    pub(crate) fn parse_suggestion(raw_content: &str) -> Result<RawSuggestion, DomainError> {
        let clean_json = Self::sanitize_json(raw_content);
        serde_json::from_str(&clean_json).map_err(|e| {
            warn!(error = %e, json = %clean_json.chars().take(200).collect::<String>(), "JSON parse failed");
            DomainError::Classifier(format!("Failed to parse LLM JSON: {}", e))
        })
    }
}

/// OpenAI API request structure.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// OpenAI API response structure.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

#[async_trait::async_trait]
impl AiPort for OpenAiAdapter {
    async fn suggest_category(
        &self,
        request: &ClassificationRequest,
        temperature: f32,
    ) -> Result<RawSuggestion, DomainError> {
        info!(
            description_len = request.description.len(),
            has_vendor = request.vendor.is_some(),
            model = %self.model,
            "requesting expense category from AI"
        );

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::user_prompt(request),
                },
            ],
            temperature,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Classifier(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "AI API returned error");
            return Err(DomainError::Classifier(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Classifier(format!("Failed to parse API response: {}", e)))?;

        let raw_content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::Classifier("No response choices returned".to_string()))?;

        debug!(raw_len = raw_content.len(), "received AI response");

        Self::parse_suggestion(&raw_content)
    }
}
