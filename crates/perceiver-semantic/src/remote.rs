//! OpenAI-compatible chat-completions labeler.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use perceiver_structural::Batch;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{LabelingError, Result};
use crate::models::RawLabel;
use crate::ports::LabelerPort;

#[derive(Debug, Clone)]
pub struct RemoteLabelerConfig {
    pub api_keys: Vec<String>,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for RemoteLabelerConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct RemoteLabeler {
    client: Client,
    config: RemoteLabelerConfig,
    system_prompt: String,
}

impl RemoteLabeler {
    /// `intents` is the closed vocabulary the service may answer with.
    pub fn new<I, S>(config: RemoteLabelerConfig, intents: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if config.api_keys.iter().all(|key| key.trim().is_empty()) {
            return Err(LabelingError::InvalidConfig(
                "missing API key for remote labeler".into(),
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                LabelingError::InvalidConfig(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            system_prompt: build_system_prompt(intents),
            config,
        })
    }

    async fn invoke(&self, batch: &Batch) -> Result<Vec<RawLabel>> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let elements = serde_json::to_string(&batch.elements)
            .map_err(|err| LabelingError::MalformedResponse(format!("encode batch: {err}")))?;

        let mut last_error: Option<LabelingError> = None;
        let keys: Vec<&String> = self
            .config
            .api_keys
            .iter()
            .filter(|key| !key.trim().is_empty())
            .collect();
        for (index, key) in keys.iter().enumerate() {
            let body = ChatCompletionRequest {
                model: self.config.model.clone(),
                temperature: self.config.temperature,
                response_format: ResponseFormat {
                    r#type: "json_object".to_string(),
                },
                messages: vec![
                    ChatMessage {
                        role: "system".to_string(),
                        content: self.system_prompt.clone(),
                    },
                    ChatMessage {
                        role: "user".to_string(),
                        content: format!(
                            "Section: {}\nElements:\n{}",
                            batch.context, elements
                        ),
                    },
                ],
            };

            let response = match self.client.post(&url).bearer_auth(key).json(&body).send().await
            {
                Ok(resp) => resp,
                Err(err) => {
                    last_error = Some(LabelingError::Transport(err.to_string()));
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<response unavailable>".to_string());
                if status == 429 && index + 1 < keys.len() {
                    warn!(
                        target: "labeler",
                        attempt = index + 1,
                        remaining = keys.len() - index - 1,
                        "labeler rate limited; switching API key"
                    );
                    last_error = Some(LabelingError::Status { status, body: text });
                    continue;
                }
                return Err(LabelingError::Status { status, body: text });
            }

            let response: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|err| LabelingError::MalformedResponse(err.to_string()))?;
            let content = response
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone())
                .ok_or_else(|| LabelingError::MalformedResponse("missing content".into()))?;
            return parse_labels(&content);
        }

        Err(last_error
            .unwrap_or_else(|| LabelingError::Transport("all API keys exhausted".into())))
    }
}

#[async_trait]
impl LabelerPort for RemoteLabeler {
    fn name(&self) -> &str {
        "remote"
    }

    async fn label(&self, batch: &Batch) -> Result<Vec<RawLabel>> {
        let started = Instant::now();
        let labels = self.invoke(batch).await?;
        debug!(
            target: "labeler",
            elements = batch.len(),
            labels = labels.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "remote batch labeled"
        );
        Ok(labels)
    }
}

fn build_system_prompt<I, S>(intents: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let vocabulary = intents
        .into_iter()
        .map(|intent| intent.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are a UI labeling agent. For every element, infer what a user would do with it. \
         Answer with a JSON object {{\"labels\": [...]}} holding one entry per element: \
         {{\"index\": <nodeIndex>, \"intent\": <one of: {vocabulary}, other>, \
         \"confidence\": <0..1>, \"important\": <bool>}}. \
         Use \"other\" when unsure."
    )
}

/// Reads a label array out of a model reply: a bare array, a `{"labels": [...]}`
/// object, or either wrapped in prose or a code fence.
pub fn parse_labels(content: &str) -> Result<Vec<RawLabel>> {
    let payload = extract_json_payload(content)
        .ok_or_else(|| LabelingError::MalformedResponse("reply carries no JSON".into()))?;
    let value: Value = serde_json::from_str(&payload)
        .map_err(|err| LabelingError::MalformedResponse(err.to_string()))?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("labels").or_else(|| map.get("elements")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(LabelingError::MalformedResponse(
                    "object without a labels array".into(),
                ))
            }
        },
        _ => {
            return Err(LabelingError::MalformedResponse(
                "expected an array or object".into(),
            ))
        }
    };
    Ok(items.iter().map(RawLabel::from_value).collect())
}

fn extract_json_payload(raw: &str) -> Option<String> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(trim_symmetric(raw));
    }

    let fence = "```";
    if let Some(start) = raw.find(fence) {
        let after_fence = &raw[start + fence.len()..];
        let after_lang = after_fence.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
        if let Some(end) = after_lang.find(fence) {
            let block = &after_lang[..end];
            if block.contains('{') || block.contains('[') {
                return Some(trim_symmetric(block));
            }
        }
    }

    let open_at = raw.find(['{', '['])?;
    let (open, close) = if raw[open_at..].starts_with('{') {
        ('{', '}')
    } else {
        ('[', ']')
    };
    let mut depth = 0i32;
    for (idx, ch) in raw[open_at..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Some(trim_symmetric(&raw[open_at..=open_at + idx]));
            }
        }
    }
    None
}

fn trim_symmetric(value: &str) -> String {
    value.trim().trim_matches('`').trim().to_string()
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_object() {
        let labels = parse_labels(
            r#"{"labels":[{"index":2,"intent":"search-box","confidence":0.93,"important":true}]}"#,
        )
        .unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].index, Some(2));
        assert_eq!(labels[0].important, Some(true));
    }

    #[test]
    fn parses_fenced_array() {
        let reply = "Here you go:\n```json\n[{\"intent\":\"nav-link\",\"confidence\":0.8}]\n```";
        let labels = parse_labels(reply).unwrap();
        assert_eq!(labels[0].intent.as_deref(), Some("nav-link"));
    }

    #[test]
    fn parses_inline_object_in_prose() {
        let reply = "Sure! {\"labels\": [{\"intent\": \"other\"}]} Hope that helps.";
        assert_eq!(parse_labels(reply).unwrap().len(), 1);
    }

    #[test]
    fn rejects_unparseable_replies() {
        assert!(parse_labels("I cannot help with that").is_err());
        assert!(parse_labels("{\"answer\": 42}").is_err());
        assert!(parse_labels("{\"labels\": [").is_err());
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = RemoteLabeler::new(RemoteLabelerConfig::default(), ["search-box"]);
        assert!(matches!(err, Err(LabelingError::InvalidConfig(_))));
    }

    #[test]
    fn prompt_lists_vocabulary() {
        let prompt = build_system_prompt(["login-button", "nav-link"]);
        assert!(prompt.contains("login-button, nav-link, other"));
    }
}
