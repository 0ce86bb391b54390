// ==========================================
// 车间停机工时核算 - Ollama 推理服务
// ==========================================
// 接口: POST {base_url}/api/chat (stream=false)
// ==========================================

use crate::reasoning::backend::{ReasoningBackend, ReasoningPrompt};
use crate::reasoning::error::ReasoningError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// /api/chat 请求
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatMessage {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// /api/chat 响应（非流式）
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    #[serde(default)]
    done: bool,
}

// ==========================================
// OllamaBackend
// ==========================================
pub struct OllamaBackend {
    name: String,
    client: Client,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl OllamaBackend {
    pub fn new(
        base_url: &str,
        model: &str,
        temperature: Option<f32>,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            name: format!("ollama:{}", model),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    pub fn build_request(&self, prompt: &ReasoningPrompt) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![
                OllamaChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                OllamaChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            stream: false,
            format: prompt.expect_json.then(|| "json".to_string()),
            options: self.temperature.map(|t| OllamaOptions {
                temperature: Some(t),
            }),
        }
    }
}

#[async_trait]
impl ReasoningBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &ReasoningPrompt) -> Result<String, ReasoningError> {
        let url = format!("{}/api/chat", self.base_url);
        let req = self.build_request(prompt);
        debug!(backend = %self.name, messages_count = req.messages.len(), "发送推理请求");

        let resp = self.client.post(&url).json(&req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReasoningError::from_status(status.as_u16(), &body));
        }

        let parsed: OllamaChatResponse = resp.json().await?;
        if !parsed.done {
            debug!(backend = %self.name, "响应未标记 done, 按完整内容处理");
        }
        if parsed.message.content.trim().is_empty() {
            return Err(ReasoningError::MalformedResponse("响应内容为空".to_string()));
        }
        Ok(parsed.message.content)
    }
}
