// ==========================================
// 车间停机工时核算 - OpenAI 兼容推理服务
// ==========================================
// 接口: POST {base_url}/chat/completions (非流式)
// ==========================================

use crate::reasoning::backend::{ReasoningBackend, ReasoningPrompt};
use crate::reasoning::error::ReasoningError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ==========================================
// OpenAiCompatibleBackend
// ==========================================
pub struct OpenAiCompatibleBackend {
    name: String,
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f32>,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        temperature: Option<f32>,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            name: format!("openai:{}", model),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            temperature,
        })
    }

    /// 构造请求体
    pub fn request_body(&self, prompt: &ReasoningPrompt) -> serde_json::Value {
        let messages = [
            ChatMessage {
                role: "system",
                content: &prompt.system,
            },
            ChatMessage {
                role: "user",
                content: &prompt.user,
            },
        ];

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        if prompt.expect_json {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

#[async_trait]
impl ReasoningBackend for OpenAiCompatibleBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &ReasoningPrompt) -> Result<String, ReasoningError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(backend = %self.name, prompt_len = prompt.user.len(), "发送推理请求");

        let mut request = self.client.post(&url).json(&self.request_body(prompt));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReasoningError::from_status(status.as_u16(), &body));
        }

        let parsed: ChatCompletionResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                ReasoningError::MalformedResponse("响应缺少 choices[0].message.content".to_string())
            })
    }
}
