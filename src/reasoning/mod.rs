// ==========================================
// 车间停机工时核算 - 推理服务层
// ==========================================
// 职责: 远程推理服务客户端 + 重试/降级策略
// 红线: 调用失败只返回“无答案”, 由上层决定确定性兜底
// ==========================================

pub mod backend;
pub mod error;
pub mod ollama;
pub mod openai;
pub mod retry;

pub use backend::{ReasoningBackend, ReasoningPrompt};
pub use error::{ErrorClass, ReasoningError};
pub use ollama::OllamaBackend;
pub use openai::OpenAiCompatibleBackend;
pub use retry::{invoke_with_fallback, RetryPolicy};

use crate::config::settings::{BackendDescriptor, BackendKind, EngineSettings};
use std::sync::Arc;
use std::time::Duration;

/// 推理服务应答
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningReply {
    /// 实际给出应答的服务名
    pub backend: String,
    pub content: String,
}

/// 按描述构造推理服务
pub fn build_backend(
    descriptor: &BackendDescriptor,
    timeout: Duration,
) -> Result<Arc<dyn ReasoningBackend>, ReasoningError> {
    let backend: Arc<dyn ReasoningBackend> = match descriptor.kind {
        BackendKind::OpenAiCompatible => Arc::new(OpenAiCompatibleBackend::new(
            &descriptor.base_url,
            &descriptor.model,
            descriptor.resolve_api_key(),
            descriptor.temperature,
            timeout,
        )?),
        BackendKind::Ollama => Arc::new(OllamaBackend::new(
            &descriptor.base_url,
            &descriptor.model,
            descriptor.temperature,
            timeout,
        )?),
    };
    Ok(backend)
}

// ==========================================
// ReasoningClient - 主/备推理服务 + 重试策略
// ==========================================
#[derive(Clone)]
pub struct ReasoningClient {
    primary: Arc<dyn ReasoningBackend>,
    fallback: Arc<dyn ReasoningBackend>,
    policy: RetryPolicy,
}

impl ReasoningClient {
    pub fn new(
        primary: Arc<dyn ReasoningBackend>,
        fallback: Arc<dyn ReasoningBackend>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            primary,
            fallback,
            policy,
        }
    }

    /// 按引擎配置构造
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, ReasoningError> {
        let timeout = Duration::from_secs(settings.attempt_timeout_secs);
        let primary = build_backend(&settings.primary_backend, timeout)?;
        let fallback = build_backend(&settings.fallback_backend, timeout)?;
        let policy =
            RetryPolicy::new(settings.retry_max_attempts).with_attempt_timeout(Some(timeout));
        Ok(Self::new(primary, fallback, policy))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 调用推理服务（主服务重试, 失败后备用服务一次）
    ///
    /// # 返回
    /// - Some(ReasoningReply): 获得应答
    /// - None: 主备均失败
    pub async fn complete(&self, operation: &str, prompt: &ReasoningPrompt) -> Option<ReasoningReply> {
        let primary = &self.primary;
        let fallback = &self.fallback;

        invoke_with_fallback(
            operation,
            &self.policy,
            ReasoningError::class,
            || async move {
                primary.complete(prompt).await.map(|content| ReasoningReply {
                    backend: primary.name().to_string(),
                    content,
                })
            },
            || async move {
                fallback.complete(prompt).await.map(|content| ReasoningReply {
                    backend: fallback.name().to_string(),
                    content,
                })
            },
        )
        .await
    }
}
