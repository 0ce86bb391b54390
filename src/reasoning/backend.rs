// ==========================================
// 车间停机工时核算 - 推理服务接口
// ==========================================
// 职责: 定义远程推理服务的统一调用接口
// 实现者: OpenAiCompatibleBackend / OllamaBackend / 测试桩
// ==========================================

use crate::reasoning::error::ReasoningError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 推理请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningPrompt {
    pub system: String,
    pub user: String,
    /// 要求服务端以 JSON 对象返回
    pub expect_json: bool,
}

#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// 服务名（用于日志与决策来源标记）
    fn name(&self) -> &str;

    /// 发送请求, 返回模型输出的原始文本
    async fn complete(&self, prompt: &ReasoningPrompt) -> Result<String, ReasoningError>;
}
