// ==========================================
// 车间停机工时核算 - 引擎运行配置
// ==========================================
// 职责: 启动时一次性物化的只读配置
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::config::fault_rule_table::FaultRuleTable;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

pub const DEFAULT_REST_DAY: Weekday = Weekday::Fri;
pub const DEFAULT_ROLLOVER_TOLERANCE: f64 = 5.0;
pub const DEFAULT_ROLLOVER_FALLBACK_RATE: f64 = 100.0;
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 30;

// ==========================================
// BackendDescriptor - 推理服务描述
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackendKind {
    /// OpenAI 兼容接口 (/chat/completions)
    OpenAiCompatible,
    /// Ollama 接口 (/api/chat)
    Ollama,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub kind: BackendKind,
    pub base_url: String,
    pub model: String,
    /// 存放 API Key 的环境变量名（密钥不入库）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl BackendDescriptor {
    pub fn default_primary() -> Self {
        Self {
            kind: BackendKind::OpenAiCompatible,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            temperature: Some(0.2),
        }
    }

    pub fn default_fallback() -> Self {
        Self {
            kind: BackendKind::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            api_key_env: None,
            temperature: Some(0.2),
        }
    }

    /// 从环境变量解析 API Key
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|v| !v.trim().is_empty())
    }
}

// ==========================================
// EngineSettings - 引擎配置快照
// ==========================================
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub fault_rules: Arc<FaultRuleTable>,
    pub rest_day: Weekday,
    pub rollover_tolerance: f64,
    pub rollover_fallback_rate: f64,
    pub retry_max_attempts: u32,
    pub attempt_timeout_secs: u64,
    pub primary_backend: BackendDescriptor,
    pub fallback_backend: BackendDescriptor,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fault_rules: Arc::new(FaultRuleTable::builtin()),
            rest_day: DEFAULT_REST_DAY,
            rollover_tolerance: DEFAULT_ROLLOVER_TOLERANCE,
            rollover_fallback_rate: DEFAULT_ROLLOVER_FALLBACK_RATE,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            attempt_timeout_secs: DEFAULT_ATTEMPT_TIMEOUT_SECS,
            primary_backend: BackendDescriptor::default_primary(),
            fallback_backend: BackendDescriptor::default_fallback(),
        }
    }
}

impl EngineSettings {
    /// 从配置读取器加载全部配置
    pub async fn load<C>(reader: &C) -> Result<Self, Box<dyn Error>>
    where
        C: EngineConfigReader + ?Sized,
    {
        let settings = Self {
            fault_rules: Arc::new(reader.get_fault_rules().await?),
            rest_day: reader.get_weekly_rest_day().await?,
            rollover_tolerance: reader.get_rollover_tolerance().await?,
            rollover_fallback_rate: reader.get_rollover_fallback_rate().await?,
            retry_max_attempts: reader.get_retry_max_attempts().await?.max(1),
            attempt_timeout_secs: reader.get_attempt_timeout_secs().await?.max(1),
            primary_backend: reader.get_primary_backend().await?,
            fallback_backend: reader.get_fallback_backend().await?,
        };

        tracing::info!(
            rest_day = %settings.rest_day,
            fault_rules = settings.fault_rules.len(),
            tolerance = settings.rollover_tolerance,
            max_attempts = settings.retry_max_attempts,
            "引擎配置加载完成"
        );

        Ok(settings)
    }
}
