// ==========================================
// 推理服务应答解析与规整
// ==========================================
// 1. 从文本中提取 {...}（容忍 markdown 代码块包裹）
// 2. decisions 为数组 → 逐条解析; 为单个对象 → 包装为一元数组; 缺失 → 失败
// 3. 规整: 负数归零 / 缺失工时按产能重算 / 无转移量工时归零 / 丢弃未知任务
// ==========================================

use crate::domain::rollover::{RolloverDecision, TaskAchievementDelta};
use crate::domain::types::RolloverAction;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

fn json_object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("静态正则必须合法"))
}

/// 提取文本中第一个 `{` 到最后一个 `}` 之间的内容
pub fn extract_json_object(text: &str) -> Option<&str> {
    json_object_pattern().find(text).map(|m| m.as_str())
}

/// 推理服务返回的原始决策（字段宽松）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDecision {
    pub task_id: RawTaskId,
    #[serde(default)]
    pub product_name: Option<String>,
    pub action: String,
    #[serde(default)]
    pub amount_to_transfer: Option<Value>,
    #[serde(default)]
    pub time_to_transfer: Option<Value>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// 任务标识: 推理服务可能把数字形式的标识回显为 JSON 数字
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTaskId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl RawTaskId {
    pub fn to_key(&self) -> String {
        match self {
            RawTaskId::Text(s) => s.trim().to_string(),
            RawTaskId::Integer(n) => n.to_string(),
            RawTaskId::Float(f) => f.to_string(),
        }
    }
}

/// 解析后的应答
#[derive(Debug, Clone)]
pub enum ParsedRolloverResponse {
    /// decisions 为数组
    Batch {
        decisions: Vec<RawDecision>,
        summary: String,
    },
    /// decisions 为单个对象（已包装）
    Single {
        decision: RawDecision,
        summary: String,
    },
}

impl ParsedRolloverResponse {
    /// 解析应答文本; 无法识别时返回 None
    pub fn parse(content: &str) -> Option<Self> {
        let json_text = extract_json_object(content)?;
        let root: Value = serde_json::from_str(json_text).ok()?;
        let summary = root
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match root.get("decisions")? {
            Value::Array(items) => {
                let total = items.len();
                let decisions: Vec<RawDecision> = items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect();
                if decisions.len() < total {
                    debug!(total, parsed = decisions.len(), "部分决策条目无法解析, 已跳过");
                }
                Some(Self::Batch { decisions, summary })
            }
            obj @ Value::Object(_) => {
                let decision = serde_json::from_value(obj.clone()).ok()?;
                Some(Self::Single { decision, summary })
            }
            _ => None,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Self::Batch { summary, .. } | Self::Single { summary, .. } => summary,
        }
    }

    pub fn into_decisions(self) -> Vec<RawDecision> {
        match self {
            Self::Batch { decisions, .. } => decisions,
            Self::Single { decision, .. } => vec![decision],
        }
    }
}

/// 数值字段: 接受数字或数字字符串
fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// 规整远程决策
///
/// 返回按请求任务顺序排列的决策; 未知任务与无法识别的 action 被丢弃,
/// 同一任务重复出现时保留第一条
pub fn normalize(
    raw: Vec<RawDecision>,
    tasks: &[TaskAchievementDelta],
    fallback_rate: f64,
) -> Vec<RolloverDecision> {
    let index: HashMap<&str, &TaskAchievementDelta> =
        tasks.iter().map(|t| (t.task_id.as_str(), t)).collect();
    let mut accepted: HashMap<String, RolloverDecision> = HashMap::new();

    for item in raw {
        let task_id = item.task_id.to_key();
        let Some(task) = index.get(task_id.as_str()) else {
            debug!(task_id = %task_id, "丢弃未知任务的决策");
            continue;
        };
        let Some(action) = RolloverAction::parse(&item.action) else {
            debug!(task_id = %task_id, action = %item.action, "丢弃无法识别的动作");
            continue;
        };
        if accepted.contains_key(&task_id) {
            continue;
        }

        let amount = match action {
            RolloverAction::None => 0.0,
            _ => as_number(item.amount_to_transfer.as_ref()).unwrap_or(0.0).max(0.0),
        };
        // 无转移量时工时必为 0
        let hours = if amount == 0.0 {
            0.0
        } else {
            as_number(item.time_to_transfer.as_ref())
                .map(|h| h.max(0.0))
                .unwrap_or_else(|| amount / task.effective_rate(fallback_rate))
        };

        let product_name = item
            .product_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| task.product_name.clone());

        accepted.insert(
            task.task_id.clone(),
            RolloverDecision {
                task_id: task.task_id.clone(),
                product_name,
                action,
                amount_to_transfer: amount,
                time_to_transfer_hours: Some(hours),
                reason: item.reason.unwrap_or_default(),
            },
        );
    }

    tasks
        .iter()
        .filter_map(|t| accepted.remove(&t.task_id))
        .collect()
}
