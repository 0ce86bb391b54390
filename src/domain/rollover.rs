// ==========================================
// 车间停机工时核算 - 滚动决策领域模型
// ==========================================
// 职责: 任务达成差额 / 下一班计划 / 滚动决策
// 序列化格式: camelCase (与推理服务 JSON 契约一致)
// ==========================================

use crate::domain::types::{DecisionSource, RolloverAction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 标准班次按 8 小时折算产能
pub const NOMINAL_SHIFT_HOURS: f64 = 8.0;

/// 计算有效产能（件/小时）
///
/// 顺序: 显式产能 > 0 → target / 8 (target > 0) → fallback_rate
/// 保证返回值 > 0（fallback_rate 非正时退回 1.0）
pub fn effective_rate(explicit_rate: Option<f64>, target_amount: f64, fallback_rate: f64) -> f64 {
    if let Some(rate) = explicit_rate.filter(|r| r.is_finite() && *r > 0.0) {
        return rate;
    }
    if target_amount.is_finite() && target_amount > 0.0 {
        return target_amount / NOMINAL_SHIFT_HOURS;
    }
    if fallback_rate.is_finite() && fallback_rate > 0.0 {
        fallback_rate
    } else {
        1.0
    }
}

// ==========================================
// TaskAchievementDelta - 当班任务达成情况
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAchievementDelta {
    pub task_id: String,
    pub product_name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub target_unit: String,
    pub achieved_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_rate_per_hour: Option<f64>,
}

impl TaskAchievementDelta {
    /// achieved - target
    pub fn diff(&self) -> f64 {
        self.achieved_amount - self.target_amount
    }

    pub fn effective_rate(&self, fallback_rate: f64) -> f64 {
        effective_rate(self.production_rate_per_hour, self.target_amount, fallback_rate)
    }
}

// ==========================================
// PlannedTask - 下一班已排任务
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTask {
    pub task_id: String,
    pub product_name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub target_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_rate_per_hour: Option<f64>,
}

impl PlannedTask {
    /// 该任务在下一班占用的工时（小时）
    pub fn planned_hours(&self, fallback_rate: f64) -> f64 {
        let rate = effective_rate(self.production_rate_per_hour, self.target_amount, fallback_rate);
        self.target_amount.max(0.0) / rate
    }
}

// ==========================================
// CurrentShiftReport / NextShiftPlan
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentShiftReport {
    pub shift_name: String,
    pub date: NaiveDate,
    pub tasks: Vec<TaskAchievementDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextShiftPlan {
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub planned_tasks: Vec<PlannedTask>,
}

// ==========================================
// RolloverDecision - 单任务滚动决策
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverDecision {
    pub task_id: String,
    #[serde(default)]
    pub product_name: String,
    pub action: RolloverAction,
    #[serde(default)]
    pub amount_to_transfer: f64,
    /// 预计转移工时（小时）
    #[serde(rename = "timeToTransfer", default, skip_serializing_if = "Option::is_none")]
    pub time_to_transfer_hours: Option<f64>,
    #[serde(default)]
    pub reason: String,
}

// ==========================================
// RolloverOutcome - 一次班次结算的滚动决策结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverOutcome {
    pub decisions: Vec<RolloverDecision>,
    pub summary: String,
    pub source: DecisionSource,
    /// 是否使用了离线估算（供下游观测）
    pub fallback: bool,
}

impl RolloverOutcome {
    pub fn remote(backend: &str, decisions: Vec<RolloverDecision>, summary: String) -> Self {
        Self {
            decisions,
            summary,
            source: DecisionSource::Remote {
                backend: backend.to_string(),
            },
            fallback: false,
        }
    }

    pub fn offline(decisions: Vec<RolloverDecision>, summary: String) -> Self {
        Self {
            decisions,
            summary,
            source: DecisionSource::Offline,
            fallback: true,
        }
    }
}
