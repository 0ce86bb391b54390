// ==========================================
// 车间停机工时核算 - 班次领域模型
// ==========================================
// 职责: 班次 / 班次指标 / 达成评分
// ==========================================

use crate::domain::types::PerformanceStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ShiftSlot - 日历中的一个班次
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSlot {
    pub name: String,
    pub duration_minutes: u32,
}

// ==========================================
// ShiftKey - 班次记录主键 (operator_id, date, shift_name)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftKey {
    pub operator_id: String,
    pub shift_date: NaiveDate,
    pub shift_name: String,
}

impl ShiftKey {
    pub fn new(operator_id: &str, shift_date: NaiveDate, shift_name: &str) -> Self {
        Self {
            operator_id: operator_id.to_string(),
            shift_date,
            shift_name: shift_name.to_string(),
        }
    }
}

// ==========================================
// ShiftMetrics - 班次工时指标
// ==========================================
// 生命周期: 每次按需从故障集合重算, 不做原地修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftMetrics {
    pub shift_duration_minutes: f64,
    pub total_allowed_minutes: f64,
    pub total_delay_minutes: f64,
    /// max(0, shift_duration_minutes - total_allowed_minutes)
    pub effective_working_minutes: f64,
}

// ==========================================
// ScoreResult - 达成评分
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub actual_working_minutes: f64,
    pub adjusted_target: f64,
    pub achievement_percent: f64,
    /// 0..=100
    pub overall_score: u8,
    pub status: PerformanceStatus,
    /// 仅展示, 不参与评分
    pub delay_minutes: f64,
}

/// 单个任务的评分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskScore {
    pub task_id: String,
    pub product_name: String,
    pub score: ScoreResult,
}
