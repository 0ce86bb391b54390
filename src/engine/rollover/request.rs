// ==========================================
// 滚动决策请求（结构化, 序列化前校验）
// ==========================================

use super::offline::OfflineRolloverParams;
use crate::domain::rollover::{CurrentShiftReport, NextShiftPlan};
use crate::engine::shift_calendar::ShiftCalendar;
use crate::reasoning::ReasoningPrompt;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// 请求校验错误
#[derive(Error, Debug, PartialEq)]
pub enum RequestValidationError {
    #[error("任务ID为空: index={0}")]
    EmptyTaskId(usize),

    #[error("任务ID重复: {0}")]
    DuplicateTaskId(String),

    #[error("数值非法: task_id={task_id}, field={field}")]
    NonFiniteAmount { task_id: String, field: String },

    #[error("请求序列化失败: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftContext {
    pub name: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeltaView {
    pub task_id: String,
    pub product_name: String,
    pub target_amount: f64,
    pub target_unit: String,
    pub achieved_amount: f64,
    pub difference: f64,
    pub production_rate_per_hour: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTaskView {
    pub task_id: String,
    pub product_name: String,
    pub target_amount: f64,
    pub target_unit: String,
    pub production_rate_per_hour: f64,
    pub planned_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextShiftContext {
    pub name: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub planned_tasks: Vec<PlannedTaskView>,
    pub committed_hours: f64,
    pub available_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConstraints {
    pub tolerance: f64,
    /// 任一班次承诺工时不得超过其标准时长
    pub max_shift_hours: f64,
    pub allowed_actions: [&'static str; 3],
}

// ==========================================
// RolloverRequest
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverRequest {
    pub current_shift: ShiftContext,
    pub tasks: Vec<TaskDeltaView>,
    pub next_shift: NextShiftContext,
    pub constraints: RequestConstraints,
}

const SYSTEM_PROMPT: &str = "You are a production planning assistant for a factory floor. \
For every task of the finished shift decide whether its shortage should be rolled over to \
following shifts (action \"rollover\"), whether its surplus should be balanced against future \
targets (action \"balance\"), or whether nothing should happen (action \"none\"). \
Hard constraint: the committed time of any shift must never exceed its standard duration \
(maxShiftHours); split a transfer across later shifts when the next shift lacks capacity. \
Respond with a single JSON object only, no prose, with exactly this shape: \
{\"decisions\":[{\"taskId\":string,\"productName\":string,\"action\":\"rollover\"|\"balance\"|\"none\",\
\"amountToTransfer\":number,\"timeToTransfer\":number,\"reason\":string}],\"summary\":string}. \
timeToTransfer is expressed in hours. Return exactly one decision per task.";

impl RolloverRequest {
    /// 构建并校验请求
    pub fn build(
        current: &CurrentShiftReport,
        next: &NextShiftPlan,
        calendar: &ShiftCalendar,
        params: &OfflineRolloverParams,
    ) -> Result<Self, RequestValidationError> {
        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(current.tasks.len());

        for (index, task) in current.tasks.iter().enumerate() {
            if task.task_id.trim().is_empty() {
                return Err(RequestValidationError::EmptyTaskId(index));
            }
            if !seen.insert(task.task_id.as_str()) {
                return Err(RequestValidationError::DuplicateTaskId(task.task_id.clone()));
            }
            ensure_finite(&task.task_id, "targetAmount", task.target_amount)?;
            ensure_finite(&task.task_id, "achievedAmount", task.achieved_amount)?;

            tasks.push(TaskDeltaView {
                task_id: task.task_id.clone(),
                product_name: task.product_name.clone(),
                target_amount: task.target_amount,
                target_unit: task.target_unit.clone(),
                achieved_amount: task.achieved_amount,
                difference: task.diff(),
                production_rate_per_hour: task.effective_rate(params.fallback_rate),
            });
        }

        let mut planned_tasks = Vec::with_capacity(next.planned_tasks.len());
        for planned in &next.planned_tasks {
            ensure_finite(&planned.task_id, "targetAmount", planned.target_amount)?;
            let rate = crate::domain::rollover::effective_rate(
                planned.production_rate_per_hour,
                planned.target_amount,
                params.fallback_rate,
            );
            planned_tasks.push(PlannedTaskView {
                task_id: planned.task_id.clone(),
                product_name: planned.product_name.clone(),
                target_amount: planned.target_amount,
                target_unit: planned.target_unit.clone(),
                production_rate_per_hour: rate,
                planned_hours: planned.planned_hours(params.fallback_rate),
            });
        }

        let current_duration = calendar
            .shift_slot(current.date, &current.shift_name)
            .map(|s| s.duration_minutes)
            .unwrap_or_else(|| calendar.shift_duration_minutes(current.date));
        let next_duration = calendar
            .shift_slot(next.date, &next.name)
            .map(|s| s.duration_minutes)
            .unwrap_or_else(|| calendar.shift_duration_minutes(next.date));

        let max_shift_hours = next_duration as f64 / 60.0;
        let committed_hours: f64 = planned_tasks.iter().map(|p| p.planned_hours).sum();

        Ok(Self {
            current_shift: ShiftContext {
                name: current.shift_name.clone(),
                date: current.date,
                duration_minutes: current_duration,
            },
            tasks,
            next_shift: NextShiftContext {
                name: next.name.clone(),
                date: next.date,
                duration_minutes: next_duration,
                planned_tasks,
                committed_hours,
                available_hours: (max_shift_hours - committed_hours).max(0.0),
            },
            constraints: RequestConstraints {
                tolerance: params.tolerance,
                max_shift_hours,
                allowed_actions: ["rollover", "balance", "none"],
            },
        })
    }

    /// 序列化为推理请求
    pub fn to_prompt(&self) -> Result<ReasoningPrompt, RequestValidationError> {
        let payload = serde_json::to_string_pretty(self)
            .map_err(|e| RequestValidationError::Serialization(e.to_string()))?;

        Ok(ReasoningPrompt {
            system: SYSTEM_PROMPT.to_string(),
            user: format!("Shift data:\n{}", payload),
            expect_json: true,
        })
    }
}

fn ensure_finite(task_id: &str, field: &str, value: f64) -> Result<(), RequestValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RequestValidationError::NonFiniteAmount {
            task_id: task_id.to_string(),
            field: field.to_string(),
        })
    }
}
