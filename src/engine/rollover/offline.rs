// ==========================================
// 离线滚动算法（确定性兜底）
// ==========================================
// 规则:
// - diff = 实际 - 目标
// - diff < -容差 → rollover |diff|
// - diff >  容差 → balance  |diff|
// - 其他         → none 0
// - 转移工时 = 数量 / 产能（产能恒 > 0）
// ==========================================

use crate::config::settings::{DEFAULT_ROLLOVER_FALLBACK_RATE, DEFAULT_ROLLOVER_TOLERANCE};
use crate::domain::rollover::{RolloverDecision, RolloverOutcome, TaskAchievementDelta};
use crate::domain::types::RolloverAction;

/// 离线算法参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfflineRolloverParams {
    /// 容差（件）
    pub tolerance: f64,
    /// 无法推导产能时的中性产能（件/小时）
    pub fallback_rate: f64,
}

impl Default for OfflineRolloverParams {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_ROLLOVER_TOLERANCE,
            fallback_rate: DEFAULT_ROLLOVER_FALLBACK_RATE,
        }
    }
}

/// 单任务离线决策
pub fn offline_decision(task: &TaskAchievementDelta, params: &OfflineRolloverParams) -> RolloverDecision {
    let diff = task.diff();
    let tolerance = params.tolerance.max(0.0);

    let (action, amount, reason) = if diff < -tolerance {
        (
            RolloverAction::Rollover,
            diff.abs(),
            format!(
                "shortage of {} {} exceeds tolerance {}",
                fmt_amount(diff.abs()),
                task.target_unit,
                fmt_amount(tolerance)
            ),
        )
    } else if diff > tolerance {
        (
            RolloverAction::Balance,
            diff.abs(),
            format!(
                "surplus of {} {} exceeds tolerance {}",
                fmt_amount(diff.abs()),
                task.target_unit,
                fmt_amount(tolerance)
            ),
        )
    } else {
        (
            RolloverAction::None,
            0.0,
            format!("difference {} within tolerance {}", fmt_amount(diff), fmt_amount(tolerance)),
        )
    };

    let rate = task.effective_rate(params.fallback_rate);

    RolloverDecision {
        task_id: task.task_id.clone(),
        product_name: task.product_name.clone(),
        action,
        amount_to_transfer: amount,
        time_to_transfer_hours: Some(amount / rate),
        reason,
    }
}

/// 离线滚动算法
pub fn offline_rollover(tasks: &[TaskAchievementDelta], params: &OfflineRolloverParams) -> RolloverOutcome {
    let decisions: Vec<RolloverDecision> = tasks.iter().map(|t| offline_decision(t, params)).collect();

    let summary = if decisions.is_empty() {
        "Offline estimate: no tasks to evaluate".to_string()
    } else {
        let parts: Vec<String> = decisions.iter().map(describe_decision).collect();
        format!("Offline estimate: {}", parts.join("; "))
    };

    RolloverOutcome::offline(decisions, summary)
}

/// 单条决策的可读描述
pub(crate) fn describe_decision(decision: &RolloverDecision) -> String {
    let hours = decision.time_to_transfer_hours.unwrap_or(0.0);
    match decision.action {
        RolloverAction::None => format!("{} ({}): no transfer", decision.task_id, decision.product_name),
        action => format!(
            "{} ({}): {} {} (~{:.2}h)",
            decision.task_id,
            decision.product_name,
            action,
            fmt_amount(decision.amount_to_transfer),
            hours
        ),
    }
}

fn fmt_amount(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}
