// ==========================================
// 车间停机工时核算 - 故障允许工时核算
// ==========================================
// 职责: 单次故障 (代码, 上报时长, 数量, 在制订单数) -> 允许工时 / 延误工时
// 红线: 工时扣减算法的唯一来源; 纯函数, 无隐藏状态; 所有结果必须输出 reason
// ==========================================
// 顺序: 查表 → 开放式判定 → 按订单放大 → 按数量覆写 → 计算延误
// ==========================================

use crate::config::fault_rule_table::FaultRuleTable;
use crate::domain::fault::{normalize_fault_code, ExtraTimeResult, FaultOccurrence};
use crate::domain::types::FaultKind;
use std::sync::Arc;

/// 上报时长清洗: 非有限值或负数按 0 处理
pub(crate) fn sanitize_minutes(minutes: f64) -> f64 {
    if minutes.is_finite() && minutes > 0.0 {
        minutes
    } else {
        0.0
    }
}

// ==========================================
// ExtraTimeCalculator - 允许工时核算器
// ==========================================
#[derive(Debug, Clone)]
pub struct ExtraTimeCalculator {
    rules: Arc<FaultRuleTable>,
}

impl ExtraTimeCalculator {
    pub fn new(rules: Arc<FaultRuleTable>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &FaultRuleTable {
        &self.rules
    }

    /// 核算一次故障
    pub fn compute(&self, occurrence: &FaultOccurrence) -> ExtraTimeResult {
        self.compute_extra_time(
            &occurrence.code,
            occurrence.reported_minutes,
            occurrence.quantity,
            occurrence.active_order_count,
        )
    }

    /// 核算一次故障（展开参数形式）
    ///
    /// # 规则
    /// 1) 未知代码按标准工时 0 处理
    /// 2) 标准工时为 0 → 开放式故障: 允许 0, 延误 0, 不计罚
    /// 3) 按订单: standard *= max(1, 在制订单数)
    /// 4) 按数量: 数量 ≤ 1 且有默认值 → 默认值（不再乘订单数）; 否则 单件工时 × 数量
    /// 5) 延误 = max(0, 上报 - 允许)
    ///
    /// # 边界处理
    /// - 单位数代码补零（"5" → "05"）
    /// - 数量 / 订单数 < 1 钳位为 1
    /// - 上报时长为负或非有限值按 0
    pub fn compute_extra_time(
        &self,
        code: &str,
        reported_minutes: f64,
        quantity: i32,
        active_order_count: i32,
    ) -> ExtraTimeResult {
        let code = normalize_fault_code(code);
        let code = code.as_str();
        let reported = sanitize_minutes(reported_minutes);
        let quantity = quantity.max(1);
        let orders = active_order_count.max(1);

        let rule = match self.rules.get(code) {
            Some(rule) if rule.standard_minutes > 0.0 => rule,
            Some(_) => {
                return variable_result(format!(
                    "VARIABLE: code={} has no standard time; reported {}min debited without penalty",
                    code,
                    fmt_minutes(reported)
                ))
            }
            None => {
                return variable_result(format!(
                    "UNKNOWN_CODE: code={} not in rule table, treated as variable; reported {}min",
                    code,
                    fmt_minutes(reported)
                ))
            }
        };

        let mut standard = rule.standard_minutes;
        let mut basis = format!("standard {}min", fmt_minutes(standard));

        if rule.is_per_order {
            standard *= orders as f64;
            basis = format!(
                "{}min x {} orders = {}min",
                fmt_minutes(rule.standard_minutes),
                orders,
                fmt_minutes(standard)
            );
        }

        if let Some(per_unit) = &rule.per_unit {
            match per_unit.default_minutes_if_unspecified {
                Some(default) if quantity <= 1 => {
                    standard = default;
                    basis = format!("quantity unspecified, default {}min", fmt_minutes(default));
                }
                _ => {
                    standard = per_unit.unit_minutes * quantity as f64;
                    basis = format!(
                        "{} x {}min = {}min",
                        quantity,
                        fmt_minutes(per_unit.unit_minutes),
                        fmt_minutes(standard)
                    );
                }
            }
        }

        let delay = (reported - standard).max(0.0);
        let counts_as_penalty = delay > 0.0;
        let kind = rule.kind();

        let verdict = if counts_as_penalty {
            format!("exceeded by {}min", fmt_minutes(delay))
        } else {
            "within allowance".to_string()
        };

        ExtraTimeResult {
            allowed_minutes: standard,
            delay_minutes: delay,
            counts_as_penalty,
            kind,
            reason: format!(
                "{}: code={}, {}; reported {}min, {}",
                kind,
                code,
                basis,
                fmt_minutes(reported),
                verdict
            ),
        }
    }
}

fn variable_result(reason: String) -> ExtraTimeResult {
    ExtraTimeResult {
        allowed_minutes: 0.0,
        delay_minutes: 0.0,
        counts_as_penalty: false,
        kind: FaultKind::Variable,
        reason,
    }
}

/// 整数分钟不带小数输出
fn fmt_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{}", minutes as i64)
    } else {
        format!("{:.2}", minutes)
    }
}
