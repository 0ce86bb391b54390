// ==========================================
// 车间停机工时核算 - 故障规则表
// ==========================================
// 职责: 故障代码 -> 规则 的只读映射, 启动时注入
// 红线: 运行期不可变; 按数量与按订单两种放大不得同时声明
// ==========================================

use crate::domain::fault::{normalize_fault_code, FaultRule};
use std::collections::HashMap;
use thiserror::Error;

/// 规则表校验错误
#[derive(Error, Debug, PartialEq)]
pub enum FaultRuleTableError {
    #[error("故障代码格式错误(须为两位数字): {0}")]
    InvalidCode(String),

    #[error("故障代码重复: {0}")]
    DuplicateCode(String),

    #[error("规则冲突(按订单与按数量不可同时声明): {0}")]
    ConflictingScaling(String),

    #[error("规则工时非法: code={code}, field={field}, value={value}")]
    InvalidMinutes {
        code: String,
        field: String,
        value: f64,
    },
}

// ==========================================
// FaultRuleTable - 故障规则表
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct FaultRuleTable {
    rules: HashMap<String, FaultRule>,
}

impl FaultRuleTable {
    /// 从规则列表构建并校验
    pub fn from_rules(rules: Vec<FaultRule>) -> Result<Self, FaultRuleTableError> {
        let mut map = HashMap::with_capacity(rules.len());

        for mut rule in rules {
            rule.code = normalize_fault_code(&rule.code);
            validate_rule(&rule)?;
            if map.contains_key(&rule.code) {
                return Err(FaultRuleTableError::DuplicateCode(rule.code));
            }
            map.insert(rule.code.clone(), rule);
        }

        Ok(Self { rules: map })
    }

    /// 内置默认规则表
    pub fn builtin() -> Self {
        let rules = builtin_rules()
            .into_iter()
            .map(|r| (r.code.clone(), r))
            .collect();
        Self { rules }
    }

    /// 跳过校验构建
    #[cfg(test)]
    pub(crate) fn from_unchecked(rules: Vec<FaultRule>) -> Self {
        Self {
            rules: rules.into_iter().map(|r| (r.code.clone(), r)).collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<&FaultRule> {
        self.rules.get(code)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按代码排序的规则列表
    pub fn sorted_rules(&self) -> Vec<&FaultRule> {
        let mut rules: Vec<&FaultRule> = self.rules.values().collect();
        rules.sort_by(|a, b| a.code.cmp(&b.code));
        rules
    }
}

impl Default for FaultRuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_rule(rule: &FaultRule) -> Result<(), FaultRuleTableError> {
    let code = &rule.code;
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(FaultRuleTableError::InvalidCode(code.clone()));
    }

    if !rule.standard_minutes.is_finite() || rule.standard_minutes < 0.0 {
        return Err(FaultRuleTableError::InvalidMinutes {
            code: code.clone(),
            field: "standard_minutes".to_string(),
            value: rule.standard_minutes,
        });
    }

    if let Some(per_unit) = &rule.per_unit {
        if rule.is_per_order {
            return Err(FaultRuleTableError::ConflictingScaling(code.clone()));
        }
        if !per_unit.unit_minutes.is_finite() || per_unit.unit_minutes <= 0.0 {
            return Err(FaultRuleTableError::InvalidMinutes {
                code: code.clone(),
                field: "unit_minutes".to_string(),
                value: per_unit.unit_minutes,
            });
        }
        if let Some(default) = per_unit.default_minutes_if_unspecified {
            if !default.is_finite() || default < 0.0 {
                return Err(FaultRuleTableError::InvalidMinutes {
                    code: code.clone(),
                    field: "default_minutes_if_unspecified".to_string(),
                    value: default,
                });
            }
        }
    }

    Ok(())
}

/// 内置规则
fn builtin_rules() -> Vec<FaultRule> {
    vec![
        FaultRule::fixed("01", "换模", 60.0),
        FaultRule::per_order("02", "订单切换调机", 15.0),
        FaultRule::variable("03", "缺料等待"),
        FaultRule::per_unit("04", "更换滚筒", 30.0, None),
        FaultRule::per_unit("05", "更换轴", 20.0, Some(45.0)),
        FaultRule::per_order("06", "订单首检", 10.0),
        FaultRule::fixed("07", "清洁", 20.0),
        FaultRule::variable("08", "停电"),
        FaultRule::variable("09", "报修等待"),
        FaultRule::per_unit("10", "模具检查", 25.0, None),
    ]
}
