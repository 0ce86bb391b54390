// ==========================================
// 车间停机工时核算 - 故障领域模型
// ==========================================
// 职责: 故障规则 / 故障发生记录 / 工时核算结果
// 红线: 不含核算逻辑 (核算见 engine::extra_time)
// ==========================================

use crate::domain::types::FaultKind;
use serde::{Deserialize, Serialize};

// ==========================================
// PerUnitRule - 按数量计时规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerUnitRule {
    /// 单件标准工时（分钟）
    pub unit_minutes: f64,
    /// 未上报数量时采用的默认工时（分钟）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_minutes_if_unspecified: Option<f64>,
}

// ==========================================
// FaultRule - 故障规则（进程级只读配置）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultRule {
    /// 故障代码（两位数字）
    pub code: String,
    /// 故障名称
    #[serde(default)]
    pub name: String,
    /// 标准允许工时（分钟），0 表示开放式故障
    pub standard_minutes: f64,
    /// 是否按在制订单数放大
    #[serde(default)]
    pub is_per_order: bool,
    /// 按数量计时配置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_unit: Option<PerUnitRule>,
}

impl FaultRule {
    /// 固定工时规则
    pub fn fixed(code: &str, name: &str, standard_minutes: f64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            standard_minutes,
            is_per_order: false,
            per_unit: None,
        }
    }

    /// 按订单数放大的规则
    pub fn per_order(code: &str, name: &str, standard_minutes: f64) -> Self {
        Self {
            is_per_order: true,
            ..Self::fixed(code, name, standard_minutes)
        }
    }

    /// 按数量计时的规则
    pub fn per_unit(
        code: &str,
        name: &str,
        unit_minutes: f64,
        default_minutes_if_unspecified: Option<f64>,
    ) -> Self {
        Self {
            per_unit: Some(PerUnitRule {
                unit_minutes,
                default_minutes_if_unspecified,
            }),
            ..Self::fixed(code, name, unit_minutes)
        }
    }

    /// 开放式故障（无标准工时）
    pub fn variable(code: &str, name: &str) -> Self {
        Self::fixed(code, name, 0.0)
    }

    /// 故障类别
    pub fn kind(&self) -> FaultKind {
        if self.standard_minutes <= 0.0 {
            FaultKind::Variable
        } else if self.per_unit.is_some() {
            FaultKind::PerUnit
        } else if self.is_per_order {
            FaultKind::PerOrder
        } else {
            FaultKind::Fixed
        }
    }
}

/// 规范化故障代码: 去空白, 单个数字补零 ("5" -> "05")
pub fn normalize_fault_code(raw: &str) -> String {
    let code = raw.trim();
    if code.len() == 1 && code.chars().all(|c| c.is_ascii_digit()) {
        format!("0{}", code)
    } else {
        code.to_string()
    }
}

// ==========================================
// ReportedFault - 技术员上报的故障（外部输入形状）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedFault {
    pub code: String,
    pub reported_minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
}

impl ReportedFault {
    /// 绑定班次上下文（在制订单数）
    pub fn into_occurrence(self, active_order_count: i32) -> FaultOccurrence {
        FaultOccurrence {
            code: normalize_fault_code(&self.code),
            reported_minutes: self.reported_minutes,
            quantity: self.quantity.unwrap_or(1),
            active_order_count,
        }
    }
}

// ==========================================
// FaultOccurrence - 故障发生记录
// ==========================================
// quantity / active_order_count 的非法值由核算器钳位, 此处不校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultOccurrence {
    pub code: String,
    pub reported_minutes: f64,
    pub quantity: i32,
    pub active_order_count: i32,
}

impl FaultOccurrence {
    pub fn new(code: &str, reported_minutes: f64) -> Self {
        Self {
            code: normalize_fault_code(code),
            reported_minutes,
            quantity: 1,
            active_order_count: 1,
        }
    }

    pub fn with_quantity(mut self, quantity: i32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_active_orders(mut self, active_order_count: i32) -> Self {
        self.active_order_count = active_order_count;
        self
    }
}

// ==========================================
// ExtraTimeResult - 单次故障核算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraTimeResult {
    /// 允许工时（分钟）
    pub allowed_minutes: f64,
    /// 延误工时（分钟）
    pub delay_minutes: f64,
    /// 是否计罚 (= delay_minutes > 0)
    pub counts_as_penalty: bool,
    pub kind: FaultKind,
    pub reason: String,
}

// ==========================================
// FaultEvaluation - 故障核算明细（返回调用方 / 持久化）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEvaluation {
    pub occurrence: FaultOccurrence,
    pub result: ExtraTimeResult,
    /// 计入班次扣减的工时
    pub debited_minutes: f64,
}

impl FaultEvaluation {
    /// 转换为持久化行（供 aggregate_from_stored 使用）
    pub fn to_stored_record(&self) -> StoredFaultRecord {
        StoredFaultRecord {
            fault_code: self.occurrence.code.clone(),
            reported_minutes: self.occurrence.reported_minutes,
            allowed_minutes: self.result.allowed_minutes,
            delay_minutes: self.result.delay_minutes,
        }
    }
}

// ==========================================
// StoredFaultRecord - 已持久化的故障核算行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFaultRecord {
    pub fault_code: String,
    pub reported_minutes: f64,
    pub allowed_minutes: f64,
    pub delay_minutes: f64,
}
