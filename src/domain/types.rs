// ==========================================
// 车间停机工时核算 - 领域类型定义
// ==========================================
// 故障类别 / 滚动动作 / 绩效等级 / 决策来源
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 故障类别 (Fault Kind)
// ==========================================
// 由 FaultRule 推导, 不单独存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultKind {
    Fixed,    // 固定标准工时
    PerOrder, // 按在制订单数放大
    PerUnit,  // 按技术员上报数量放大
    Variable, // 无标准工时, 不计罚
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Fixed => write!(f, "FIXED"),
            FaultKind::PerOrder => write!(f, "PER_ORDER"),
            FaultKind::PerUnit => write!(f, "PER_UNIT"),
            FaultKind::Variable => write!(f, "VARIABLE"),
        }
    }
}

// ==========================================
// 滚动动作 (Rollover Action)
// ==========================================
// 序列化格式: lowercase (与推理服务 JSON 契约一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloverAction {
    Rollover, // 欠产顺延到后续班次
    Balance,  // 超产抵扣后续班次目标
    None,     // 不处理
}

impl RolloverAction {
    /// 宽松解析（大小写不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rollover" => Some(RolloverAction::Rollover),
            "balance" => Some(RolloverAction::Balance),
            "none" => Some(RolloverAction::None),
            _ => None,
        }
    }
}

impl fmt::Display for RolloverAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RolloverAction::Rollover => write!(f, "rollover"),
            RolloverAction::Balance => write!(f, "balance"),
            RolloverAction::None => write!(f, "none"),
        }
    }
}

// ==========================================
// 绩效等级 (Performance Status)
// ==========================================
// 红线: 等级只由 overall_score 分桶, 延误时间不参与
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformanceStatus {
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    #[serde(rename = "Average")]
    Average,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    #[serde(rename = "Excellent")]
    Excellent,
}

impl PerformanceStatus {
    /// 按综合得分分桶
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 100 => PerformanceStatus::Excellent,
            s if s >= 80 => PerformanceStatus::VeryGood,
            s if s >= 60 => PerformanceStatus::Good,
            s if s >= 40 => PerformanceStatus::Average,
            _ => PerformanceStatus::NeedsImprovement,
        }
    }
}

impl fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceStatus::Excellent => write!(f, "Excellent"),
            PerformanceStatus::VeryGood => write!(f, "Very Good"),
            PerformanceStatus::Good => write!(f, "Good"),
            PerformanceStatus::Average => write!(f, "Average"),
            PerformanceStatus::NeedsImprovement => write!(f, "Needs Improvement"),
        }
    }
}

// ==========================================
// 决策来源 (Decision Source)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionSource {
    /// 远程推理服务给出的决策
    Remote { backend: String },
    /// 离线确定性算法兜底
    Offline,
}

impl DecisionSource {
    pub fn is_offline(&self) -> bool {
        matches!(self, DecisionSource::Offline)
    }
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionSource::Remote { backend } => write!(f, "REMOTE({})", backend),
            DecisionSource::Offline => write!(f, "OFFLINE"),
        }
    }
}
