// ==========================================
// 车间停机工时核算 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod fault;
pub mod rollover;
pub mod shift;
pub mod types;

// 重导出核心类型
pub use fault::{
    normalize_fault_code, ExtraTimeResult, FaultEvaluation, FaultOccurrence, FaultRule,
    PerUnitRule, ReportedFault, StoredFaultRecord,
};
pub use rollover::{
    effective_rate, CurrentShiftReport, NextShiftPlan, PlannedTask, RolloverDecision,
    RolloverOutcome, TaskAchievementDelta,
};
pub use shift::{ScoreResult, ShiftKey, ShiftMetrics, ShiftSlot, TaskScore};
pub use types::{DecisionSource, FaultKind, PerformanceStatus, RolloverAction};
