// ==========================================
// 车间停机工时核算 - 引擎层
// ==========================================
// 职责: 停机工时核算 / 班次汇总 / 达成评分 / 滚动决策
// 红线: Engine 不拼 SQL, 核算结果必须输出 reason
// ==========================================

pub mod achievement;
pub mod extra_time;
pub mod orchestrator;
pub mod rollover;
pub mod shift_calendar;
pub mod shift_metrics;

// 重导出核心引擎
pub use achievement::AchievementScorer;
pub use extra_time::ExtraTimeCalculator;
pub use orchestrator::{ShiftFinalization, ShiftFinalizationRequest, ShiftFinalizer};
pub use rollover::{offline_rollover, OfflineRolloverParams, RolloverEngine};
pub use shift_calendar::ShiftCalendar;
pub use shift_metrics::{debited_minutes, ShiftMetricsAggregator};
