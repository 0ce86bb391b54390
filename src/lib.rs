// ==========================================
// 车间停机工时核算 - 核心库
// ==========================================
// 职责: 停机工时核算 + 班次达成评分 + 滚动排产决策
// 技术栈: Rust + SQLite + 远程推理服务
// 系统定位: 决策支持（远程推理 + 确定性离线兜底）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 推理服务层 - 远程调用与重试降级
pub mod reasoning;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DecisionSource, FaultKind, PerformanceStatus, RolloverAction};

// 领域实体
pub use domain::{
    ExtraTimeResult, FaultEvaluation, FaultOccurrence, FaultRule, ReportedFault,
    RolloverDecision, RolloverOutcome, ShiftMetrics, StoredFaultRecord, TaskAchievementDelta,
};

// 引擎
pub use engine::{
    AchievementScorer, ExtraTimeCalculator, RolloverEngine, ShiftCalendar, ShiftFinalization,
    ShiftFinalizationRequest, ShiftFinalizer, ShiftMetricsAggregator,
};

// 配置
pub use config::{ConfigManager, EngineSettings, FaultRuleTable};

// 推理服务
pub use reasoning::{ReasoningClient, RetryPolicy};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车间停机工时核算";
