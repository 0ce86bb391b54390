// ==========================================
// 车间停机工时核算 - 配置层
// ==========================================
// 职责: 系统配置管理（故障规则表 / 班次日历 / 推理服务调用参数）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_config_trait;
pub mod fault_rule_table;
pub mod settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config_trait::EngineConfigReader;
pub use fault_rule_table::{FaultRuleTable, FaultRuleTableError};
pub use settings::{BackendDescriptor, BackendKind, EngineSettings};
