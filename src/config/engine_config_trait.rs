// ==========================================
// 车间停机工时核算 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::fault_rule_table::FaultRuleTable;
use crate::config::settings::BackendDescriptor;
use async_trait::async_trait;
use chrono::Weekday;
use std::error::Error;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    // ===== 班次日历 =====

    /// 获取每周休息日（该日为两班制 12 小时班）
    ///
    /// # 默认值
    /// - Fri
    async fn get_weekly_rest_day(&self) -> Result<Weekday, Box<dyn Error>>;

    // ===== 故障规则 =====

    /// 获取故障规则表
    ///
    /// # 默认值
    /// - 内置规则表
    async fn get_fault_rules(&self) -> Result<FaultRuleTable, Box<dyn Error>>;

    // ===== 滚动决策 =====

    /// 获取离线滚动算法的容差（件）
    ///
    /// # 默认值
    /// - 5.0
    async fn get_rollover_tolerance(&self) -> Result<f64, Box<dyn Error>>;

    /// 获取无法推导产能时的中性产能（件/小时）
    ///
    /// # 默认值
    /// - 100.0
    async fn get_rollover_fallback_rate(&self) -> Result<f64, Box<dyn Error>>;

    // ===== 推理服务调用 =====

    /// 获取主推理服务最大尝试次数
    ///
    /// # 默认值
    /// - 3
    async fn get_retry_max_attempts(&self) -> Result<u32, Box<dyn Error>>;

    /// 获取单次调用超时（秒）
    ///
    /// # 默认值
    /// - 30
    async fn get_attempt_timeout_secs(&self) -> Result<u64, Box<dyn Error>>;

    /// 获取主推理服务描述
    async fn get_primary_backend(&self) -> Result<BackendDescriptor, Box<dyn Error>>;

    /// 获取备用推理服务描述
    async fn get_fallback_backend(&self) -> Result<BackendDescriptor, Box<dyn Error>>;
}
