// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use chrono::Weekday;
use shift_downtime_ledger::config::{BackendDescriptor, EngineConfigReader, FaultRuleTable};
use std::error::Error;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub rest_day: Weekday,
    pub fault_rules: FaultRuleTable,
    pub tolerance: f64,
    pub fallback_rate: f64,
    pub max_attempts: u32,
    pub attempt_timeout_secs: u64,
    pub primary: BackendDescriptor,
    pub fallback: BackendDescriptor,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            rest_day: Weekday::Fri,
            fault_rules: FaultRuleTable::builtin(),
            tolerance: 5.0,
            fallback_rate: 100.0,
            max_attempts: 3,
            attempt_timeout_secs: 30,
            primary: BackendDescriptor::default_primary(),
            fallback: BackendDescriptor::default_fallback(),
        }
    }

    /// 自定义休息日
    pub fn with_rest_day(rest_day: Weekday) -> Self {
        let mut config = Self::default();
        config.rest_day = rest_day;
        config
    }

    /// 自定义容差
    pub fn with_tolerance(tolerance: f64) -> Self {
        let mut config = Self::default();
        config.tolerance = tolerance;
        config
    }
}

#[async_trait]
impl EngineConfigReader for MockConfig {
    async fn get_weekly_rest_day(&self) -> Result<Weekday, Box<dyn Error>> {
        Ok(self.rest_day)
    }

    async fn get_fault_rules(&self) -> Result<FaultRuleTable, Box<dyn Error>> {
        Ok(self.fault_rules.clone())
    }

    async fn get_rollover_tolerance(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.tolerance)
    }

    async fn get_rollover_fallback_rate(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.fallback_rate)
    }

    async fn get_retry_max_attempts(&self) -> Result<u32, Box<dyn Error>> {
        Ok(self.max_attempts)
    }

    async fn get_attempt_timeout_secs(&self) -> Result<u64, Box<dyn Error>> {
        Ok(self.attempt_timeout_secs)
    }

    async fn get_primary_backend(&self) -> Result<BackendDescriptor, Box<dyn Error>> {
        Ok(self.primary.clone())
    }

    async fn get_fallback_backend(&self) -> Result<BackendDescriptor, Box<dyn Error>> {
        Ok(self.fallback.clone())
    }
}
