// ==========================================
// 车间停机工时核算 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::config::fault_rule_table::FaultRuleTable;
use crate::config::settings::{
    BackendDescriptor, DEFAULT_ATTEMPT_TIMEOUT_SECS, DEFAULT_REST_DAY,
    DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_ROLLOVER_FALLBACK_RATE, DEFAULT_ROLLOVER_TOLERANCE,
};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::fault::FaultRule;
use async_trait::async_trait;
use chrono::Weekday;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            ensure_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 写入故障规则表（序列化为 JSON，写入前校验）
    pub fn set_fault_rules(&self, rules: &[FaultRule]) -> Result<(), Box<dyn Error>> {
        FaultRuleTable::from_rules(rules.to_vec())?;
        let raw = serde_json::to_string(rules)?;
        self.set_global_value(config_keys::FAULT_RULES, &raw)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 结算结果归档时记录当时生效的配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            let affected = tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            count += affected;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 解析 JSON 形式的推理服务描述，格式错误时告警并使用默认值
    fn get_backend_or_default(
        &self,
        key: &str,
        default: BackendDescriptor,
    ) -> Result<BackendDescriptor, Box<dyn Error>> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match serde_json::from_str::<BackendDescriptor>(&raw) {
            Ok(descriptor) => Ok(descriptor),
            Err(e) => {
                tracing::warn!(
                    config_key = key,
                    error = %e,
                    "推理服务配置格式错误，使用默认配置"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// EngineConfigReader Trait 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_weekly_rest_day(&self) -> Result<Weekday, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::WEEKLY_REST_DAY, "Fri")?;
        match value.trim().parse::<Weekday>() {
            Ok(day) => Ok(day),
            Err(_) => {
                tracing::warn!(
                    config_key = config_keys::WEEKLY_REST_DAY,
                    raw_value = %value,
                    "休息日配置无法解析，使用默认值"
                );
                Ok(DEFAULT_REST_DAY)
            }
        }
    }

    async fn get_fault_rules(&self) -> Result<FaultRuleTable, Box<dyn Error>> {
        // 规则表缺失用内置表; 存在但非法则直接报错, 不静默降级
        match self.get_config_value(config_keys::FAULT_RULES)? {
            None => Ok(FaultRuleTable::builtin()),
            Some(raw) => {
                let rules: Vec<FaultRule> = serde_json::from_str(&raw)?;
                Ok(FaultRuleTable::from_rules(rules)?)
            }
        }
    }

    async fn get_rollover_tolerance(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::ROLLOVER_TOLERANCE, "5")?;
        Ok(value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(DEFAULT_ROLLOVER_TOLERANCE))
    }

    async fn get_rollover_fallback_rate(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::ROLLOVER_FALLBACK_RATE, "100")?;
        Ok(value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_ROLLOVER_FALLBACK_RATE))
    }

    async fn get_retry_max_attempts(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::RETRY_MAX_ATTEMPTS, "3")?;
        Ok(value
            .parse::<u32>()
            .ok()
            .filter(|v| *v >= 1)
            .unwrap_or(DEFAULT_RETRY_MAX_ATTEMPTS))
    }

    async fn get_attempt_timeout_secs(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::RETRY_ATTEMPT_TIMEOUT_SECS, "30")?;
        Ok(value
            .parse::<u64>()
            .ok()
            .filter(|v| *v >= 1)
            .unwrap_or(DEFAULT_ATTEMPT_TIMEOUT_SECS))
    }

    async fn get_primary_backend(&self) -> Result<BackendDescriptor, Box<dyn Error>> {
        self.get_backend_or_default(
            config_keys::REASONING_PRIMARY,
            BackendDescriptor::default_primary(),
        )
    }

    async fn get_fallback_backend(&self) -> Result<BackendDescriptor, Box<dyn Error>> {
        self.get_backend_or_default(
            config_keys::REASONING_FALLBACK,
            BackendDescriptor::default_fallback(),
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 班次日历
    pub const WEEKLY_REST_DAY: &str = "weekly_rest_day";

    // 故障规则表 (JSON)
    pub const FAULT_RULES: &str = "fault_rules";

    // 离线滚动算法
    pub const ROLLOVER_TOLERANCE: &str = "rollover_tolerance";
    pub const ROLLOVER_FALLBACK_RATE: &str = "rollover_fallback_rate";

    // 推理服务调用
    pub const RETRY_MAX_ATTEMPTS: &str = "retry_max_attempts";
    pub const RETRY_ATTEMPT_TIMEOUT_SECS: &str = "retry_attempt_timeout_secs";
    pub const REASONING_PRIMARY: &str = "reasoning_primary";     // JSON
    pub const REASONING_FALLBACK: &str = "reasoning_fallback";   // JSON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{BackendKind, EngineSettings};

    fn in_memory_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_config_missing() {
        let manager = in_memory_manager();
        let settings = EngineSettings::load(&manager).await.unwrap();

        assert_eq!(settings.rest_day, Weekday::Fri);
        assert_eq!(settings.rollover_tolerance, 5.0);
        assert_eq!(settings.rollover_fallback_rate, 100.0);
        assert_eq!(settings.retry_max_attempts, 3);
        assert_eq!(settings.attempt_timeout_secs, 30);
        assert_eq!(*settings.fault_rules, FaultRuleTable::builtin());
        assert_eq!(settings.fallback_backend.kind, BackendKind::Ollama);
    }

    #[tokio::test]
    async fn test_overrides_are_read() {
        let manager = in_memory_manager();
        manager.set_global_value(config_keys::WEEKLY_REST_DAY, "Sunday").unwrap();
        manager.set_global_value(config_keys::ROLLOVER_TOLERANCE, "2.5").unwrap();
        manager.set_global_value(config_keys::RETRY_MAX_ATTEMPTS, "5").unwrap();
        manager
            .set_fault_rules(&[FaultRule::per_unit("04", "滚筒", 30.0, None)])
            .unwrap();

        assert_eq!(manager.get_weekly_rest_day().await.unwrap(), Weekday::Sun);
        assert_eq!(manager.get_rollover_tolerance().await.unwrap(), 2.5);
        assert_eq!(manager.get_retry_max_attempts().await.unwrap(), 5);
        let rules = manager.get_fault_rules().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules.get("04").is_some());
    }

    #[tokio::test]
    async fn test_invalid_scalar_values_fall_back_to_defaults() {
        let manager = in_memory_manager();
        manager.set_global_value(config_keys::WEEKLY_REST_DAY, "someday").unwrap();
        manager.set_global_value(config_keys::ROLLOVER_FALLBACK_RATE, "-1").unwrap();
        manager.set_global_value(config_keys::REASONING_PRIMARY, "{not json").unwrap();

        assert_eq!(manager.get_weekly_rest_day().await.unwrap(), Weekday::Fri);
        assert_eq!(manager.get_rollover_fallback_rate().await.unwrap(), 100.0);
        assert_eq!(
            manager.get_primary_backend().await.unwrap(),
            BackendDescriptor::default_primary()
        );
    }

    #[tokio::test]
    async fn test_invalid_fault_rules_are_rejected() {
        let manager = in_memory_manager();
        manager
            .set_global_value(config_keys::FAULT_RULES, r#"[{"code":"ABC","standard_minutes":5}]"#)
            .unwrap();
        assert!(manager.get_fault_rules().await.is_err());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let manager = in_memory_manager();
        manager.set_global_value(config_keys::ROLLOVER_TOLERANCE, "7").unwrap();
        let snapshot = manager.get_config_snapshot().unwrap();

        let other = in_memory_manager();
        assert_eq!(other.restore_config_from_snapshot(&snapshot).unwrap(), 1);
        assert_eq!(
            other.get_config_value(config_keys::ROLLOVER_TOLERANCE).unwrap(),
            Some("7".to_string())
        );
    }
}
