// ==========================================
// 车间停机工时核算 - 故障核算明细仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 主键语义: (operator_id, shift_date, shift_name) 下按 seq_no 排序
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::fault::{FaultEvaluation, StoredFaultRecord};
use crate::domain::shift::ShiftKey;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// FaultEvaluationRepository
// ==========================================
/// 职责: 管理 fault_evaluation 表
/// 同一班次的重复结算由调用方串行化; replace_for_shift 保证单次写入原子
pub struct FaultEvaluationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FaultEvaluationRepository {
    /// 打开数据库并确保表存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 覆盖写入某班次的全部故障核算明细
    ///
    /// # 返回
    /// 写入行数
    pub fn replace_for_shift(
        &self,
        shift: &ShiftKey,
        evaluations: &[FaultEvaluation],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let shift_date = shift.shift_date.to_string();
        let removed = tx.execute(
            "DELETE FROM fault_evaluation WHERE operator_id = ?1 AND shift_date = ?2 AND shift_name = ?3",
            params![shift.operator_id, shift_date, shift.shift_name],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO fault_evaluation (
                    record_id, operator_id, shift_date, shift_name, seq_no,
                    fault_code, reported_minutes, quantity, active_order_count,
                    allowed_minutes, delay_minutes, reason
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;

            for (seq_no, evaluation) in evaluations.iter().enumerate() {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    shift.operator_id,
                    shift_date,
                    shift.shift_name,
                    seq_no as i64,
                    evaluation.occurrence.code,
                    evaluation.occurrence.reported_minutes,
                    evaluation.occurrence.quantity,
                    evaluation.occurrence.active_order_count,
                    evaluation.result.allowed_minutes,
                    evaluation.result.delay_minutes,
                    evaluation.result.reason,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(
            operator_id = %shift.operator_id,
            shift_date = %shift_date,
            shift_name = %shift.shift_name,
            removed,
            inserted = evaluations.len(),
            "故障核算明细已覆盖写入"
        );
        Ok(evaluations.len())
    }

    /// 读取某班次的故障核算行（按上报顺序）
    pub fn list_for_shift(&self, shift: &ShiftKey) -> RepositoryResult<Vec<StoredFaultRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT fault_code, reported_minutes, allowed_minutes, delay_minutes
            FROM fault_evaluation
            WHERE operator_id = ?1 AND shift_date = ?2 AND shift_name = ?3
            ORDER BY seq_no ASC
            "#,
        )?;

        let rows = stmt.query_map(
            params![shift.operator_id, shift.shift_date.to_string(), shift.shift_name],
            |row| {
                Ok(StoredFaultRecord {
                    fault_code: row.get(0)?,
                    reported_minutes: row.get(1)?,
                    allowed_minutes: row.get(2)?,
                    delay_minutes: row.get(3)?,
                })
            },
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// 删除某班次的全部明细, 返回删除行数
    pub fn delete_for_shift(&self, shift: &ShiftKey) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let removed = conn.execute(
            "DELETE FROM fault_evaluation WHERE operator_id = ?1 AND shift_date = ?2 AND shift_name = ?3",
            params![shift.operator_id, shift.shift_date.to_string(), shift.shift_name],
        )?;
        Ok(removed)
    }
}
