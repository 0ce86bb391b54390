// ==========================================
// 车间停机工时核算 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod fault_evaluation_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use fault_evaluation_repo::FaultEvaluationRepository;
