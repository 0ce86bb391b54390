// ==========================================
// 车间停机工时核算 - 滚动决策引擎
// ==========================================
// 职责: 对当班每个任务给出 rollover / balance / none 决策
// 输入: 当班任务达成差额 + 下一班已排任务
// 输出: RolloverOutcome（远程决策或离线估算）
// 红线: 远程推理失败/应答畸形 → 离线算法, 不向上抛错
// ==========================================

mod core;
pub mod offline;
mod request;
mod response;

#[cfg(test)]
mod tests;

pub use core::RolloverEngine;
pub use offline::{offline_decision, offline_rollover, OfflineRolloverParams};
pub use request::{RequestValidationError, RolloverRequest};
pub use response::{extract_json_object, ParsedRolloverResponse};
