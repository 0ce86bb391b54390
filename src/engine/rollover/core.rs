// ==========================================
// 车间停机工时核算 - 滚动决策引擎
// ==========================================
// 主路径: 结构化请求 → 推理服务（主服务重试 + 备用服务）→ 解析规整
// 兜底: 任一环节失败 → 离线算法（必定成功）
// ==========================================

use super::offline::{offline_decision, offline_rollover, OfflineRolloverParams};
use super::request::RolloverRequest;
use super::response::{normalize, ParsedRolloverResponse};
use crate::domain::rollover::{CurrentShiftReport, NextShiftPlan, RolloverDecision, RolloverOutcome};
use crate::engine::shift_calendar::ShiftCalendar;
use crate::reasoning::ReasoningClient;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

const OPERATION_NAME: &str = "rollover_decision";

// ==========================================
// RolloverEngine
// ==========================================
pub struct RolloverEngine {
    client: Option<ReasoningClient>,
    calendar: ShiftCalendar,
    params: OfflineRolloverParams,
}

impl RolloverEngine {
    pub fn new(client: ReasoningClient, calendar: ShiftCalendar, params: OfflineRolloverParams) -> Self {
        Self {
            client: Some(client),
            calendar,
            params,
        }
    }

    /// 仅使用离线算法（无推理服务可用时）
    pub fn offline_only(calendar: ShiftCalendar, params: OfflineRolloverParams) -> Self {
        Self {
            client: None,
            calendar,
            params,
        }
    }

    pub fn params(&self) -> &OfflineRolloverParams {
        &self.params
    }

    /// 生成滚动决策
    ///
    /// 不返回错误: 远程路径的所有失败均降级为离线估算, 结果中 fallback=true
    #[instrument(skip(self, current, next), fields(shift = %current.shift_name, tasks = current.tasks.len()))]
    pub async fn decide(&self, current: &CurrentShiftReport, next: &NextShiftPlan) -> RolloverOutcome {
        if current.tasks.is_empty() {
            return offline_rollover(&current.tasks, &self.params);
        }

        let Some(client) = &self.client else {
            info!("未配置推理服务, 使用离线估算");
            return offline_rollover(&current.tasks, &self.params);
        };

        let request = match RolloverRequest::build(current, next, &self.calendar, &self.params) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "滚动请求校验失败, 使用离线估算");
                return offline_rollover(&current.tasks, &self.params);
            }
        };
        let prompt = match request.to_prompt() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "滚动请求序列化失败, 使用离线估算");
                return offline_rollover(&current.tasks, &self.params);
            }
        };

        let Some(reply) = client.complete(OPERATION_NAME, &prompt).await else {
            warn!("推理服务主备均失败, 使用离线估算");
            return offline_rollover(&current.tasks, &self.params);
        };

        let Some(parsed) = ParsedRolloverResponse::parse(&reply.content) else {
            warn!(backend = %reply.backend, "推理服务应答无法解析, 使用离线估算");
            return offline_rollover(&current.tasks, &self.params);
        };

        let summary = parsed.summary().to_string();
        let decisions = normalize(parsed.into_decisions(), &current.tasks, self.params.fallback_rate);
        if decisions.is_empty() {
            warn!(backend = %reply.backend, "推理服务应答无有效决策, 使用离线估算");
            return offline_rollover(&current.tasks, &self.params);
        }

        let decisions = self.fill_missing(decisions, current);
        info!(backend = %reply.backend, decisions = decisions.len(), "滚动决策完成");
        RolloverOutcome::remote(&reply.backend, decisions, summary)
    }

    /// 远程应答遗漏的任务按离线算法补齐, 保持请求顺序
    fn fill_missing(
        &self,
        decisions: Vec<RolloverDecision>,
        current: &CurrentShiftReport,
    ) -> Vec<RolloverDecision> {
        let covered: HashSet<&str> = decisions.iter().map(|d| d.task_id.as_str()).collect();
        if covered.len() == current.tasks.len() {
            return decisions;
        }

        let missing: Vec<RolloverDecision> = current
            .tasks
            .iter()
            .filter(|t| !covered.contains(t.task_id.as_str()))
            .map(|t| offline_decision(t, &self.params))
            .collect();
        warn!(missing = missing.len(), "推理服务遗漏部分任务, 已按离线算法补齐");

        let mut by_id: HashMap<String, RolloverDecision> = decisions
            .into_iter()
            .chain(missing)
            .map(|d| (d.task_id.clone(), d))
            .collect();
        current
            .tasks
            .iter()
            .filter_map(|t| by_id.remove(&t.task_id))
            .collect()
    }
}
