// ==========================================
// 车间停机工时核算 - 班次结算编排器
// ==========================================
// 用途: 一次班次结算事件的完整流程
// 步骤: 日历 → 单故障核算 → 班次汇总 → 任务评分 → 滚动决策
// 红线: 结算不失败; 滚动决策异常时降级为离线估算
// ==========================================

use crate::config::settings::EngineSettings;
use crate::domain::fault::{FaultEvaluation, FaultOccurrence, ReportedFault};
use crate::domain::rollover::{
    CurrentShiftReport, NextShiftPlan, RolloverOutcome, TaskAchievementDelta,
};
use crate::domain::shift::{ShiftKey, ShiftMetrics, TaskScore};
use crate::engine::achievement::AchievementScorer;
use crate::engine::extra_time::ExtraTimeCalculator;
use crate::engine::rollover::{OfflineRolloverParams, RolloverEngine};
use crate::engine::shift_calendar::ShiftCalendar;
use crate::engine::shift_metrics::ShiftMetricsAggregator;
use crate::reasoning::ReasoningClient;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

// ==========================================
// ShiftFinalizationRequest - 班次结算请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftFinalizationRequest {
    pub operator_id: String,
    /// 缺省为本地当天
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub shift_name: String,
    /// 缺省为任务数（至少 1）
    #[serde(default)]
    pub active_order_count: Option<i32>,
    #[serde(default)]
    pub faults: Vec<ReportedFault>,
    #[serde(default)]
    pub tasks: Vec<TaskAchievementDelta>,
    /// 缺省按日历推导下一班（无已排任务）
    #[serde(default)]
    pub next_shift: Option<NextShiftPlan>,
}

// ==========================================
// ShiftFinalization - 班次结算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftFinalization {
    pub shift: ShiftKey,
    pub metrics: ShiftMetrics,
    pub fault_evaluations: Vec<FaultEvaluation>,
    pub task_scores: Vec<TaskScore>,
    pub rollover: RolloverOutcome,
}

// ==========================================
// ShiftFinalizer - 班次结算编排器
// ==========================================
pub struct ShiftFinalizer {
    aggregator: ShiftMetricsAggregator,
    scorer: AchievementScorer,
    rollover: RolloverEngine,
}

impl ShiftFinalizer {
    pub fn new(
        aggregator: ShiftMetricsAggregator,
        scorer: AchievementScorer,
        rollover: RolloverEngine,
    ) -> Self {
        Self {
            aggregator,
            scorer,
            rollover,
        }
    }

    /// 按引擎配置装配全部组件
    ///
    /// # 参数
    /// - settings: 引擎配置快照
    /// - client: 推理服务客户端; None 时滚动决策只走离线算法
    pub fn from_settings(settings: &EngineSettings, client: Option<ReasoningClient>) -> Self {
        let calendar = ShiftCalendar::new(settings.rest_day);
        let calculator = ExtraTimeCalculator::new(settings.fault_rules.clone());
        let params = OfflineRolloverParams {
            tolerance: settings.rollover_tolerance,
            fallback_rate: settings.rollover_fallback_rate,
        };
        let rollover = match client {
            Some(client) => RolloverEngine::new(client, calendar, params),
            None => RolloverEngine::offline_only(calendar, params),
        };

        Self::new(
            ShiftMetricsAggregator::new(calculator, calendar),
            AchievementScorer::new(),
            rollover,
        )
    }

    pub fn calendar(&self) -> &ShiftCalendar {
        self.aggregator.calendar()
    }

    /// 执行班次结算
    #[instrument(skip(self, request), fields(
        operator_id = %request.operator_id,
        shift = %request.shift_name,
        faults = request.faults.len(),
        tasks = request.tasks.len()
    ))]
    pub async fn finalize(&self, request: ShiftFinalizationRequest) -> ShiftFinalization {
        let date = request.date.unwrap_or_else(|| Local::now().date_naive());
        let active_orders = request
            .active_order_count
            .unwrap_or_else(|| request.tasks.len().max(1) as i32);

        // ==========================================
        // 步骤1: 单故障核算
        // ==========================================
        let occurrences: Vec<FaultOccurrence> = request
            .faults
            .into_iter()
            .map(|f| f.into_occurrence(active_orders))
            .collect();
        let fault_evaluations = self.aggregator.evaluate(&occurrences);
        debug!(evaluations = fault_evaluations.len(), "步骤1: 故障核算完成");

        // ==========================================
        // 步骤2: 班次汇总
        // ==========================================
        let metrics = self.aggregator.aggregate_evaluations(&fault_evaluations, date);
        debug!(
            allowed = metrics.total_allowed_minutes,
            delay = metrics.total_delay_minutes,
            effective = metrics.effective_working_minutes,
            "步骤2: 班次汇总完成"
        );

        // ==========================================
        // 步骤3: 任务评分
        // ==========================================
        let task_scores: Vec<TaskScore> = request
            .tasks
            .iter()
            .map(|t| self.scorer.score_task(t, &metrics))
            .collect();

        // ==========================================
        // 步骤4: 滚动决策
        // ==========================================
        let next = request
            .next_shift
            .unwrap_or_else(|| self.derive_next_shift(date, &request.shift_name));
        let current = CurrentShiftReport {
            shift_name: request.shift_name.clone(),
            date,
            tasks: request.tasks,
        };
        let rollover = self.rollover.decide(&current, &next).await;

        info!(
            date = %date,
            allowed = metrics.total_allowed_minutes,
            delay = metrics.total_delay_minutes,
            rollover_fallback = rollover.fallback,
            "班次结算完成"
        );

        ShiftFinalization {
            shift: ShiftKey::new(&request.operator_id, date, &request.shift_name),
            metrics,
            fault_evaluations,
            task_scores,
            rollover,
        }
    }

    fn derive_next_shift(&self, date: NaiveDate, shift_name: &str) -> NextShiftPlan {
        let (next_date, slot) = self.calendar().next_shift(date, shift_name);
        NextShiftPlan {
            name: slot.name,
            date: next_date,
            planned_tasks: Vec::new(),
        }
    }
}
