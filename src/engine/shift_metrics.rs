// ==========================================
// 车间停机工时核算 - 班次工时汇总
// ==========================================
// 职责: 故障集合 -> 班次级 允许工时 / 延误工时 / 有效工作时间
// 入口:
// - aggregate: 从原始故障属性重算
// - aggregate_from_stored: 信任已持久化的允许/延误工时
// 红线: 两个入口共用同一折叠规则, 结果必须一致
// ==========================================

use crate::domain::fault::{FaultEvaluation, FaultOccurrence, StoredFaultRecord};
use crate::domain::shift::ShiftMetrics;
use crate::engine::extra_time::{sanitize_minutes, ExtraTimeCalculator};
use crate::engine::shift_calendar::ShiftCalendar;
use chrono::NaiveDate;
use tracing::instrument;

/// 单条故障计入班次扣减的工时
///
/// - 开放式故障（允许工时为 0）: 全额计入上报时长
/// - 其他: min(允许工时, 上报时长), 提前完成只扣实际用时
pub fn debited_minutes(reported_minutes: f64, allowed_minutes: f64) -> f64 {
    let reported = sanitize_minutes(reported_minutes);
    if allowed_minutes <= 0.0 {
        reported
    } else {
        allowed_minutes.min(reported)
    }
}

/// 折叠累加器
#[derive(Debug, Default)]
struct Totals {
    allowed: f64,
    delay: f64,
}

impl Totals {
    fn add(&mut self, reported_minutes: f64, allowed_minutes: f64, delay_minutes: f64) {
        self.allowed += debited_minutes(reported_minutes, allowed_minutes);
        if delay_minutes > 0.0 {
            self.delay += delay_minutes;
        }
    }

    fn into_metrics(self, shift_duration_minutes: f64) -> ShiftMetrics {
        ShiftMetrics {
            shift_duration_minutes,
            total_allowed_minutes: self.allowed,
            total_delay_minutes: self.delay,
            effective_working_minutes: (shift_duration_minutes - self.allowed).max(0.0),
        }
    }
}

// ==========================================
// ShiftMetricsAggregator - 班次工时汇总器
// ==========================================
#[derive(Debug, Clone)]
pub struct ShiftMetricsAggregator {
    calculator: ExtraTimeCalculator,
    calendar: ShiftCalendar,
}

impl ShiftMetricsAggregator {
    pub fn new(calculator: ExtraTimeCalculator, calendar: ShiftCalendar) -> Self {
        Self {
            calculator,
            calendar,
        }
    }

    pub fn calculator(&self) -> &ExtraTimeCalculator {
        &self.calculator
    }

    pub fn calendar(&self) -> &ShiftCalendar {
        &self.calendar
    }

    /// 逐条核算故障, 返回明细
    pub fn evaluate(&self, occurrences: &[FaultOccurrence]) -> Vec<FaultEvaluation> {
        occurrences
            .iter()
            .map(|occurrence| {
                let result = self.calculator.compute(occurrence);
                let debited = debited_minutes(occurrence.reported_minutes, result.allowed_minutes);
                FaultEvaluation {
                    occurrence: occurrence.clone(),
                    result,
                    debited_minutes: debited,
                }
            })
            .collect()
    }

    /// 从原始故障属性重算班次指标
    #[instrument(skip(self, occurrences), fields(count = occurrences.len()))]
    pub fn aggregate(&self, occurrences: &[FaultOccurrence], date: NaiveDate) -> ShiftMetrics {
        let mut totals = Totals::default();
        for occurrence in occurrences {
            let result = self.calculator.compute(occurrence);
            totals.add(
                occurrence.reported_minutes,
                result.allowed_minutes,
                result.delay_minutes,
            );
        }
        totals.into_metrics(self.duration(date))
    }

    /// 从已核算明细汇总（明细由 evaluate 产生）
    pub fn aggregate_evaluations(
        &self,
        evaluations: &[FaultEvaluation],
        date: NaiveDate,
    ) -> ShiftMetrics {
        let mut totals = Totals::default();
        for evaluation in evaluations {
            totals.add(
                evaluation.occurrence.reported_minutes,
                evaluation.result.allowed_minutes,
                evaluation.result.delay_minutes,
            );
        }
        totals.into_metrics(self.duration(date))
    }

    /// 从已持久化的核算行汇总（不重新核算）
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn aggregate_from_stored(
        &self,
        records: &[StoredFaultRecord],
        date: NaiveDate,
    ) -> ShiftMetrics {
        let mut totals = Totals::default();
        for record in records {
            totals.add(
                record.reported_minutes,
                record.allowed_minutes,
                record.delay_minutes,
            );
        }
        totals.into_metrics(self.duration(date))
    }

    fn duration(&self, date: NaiveDate) -> f64 {
        self.calendar.shift_duration_minutes(date) as f64
    }
}
