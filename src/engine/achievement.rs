// ==========================================
// 车间停机工时核算 - 任务达成评分
// ==========================================
// 职责: 名义目标 + 实际产出 + 班次允许故障工时 -> 0~100 综合得分 + 绩效等级
// 规则: 目标按可用生产时间等比折算; 延误工时只展示, 不影响得分
// ==========================================

use crate::domain::rollover::TaskAchievementDelta;
use crate::domain::shift::{ScoreResult, ShiftMetrics, TaskScore};
use crate::domain::types::PerformanceStatus;

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

// ==========================================
// AchievementScorer - 达成评分器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct AchievementScorer;

impl AchievementScorer {
    pub fn new() -> Self {
        Self
    }

    /// 计算达成评分
    ///
    /// # 规则
    /// 1) 实际工作时间 = max(0, 班次时长 - 允许故障工时)
    /// 2) 折算目标 = 目标 × 实际工作时间 / 班次时长
    /// 3) 达成率 = 折算目标 > 0 ? 产出 / 折算目标 × 100 : (产出 > 0 ? 100 : 0)
    /// 4) 综合得分 = min(100, round(达成率))
    ///
    /// 负数与非有限输入按 0 处理, 得分恒在 [0, 100]
    pub fn score(
        &self,
        target_amount: f64,
        actual_achievement: f64,
        allowed_fault_minutes: f64,
        delay_minutes: f64,
        shift_duration_minutes: f64,
    ) -> ScoreResult {
        let target = non_negative(target_amount);
        let actual = non_negative(actual_achievement);
        let allowed = non_negative(allowed_fault_minutes);
        let duration = non_negative(shift_duration_minutes);

        let actual_working_minutes = (duration - allowed).max(0.0);
        let ratio = if duration > 0.0 {
            actual_working_minutes / duration
        } else {
            0.0
        };
        let adjusted_target = target * ratio;

        let achievement_percent = if adjusted_target > 0.0 {
            actual / adjusted_target * 100.0
        } else if actual > 0.0 {
            100.0
        } else {
            0.0
        };

        let overall_score = achievement_percent.round().clamp(0.0, 100.0) as u8;

        ScoreResult {
            actual_working_minutes,
            adjusted_target,
            achievement_percent,
            overall_score,
            status: PerformanceStatus::from_score(overall_score),
            delay_minutes: non_negative(delay_minutes),
        }
    }

    /// 按班次指标为单个任务评分
    pub fn score_task(&self, task: &TaskAchievementDelta, metrics: &ShiftMetrics) -> TaskScore {
        TaskScore {
            task_id: task.task_id.clone(),
            product_name: task.product_name.clone(),
            score: self.score(
                task.target_amount,
                task.achieved_amount,
                metrics.total_allowed_minutes,
                metrics.total_delay_minutes,
                metrics.shift_duration_minutes,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_adjusted_for_fault_time() {
        let scorer = AchievementScorer::new();
        // 480 分钟班次扣 120 分钟 → 折算目标 75
        let r = scorer.score(100.0, 75.0, 120.0, 0.0, 480.0);
        assert_eq!(r.actual_working_minutes, 360.0);
        assert_eq!(r.adjusted_target, 75.0);
        assert_eq!(r.overall_score, 100);
        assert_eq!(r.status, PerformanceStatus::Excellent);
    }

    #[test]
    fn test_status_buckets_from_percent() {
        let scorer = AchievementScorer::new();
        assert_eq!(scorer.score(100.0, 85.0, 0.0, 0.0, 480.0).status, PerformanceStatus::VeryGood);
        assert_eq!(scorer.score(100.0, 60.0, 0.0, 0.0, 480.0).status, PerformanceStatus::Good);
        assert_eq!(scorer.score(100.0, 45.0, 0.0, 0.0, 480.0).status, PerformanceStatus::Average);
        assert_eq!(
            scorer.score(100.0, 10.0, 0.0, 0.0, 480.0).status,
            PerformanceStatus::NeedsImprovement
        );
    }

    #[test]
    fn test_score_capped_at_100() {
        let scorer = AchievementScorer::new();
        let r = scorer.score(100.0, 250.0, 0.0, 0.0, 480.0);
        assert_eq!(r.achievement_percent, 250.0);
        assert_eq!(r.overall_score, 100);
    }

    #[test]
    fn test_zero_adjusted_target() {
        let scorer = AchievementScorer::new();
        // 故障占满整个班次
        assert_eq!(scorer.score(100.0, 5.0, 600.0, 0.0, 480.0).overall_score, 100);
        assert_eq!(scorer.score(100.0, 0.0, 600.0, 0.0, 480.0).overall_score, 0);
        // 目标为 0
        assert_eq!(scorer.score(0.0, 0.0, 0.0, 0.0, 480.0).overall_score, 0);
    }

    #[test]
    fn test_delay_does_not_change_score() {
        let scorer = AchievementScorer::new();
        let a = scorer.score(100.0, 70.0, 60.0, 0.0, 480.0);
        let b = scorer.score(100.0, 70.0, 60.0, 240.0, 480.0);
        assert_eq!(a.overall_score, b.overall_score);
        assert_eq!(b.delay_minutes, 240.0);
    }

    #[test]
    fn test_score_always_within_bounds() {
        let scorer = AchievementScorer::new();
        let values = [0.0, 0.5, 1.0, 7.0, 99.5, 480.0, 1e6];
        for &target in &values {
            for &actual in &values {
                for &allowed in &values {
                    for &duration in &[0.0, 480.0, 720.0] {
                        let r = scorer.score(target, actual, allowed, 0.0, duration);
                        assert!(r.overall_score <= 100);
                    }
                }
            }
        }
    }
}
