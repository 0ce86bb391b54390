// ==========================================
// 车间停机工时核算 - 班次日历
// ==========================================
// 职责: 日期 -> 班次集合及班次时长
// 规则: 每周休息日两班制 (2 x 720 分钟), 其余日期三班制 (3 x 480 分钟)
// 红线: 纯函数, 全定义域, 无错误分支
// ==========================================

use crate::domain::shift::ShiftSlot;
use chrono::{Datelike, NaiveDate, Weekday};

/// 普通工作日班次
pub const ORDINARY_SHIFTS: [(&str, u32); 3] = [("Morning", 480), ("Evening", 480), ("Night", 480)];

/// 休息日班次
pub const REST_DAY_SHIFTS: [(&str, u32); 2] = [("Day", 720), ("Night", 720)];

// ==========================================
// ShiftCalendar - 班次日历
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCalendar {
    rest_day: Weekday,
}

impl ShiftCalendar {
    pub fn new(rest_day: Weekday) -> Self {
        Self { rest_day }
    }

    pub fn rest_day(&self) -> Weekday {
        self.rest_day
    }

    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        date.weekday() == self.rest_day
    }

    fn slots(&self, date: NaiveDate) -> &'static [(&'static str, u32)] {
        if self.is_rest_day(date) {
            &REST_DAY_SHIFTS
        } else {
            &ORDINARY_SHIFTS
        }
    }

    /// 当日班次（按时间顺序）
    pub fn shifts_for_date(&self, date: NaiveDate) -> Vec<ShiftSlot> {
        self.slots(date)
            .iter()
            .map(|(name, minutes)| ShiftSlot {
                name: (*name).to_string(),
                duration_minutes: *minutes,
            })
            .collect()
    }

    /// 当日单班时长（分钟）
    pub fn shift_duration_minutes(&self, date: NaiveDate) -> u32 {
        self.slots(date)[0].1
    }

    /// 按名称查找班次（大小写不敏感）
    pub fn shift_slot(&self, date: NaiveDate, shift_name: &str) -> Option<ShiftSlot> {
        let wanted = shift_name.trim();
        self.shifts_for_date(date)
            .into_iter()
            .find(|slot| slot.name.eq_ignore_ascii_case(wanted))
    }

    /// 下一个班次
    ///
    /// - 同日还有后续班次: 返回同日下一班
    /// - 当日最后一班或名称未知: 返回次日第一班
    pub fn next_shift(&self, date: NaiveDate, shift_name: &str) -> (NaiveDate, ShiftSlot) {
        let today = self.shifts_for_date(date);
        let wanted = shift_name.trim();

        if let Some(pos) = today.iter().position(|s| s.name.eq_ignore_ascii_case(wanted)) {
            if let Some(next) = today.get(pos + 1) {
                return (date, next.clone());
            }
        }

        let next_date = date.succ_opt().unwrap_or(date);
        let first = self.shifts_for_date(next_date).remove(0);
        (next_date, first)
    }
}

impl Default for ShiftCalendar {
    fn default() -> Self {
        Self::new(Weekday::Fri)
    }
}
