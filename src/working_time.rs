// src/working_time.rs
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// --- Constants ---

/// Overtime is paid at one and a half times the regular hourly rate.
pub const OVERTIME_MULTIPLIER: Decimal = dec!(1.5);

const BUILT_IN_LATE_CUTOFF_HOUR: u32 = 9;
const BUILT_IN_LATE_CUTOFF_MINUTE: u32 = 30;

/// The 09:30 cutoff the check-in form historically hardcoded.
/// Configuration (`LATE_CUTOFF_TIME`) takes precedence over this value.
pub fn built_in_late_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(BUILT_IN_LATE_CUTOFF_HOUR, BUILT_IN_LATE_CUTOFF_MINUTE, 0)
        .unwrap_or(NaiveTime::MIN)
}

// --- Working days ---

/// Monday through Friday.
pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Counts the weekdays in the inclusive range `[start, end]`.
///
/// Callers validate `start <= end` first; an inverted range counts as zero.
pub fn working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    let count = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| is_working_day(*day))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Number of calendar days in the inclusive range `[start, end]`.
pub fn total_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    u32::try_from((end - start).num_days() + 1).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSummary {
    pub total_days: u32,
    pub working_days: u32,
    pub weekend_days: u32,
}

impl LeaveSummary {
    /// `None` when the end date precedes the start date.
    pub fn for_range(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if end < start {
            return None;
        }
        let total_days = total_days(start, end);
        let working_days = working_days(start, end);
        Some(Self {
            total_days,
            working_days,
            weekend_days: total_days - working_days,
        })
    }
}

// --- Overtime ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimePay {
    pub overtime_rate: Decimal,
    pub overtime_pay: Decimal,
}

/// `overtime_rate = hourly_rate * 1.5`, `overtime_pay = overtime_hours * overtime_rate`.
/// Exact decimal arithmetic; rounding is left to display code.
pub fn overtime_pay(hourly_rate: Decimal, overtime_hours: Decimal) -> OvertimePay {
    let overtime_rate = hourly_rate * OVERTIME_MULTIPLIER;
    OvertimePay {
        overtime_rate,
        overtime_pay: overtime_hours * overtime_rate,
    }
}

/// Two-decimal currency rendering, e.g. `$45.00`.
pub fn format_currency(amount: Decimal) -> String {
    format!(
        "${:.2}",
        amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    )
}

// --- Attendance status ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Late => "Late",
        }
    }
}

/// Late iff the time of day is strictly after `cutoff`. Sub-second precision is
/// ignored, so 09:30:00.900 still counts as 09:30:00.
pub fn classify_arrival(time: NaiveTime, cutoff: NaiveTime) -> AttendanceStatus {
    let time = time.with_nanosecond(0).unwrap_or(time);
    if time > cutoff {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_cutoff_is_half_past_nine() {
        assert_eq!(built_in_late_cutoff(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn currency_is_rendered_with_two_decimals() {
        assert_eq!(format_currency(dec!(45)), "$45.00");
        assert_eq!(format_currency(dec!(22.5)), "$22.50");
        assert_eq!(format_currency(dec!(0.125)), "$0.13");
    }
}
