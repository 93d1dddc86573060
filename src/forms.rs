// src/forms.rs
//
// Raw form input -> validated backend payload. Every check here runs before
// any network call.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::clock::SubmissionContext;
use crate::error::ValidationErrorReason;
use crate::photo::encode_photo_data_uri;
use crate::working_time::{
    classify_arrival, overtime_pay, AttendanceStatus, LeaveSummary, OvertimePay,
};

// --- Constants ---

pub const MIN_REASON_CHARS: usize = 10;
pub const MIN_OVERTIME_HOURS: Decimal = dec!(0.5);
pub const MAX_OVERTIME_HOURS: Decimal = dec!(8.0);
pub const MAX_REGULAR_HOURS: u32 = 12;
pub const MIN_HOURLY_RATE: Decimal = dec!(10.00);
pub const MAX_HOURLY_RATE: Decimal = dec!(100.00);

pub const NOT_AVAILABLE: &str = "N/A";
const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";
const WIRE_DISPLAY_TIME_FORMAT: &str = "%I:%M %p";

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

// --- Enumerations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum LeaveType {
    #[serde(rename = "Annual Leave")]
    Annual,
    #[serde(rename = "Sick Leave")]
    Sick,
    #[serde(rename = "Emergency Leave")]
    Emergency,
    #[serde(rename = "Maternity Leave")]
    Maternity,
    #[serde(rename = "Paternity Leave")]
    Paternity,
    #[serde(rename = "Unpaid Leave")]
    Unpaid,
    #[serde(rename = "Compensatory Leave")]
    Compensatory,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Annual => "Annual Leave",
            LeaveType::Sick => "Sick Leave",
            LeaveType::Emergency => "Emergency Leave",
            LeaveType::Maternity => "Maternity Leave",
            LeaveType::Paternity => "Paternity Leave",
            LeaveType::Unpaid => "Unpaid Leave",
            LeaveType::Compensatory => "Compensatory Leave",
        }
    }
}

/// Leave status as the backend stores it. New requests are always `Pending`;
/// only the backend (via an admin review) moves them on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
        }
    }
}

// --- Helpers ---

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn check_reason(reason: &str) -> Result<String, ValidationErrorReason> {
    let trimmed = reason.trim();
    if trimmed.chars().count() < MIN_REASON_CHARS {
        return Err(ValidationErrorReason::ReasonTooShort {
            min_chars: MIN_REASON_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

fn check_overtime_hours(hours: Decimal) -> Result<(), ValidationErrorReason> {
    if hours < MIN_OVERTIME_HOURS || hours > MAX_OVERTIME_HOURS {
        return Err(ValidationErrorReason::OvertimeHoursOutOfRange {
            hours,
            min: MIN_OVERTIME_HOURS,
            max: MAX_OVERTIME_HOURS,
        });
    }
    Ok(())
}

fn check_hourly_rate(rate: Decimal) -> Result<(), ValidationErrorReason> {
    if rate < MIN_HOURLY_RATE || rate > MAX_HOURLY_RATE {
        return Err(ValidationErrorReason::HourlyRateOutOfRange {
            rate,
            min: MIN_HOURLY_RATE,
            max: MAX_HOURLY_RATE,
        });
    }
    Ok(())
}

/// Pay preview for the overtime calculator. Applies the same hour and rate
/// limits as a logged overtime entry.
pub fn estimate_overtime_pay(
    hourly_rate: Decimal,
    overtime_hours: Decimal,
) -> Result<OvertimePay, ValidationErrorReason> {
    check_overtime_hours(overtime_hours)?;
    check_hourly_rate(hourly_rate)?;
    Ok(overtime_pay(hourly_rate, overtime_hours))
}

/// Renders a decimal the way the backend sheet has always received numbers:
/// no trailing zeros, but at least one fractional digit (`2.0`, `22.5`).
pub fn wire_number(value: Decimal) -> String {
    let normalized = value.normalize();
    if normalized.scale() == 0 {
        format!("{}.0", normalized)
    } else {
        normalized.to_string()
    }
}

// --- Attendance check-in ---

#[derive(Debug, Clone, Default)]
pub struct CheckInForm {
    pub employee_id: String,
    pub employee_name: String,
    pub department: Option<String>,
    /// Raw captured image bytes (JPEG, PNG or WebP).
    pub photo: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendancePayload {
    #[serde(rename = "Employee ID")]
    pub employee_id: String,
    #[serde(rename = "Employee Name")]
    pub employee_name: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Status")]
    pub status: AttendanceStatus,
    #[serde(rename = "Image")]
    pub image: String,
}

impl CheckInForm {
    /// First check in the order; callers that decode the photo themselves run it beforehand.
    pub fn check_identity(&self) -> Result<(), ValidationErrorReason> {
        if is_blank(&self.employee_id) || is_blank(&self.employee_name) {
            return Err(ValidationErrorReason::MissingCheckInIdentity);
        }
        Ok(())
    }

    pub fn validate(
        &self,
        ctx: &SubmissionContext,
        departments: &[String],
    ) -> Result<AttendancePayload, ValidationErrorReason> {
        self.check_identity()?;

        let department = match non_blank(&self.department) {
            None | Some("Not Specified") => NOT_AVAILABLE.to_string(),
            Some(dept) if departments.iter().any(|d| d == dept) => dept.to_string(),
            Some(dept) => {
                return Err(ValidationErrorReason::UnknownDepartment {
                    department: dept.to_string(),
                })
            }
        };

        let image = encode_photo_data_uri(&self.photo)?;
        let status = classify_arrival(ctx.now.time(), ctx.late_cutoff);

        Ok(AttendancePayload {
            employee_id: self.employee_id.trim().to_string(),
            employee_name: self.employee_name.trim().to_string(),
            department,
            date: ctx.now.format(WIRE_DATE_FORMAT).to_string(),
            time: ctx.now.format(WIRE_DISPLAY_TIME_FORMAT).to_string(),
            status,
            image,
        })
    }
}

// --- Leave request ---

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveRequestForm {
    pub employee_id: String,
    pub employee_name: String,
    #[serde(default)]
    pub leave_type: Option<LeaveType>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeavePayload {
    #[serde(rename = "Leave ID")]
    pub leave_id: String,
    #[serde(rename = "Employee ID")]
    pub employee_id: String,
    #[serde(rename = "Employee Name")]
    pub employee_name: String,
    #[serde(rename = "Leave Type")]
    pub leave_type: LeaveType,
    #[serde(rename = "Start Date")]
    pub start_date: String,
    #[serde(rename = "End Date")]
    pub end_date: String,
    /// Working days, not calendar days.
    #[serde(rename = "Days")]
    pub days: u32,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Status")]
    pub status: LeaveStatus,
    #[serde(rename = "Approved By")]
    pub approved_by: String,
    #[serde(rename = "Approved Date")]
    pub approved_date: String,
    #[serde(rename = "Submitted Date")]
    pub submitted_date: String,
    #[serde(rename = "Emergency Contact")]
    pub emergency_contact: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLeave {
    pub payload: LeavePayload,
    pub summary: LeaveSummary,
}

impl LeaveRequestForm {
    pub fn validate(&self, ctx: &SubmissionContext) -> Result<ValidatedLeave, ValidationErrorReason> {
        if is_blank(&self.employee_id) || is_blank(&self.employee_name) {
            return Err(ValidationErrorReason::MissingIdentity);
        }
        let leave_type = self.leave_type.ok_or(ValidationErrorReason::MissingLeaveType)?;
        let summary = LeaveSummary::for_range(self.start_date, self.end_date).ok_or(
            ValidationErrorReason::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            },
        )?;
        let reason = check_reason(&self.reason)?;

        let payload = LeavePayload {
            leave_id: format!("L{}", ctx.now.format("%Y%m%d%H%M%S")),
            employee_id: self.employee_id.trim().to_string(),
            employee_name: self.employee_name.trim().to_string(),
            leave_type,
            start_date: self.start_date.format(WIRE_DATE_FORMAT).to_string(),
            end_date: self.end_date.format(WIRE_DATE_FORMAT).to_string(),
            days: summary.working_days,
            reason,
            status: LeaveStatus::Pending,
            approved_by: String::new(),
            approved_date: String::new(),
            submitted_date: ctx.now.format(WIRE_DATE_FORMAT).to_string(),
            emergency_contact: non_blank(&self.emergency_contact)
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
        };

        Ok(ValidatedLeave { payload, summary })
    }
}

// --- Overtime log ---

fn default_regular_hours() -> u32 {
    8
}

#[derive(Debug, Clone, Deserialize)]
pub struct OvertimeForm {
    pub employee_id: String,
    pub employee_name: String,
    pub work_date: NaiveDate,
    #[serde(default = "default_regular_hours")]
    pub regular_hours: u32,
    pub overtime_hours: Decimal,
    pub hourly_rate: Decimal,
    pub reason: String,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimePayload {
    #[serde(rename = "Employee ID")]
    pub employee_id: String,
    #[serde(rename = "Employee Name")]
    pub employee_name: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Regular Hours")]
    pub regular_hours: String,
    #[serde(rename = "Overtime Hours")]
    pub overtime_hours: String,
    #[serde(rename = "Hourly Rate")]
    pub hourly_rate: String,
    #[serde(rename = "Regular Rate")]
    pub regular_rate: String,
    #[serde(rename = "Overtime Rate")]
    pub overtime_rate: String,
    #[serde(rename = "Overtime Pay")]
    pub overtime_pay: String,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Task/Project")]
    pub task: String,
    #[serde(rename = "Approved By")]
    pub approved_by: String,
    #[serde(rename = "Notes")]
    pub notes: String,
    #[serde(rename = "Logged At")]
    pub logged_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOvertime {
    pub payload: OvertimePayload,
    pub pay: OvertimePay,
    pub pre_approved: bool,
}

impl OvertimeForm {
    pub fn validate(
        &self,
        ctx: &SubmissionContext,
    ) -> Result<ValidatedOvertime, ValidationErrorReason> {
        if is_blank(&self.employee_id) || is_blank(&self.employee_name) {
            return Err(ValidationErrorReason::MissingIdentity);
        }
        check_overtime_hours(self.overtime_hours)?;
        if self.regular_hours > MAX_REGULAR_HOURS {
            return Err(ValidationErrorReason::RegularHoursOutOfRange {
                hours: self.regular_hours,
                max: MAX_REGULAR_HOURS,
            });
        }
        check_hourly_rate(self.hourly_rate)?;
        let reason = check_reason(&self.reason)?;
        if self.work_date > ctx.today() {
            return Err(ValidationErrorReason::FutureWorkDate {
                date: self.work_date,
            });
        }

        let pay = overtime_pay(self.hourly_rate, self.overtime_hours);
        let approver = non_blank(&self.approved_by);

        let payload = OvertimePayload {
            employee_id: self.employee_id.trim().to_string(),
            employee_name: self.employee_name.trim().to_string(),
            date: self.work_date.format(WIRE_DATE_FORMAT).to_string(),
            regular_hours: self.regular_hours.to_string(),
            overtime_hours: wire_number(self.overtime_hours),
            hourly_rate: wire_number(self.hourly_rate),
            regular_rate: wire_number(self.hourly_rate),
            overtime_rate: wire_number(pay.overtime_rate),
            overtime_pay: wire_number(pay.overtime_pay),
            reason,
            task: non_blank(&self.task).unwrap_or(NOT_AVAILABLE).to_string(),
            approved_by: approver.unwrap_or("Pending").to_string(),
            notes: non_blank(&self.notes).unwrap_or_default().to_string(),
            logged_at: ctx.now.format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        Ok(ValidatedOvertime {
            payload,
            pay,
            pre_approved: approver.is_some(),
        })
    }
}

// --- Employee registration ---

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    pub employee_name: String,
    #[serde(default)]
    pub department: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub hire_date: NaiveDate,
    pub hourly_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePayload {
    #[serde(rename = "Employee ID")]
    pub employee_id: String,
    #[serde(rename = "Employee Name")]
    pub employee_name: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Hire Date")]
    pub hire_date: String,
    #[serde(rename = "Hourly Rate")]
    pub hourly_rate: String,
}

impl RegistrationForm {
    /// `employee_id` is supplied by the caller's id sequence.
    pub fn validate(
        &self,
        employee_id: &str,
        departments: &[String],
    ) -> Result<EmployeePayload, ValidationErrorReason> {
        let department = non_blank(&self.department);
        if is_blank(&self.employee_name)
            || department.is_none()
            || is_blank(&self.email)
            || self.hourly_rate <= Decimal::ZERO
        {
            return Err(ValidationErrorReason::RequiredFieldsMissing);
        }
        let department = department.unwrap_or_default();
        if !departments.iter().any(|d| d == department) {
            return Err(ValidationErrorReason::UnknownDepartment {
                department: department.to_string(),
            });
        }
        let email = self.email.trim();
        if !EMAIL_PATTERN.is_match(email) {
            return Err(ValidationErrorReason::InvalidEmail {
                email: email.to_string(),
            });
        }

        Ok(EmployeePayload {
            employee_id: employee_id.to_string(),
            employee_name: self.employee_name.trim().to_string(),
            department: department.to_string(),
            email: email.to_string(),
            phone: non_blank(&self.phone).unwrap_or(NOT_AVAILABLE).to_string(),
            hire_date: self.hire_date.format(WIRE_DATE_FORMAT).to_string(),
            hourly_rate: format!(
                "{:.2}",
                self.hourly_rate
                    .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            ),
        })
    }
}
