// src/dashboard.rs
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::PortalError;
use crate::forms::LeaveStatus;
use crate::webhook_client::{Endpoint, WebhookClient, WebhookResponse};

/// One sheet row as returned by the backend, keyed by column header.
pub type Row = Map<String, Value>;

pub const ALL_DEPARTMENTS: &str = "All Departments";
pub const LEAVE_NUMERIC_COLUMNS: [&str; 1] = ["Days"];
pub const OVERTIME_NUMERIC_COLUMNS: [&str; 5] = [
    "Regular Hours",
    "Overtime Hours",
    "Regular Rate",
    "Overtime Rate",
    "Overtime Pay",
];

/// Pause between triggering the alert check and reading the alert sheet, so
/// the workflow has time to append its rows.
pub const DEFAULT_ALERT_SETTLE_DELAY: Duration = Duration::from_secs(2);

// --- Record kinds ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Attendance,
    Leave,
    Overtime,
    Employees,
    Alerts,
}

impl RecordKind {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            RecordKind::Attendance => Endpoint::GetAttendance,
            RecordKind::Leave => Endpoint::GetLeave,
            RecordKind::Overtime => Endpoint::GetOvertime,
            RecordKind::Employees => Endpoint::GetEmployees,
            RecordKind::Alerts => Endpoint::GetAlerts,
        }
    }

    fn numeric_columns(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Leave => &LEAVE_NUMERIC_COLUMNS,
            RecordKind::Overtime => &OVERTIME_NUMERIC_COLUMNS,
            _ => &[],
        }
    }
}

// --- Cell helpers ---

/// Numbers stay numbers, numeric strings become numbers, anything else is null.
pub fn to_numeric(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(int) = trimmed.parse::<i64>() {
                return Value::from(int);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

pub fn coerce_numeric(rows: &mut [Row], columns: &[&str]) {
    for row in rows.iter_mut() {
        for column in columns {
            if let Some(cell) = row.get_mut(*column) {
                *cell = to_numeric(cell);
            }
        }
    }
}

/// Text rendering of a cell for matching. Null cells never match anything.
fn cell_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn column_present(rows: &[Row], column: &str) -> bool {
    rows.iter().any(|r| r.contains_key(column))
}

// --- Filters ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceFilter {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl AttendanceFilter {
    pub fn apply(&self, rows: Vec<Row>) -> Vec<Row> {
        let mut rows = rows;

        let department = self
            .department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty() && *d != ALL_DEPARTMENTS);
        if let Some(dept) = department {
            if column_present(&rows, "Department") {
                rows.retain(|r| cell_text(r, "Department").as_deref() == Some(dept));
            }
        }

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        if let Some(needle) = search {
            if column_present(&rows, "Employee ID") && column_present(&rows, "Employee Name") {
                rows.retain(|r| {
                    ["Employee ID", "Employee Name"].iter().any(|col| {
                        cell_text(r, col)
                            .map(|text| text.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                    })
                });
            }
        }

        rows
    }
}

/// `None` keeps every row.
pub fn filter_leave_by_status(rows: Vec<Row>, status: Option<LeaveStatus>) -> Vec<Row> {
    let Some(status) = status else {
        return rows;
    };
    if !column_present(&rows, "Status") {
        return rows;
    }
    rows.into_iter()
        .filter(|r| cell_text(r, "Status").as_deref() == Some(status.as_str()))
        .collect()
}

// --- Stats ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SystemStats {
    pub total_employees: u64,
    pub present_today: u64,
    pub pending_leave: u64,
    pub late_arrivals: u64,
}

impl SystemStats {
    pub fn from_response(resp: &WebhookResponse) -> Self {
        Self {
            total_employees: resp.count("total_employees"),
            present_today: resp.count("present_today"),
            pending_leave: resp.count("pending_leave"),
            late_arrivals: resp.count("late_arrivals"),
        }
    }
}

// --- Leave review ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum LeaveDecision {
    Approved,
    Rejected,
}

pub const DEFAULT_REVIEWER: &str = "Admin";

fn default_reviewer() -> String {
    DEFAULT_REVIEWER.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveReview {
    #[serde(rename = "Leave ID")]
    pub leave_id: String,
    #[serde(rename = "Status")]
    pub decision: LeaveDecision,
    #[serde(rename = "Approved By", default = "default_reviewer")]
    pub approved_by: String,
}

// --- Alerts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "HIGH" => Severity::High,
            "MEDIUM" => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub alert_type: String,
    pub employee_id: String,
    pub employee_name: String,
    pub email: String,
    pub department: String,
    pub message: String,
    pub time: String,
    pub date: String,
    pub severity: Severity,
}

impl Alert {
    pub fn from_row(row: &Row) -> Self {
        let text = |column: &str, default: &str| {
            cell_text(row, column).unwrap_or_else(|| default.to_string())
        };
        Self {
            alert_type: text("Alert Type", "UNKNOWN"),
            employee_id: text("Employee ID", "N/A"),
            employee_name: text("Employee Name", "Unknown"),
            email: text("Email", "N/A"),
            department: text("Department", "N/A"),
            message: text("Message", "No message"),
            time: text("Time", "N/A"),
            date: text("Date", "N/A"),
            severity: Severity::parse(&text("Severity", "MEDIUM")),
        }
    }
}

/// The three renderings the alert sheet has been seen to use for a date.
fn date_forms(day: NaiveDate) -> [String; 3] {
    [
        day.format("%Y-%m-%d").to_string(),
        day.format("%m/%d/%Y").to_string(),
        format!("{}/{}/{}", day.month(), day.day(), day.year()),
    ]
}

/// True when a token of `cell` (split on whitespace, `T` or `,`) is one of
/// the renderings of `day`. Token matching keeps `1/5/2024` from matching
/// inside `11/5/2024`.
pub fn cell_is_on_day(cell: &str, day: NaiveDate) -> bool {
    let forms = date_forms(day);
    cell.split(|c: char| c.is_whitespace() || c == 'T' || c == ',')
        .filter(|token| !token.is_empty())
        .any(|token| forms.iter().any(|form| form == token))
}

/// Alerts dated `today`; when none are, the last `fallback_count` rows.
/// The flag is true when the fallback was used.
pub fn todays_alerts(rows: &[Row], today: NaiveDate, fallback_count: usize) -> (Vec<Row>, bool) {
    let matching: Vec<Row> = rows
        .iter()
        .filter(|r| {
            cell_text(r, "Date")
                .map(|cell| cell_is_on_day(&cell, today))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    if !matching.is_empty() {
        return (matching, false);
    }
    let start = rows.len().saturating_sub(fallback_count);
    (rows[start..].to_vec(), true)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertCheck {
    pub alerts_found: u64,
    /// True when no alert was dated today and the latest rows are shown instead.
    pub showing_latest: bool,
    pub alerts: Vec<Alert>,
}

// --- Dashboard service ---

#[derive(Debug, Clone)]
pub struct AdminDashboard {
    client: WebhookClient,
    alert_settle_delay: Duration,
}

impl AdminDashboard {
    pub fn new(client: WebhookClient) -> Self {
        Self {
            client,
            alert_settle_delay: DEFAULT_ALERT_SETTLE_DELAY,
        }
    }

    pub fn with_alert_settle_delay(mut self, delay: Duration) -> Self {
        self.alert_settle_delay = delay;
        self
    }

    /// Fetches `kind` and coerces its numeric columns.
    pub async fn list(&self, kind: RecordKind) -> Result<Vec<Row>, PortalError> {
        let resp = self.client.fetch(kind.endpoint()).await?;
        let mut rows = resp.data_rows();
        coerce_numeric(&mut rows, kind.numeric_columns());
        info!("Fetched {} {:?} rows", rows.len(), kind);
        Ok(rows)
    }

    pub async fn attendance(&self, filter: &AttendanceFilter) -> Result<Vec<Row>, PortalError> {
        Ok(filter.apply(self.list(RecordKind::Attendance).await?))
    }

    pub async fn leave(&self, status: Option<LeaveStatus>) -> Result<Vec<Row>, PortalError> {
        Ok(filter_leave_by_status(
            self.list(RecordKind::Leave).await?,
            status,
        ))
    }

    pub async fn stats(&self) -> Result<SystemStats, PortalError> {
        let resp = self.client.fetch(Endpoint::GetStats).await?;
        Ok(SystemStats::from_response(&resp))
    }

    /// Approves or rejects a leave request. The backend must answer
    /// `success: true`; anything else is surfaced with its message.
    pub async fn review_leave(&self, review: &LeaveReview) -> Result<WebhookResponse, PortalError> {
        let resp = self.client.submit(Endpoint::ApproveLeave, review).await?;
        if !resp.success_flag() {
            let message = resp.message().unwrap_or("Unknown error").to_string();
            warn!("Leave review for {} failed: {}", review.leave_id, message);
            return Err(PortalError::BackendRejected {
                status: resp.status.as_u16(),
                message,
            });
        }
        info!("Leave {} marked {:?} by {}", review.leave_id, review.decision, review.approved_by);
        Ok(resp)
    }

    pub async fn generate_payroll(&self) -> Result<Value, PortalError> {
        let resp = self.client.fetch(Endpoint::GeneratePayroll).await?;
        info!("Payroll generation triggered");
        Ok(resp.body)
    }

    /// Triggers the daily attendance check, then reads back the alerts it logged.
    pub async fn check_alerts(&self, today: NaiveDate) -> Result<AlertCheck, PortalError> {
        let resp = self.client.fetch(Endpoint::CheckAlerts).await?;
        let alerts_found = resp.count("alerts_found");
        if alerts_found == 0 {
            info!("Attendance check found no issues");
            return Ok(AlertCheck {
                alerts_found,
                showing_latest: false,
                alerts: Vec::new(),
            });
        }
        warn!("Attendance check found {} alert(s)", alerts_found);

        if !self.alert_settle_delay.is_zero() {
            tokio::time::sleep(self.alert_settle_delay).await;
        }
        let rows = self.list(RecordKind::Alerts).await?;
        let fallback = usize::try_from(alerts_found).unwrap_or(usize::MAX);
        let (selected, showing_latest) = todays_alerts(&rows, today, fallback);

        Ok(AlertCheck {
            alerts_found,
            showing_latest,
            alerts: selected.iter().map(Alert::from_row).collect(),
        })
    }
}
