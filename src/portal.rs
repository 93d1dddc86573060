// src/portal.rs
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::clock::{Clock, SubmissionContext};
use crate::config::AppConfig;
use crate::dashboard::AdminDashboard;
use crate::employee_ids::{format_employee_id, IdSequence};
use crate::error::PortalError;
use crate::forms::{CheckInForm, LeaveRequestForm, OvertimeForm, RegistrationForm};
use crate::webhook_client::{Endpoint, WebhookClient, WebhookConfig};
use crate::working_time::{format_currency, AttendanceStatus, LeaveSummary, OvertimePay};

// --- Receipts ---

#[derive(Debug, Clone, Serialize)]
pub struct CheckInReceipt {
    pub employee_id: String,
    pub employee_name: String,
    pub date: String,
    pub time: String,
    pub status: AttendanceStatus,
    pub backend: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveReceipt {
    pub leave_id: String,
    pub summary: LeaveSummary,
    pub backend: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct OvertimeReceipt {
    pub pay: OvertimePay,
    pub overtime_pay_display: String,
    pub pre_approved: bool,
    pub backend: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReceipt {
    pub employee_id: String,
    pub next_employee_id: String,
    pub backend: Value,
}

// --- Portal ---

/// The employee-facing operations. Each call validates, derives the
/// computed fields, sends one webhook and reports the outcome.
#[derive(Clone)]
pub struct Portal {
    config: Arc<AppConfig>,
    client: WebhookClient,
    clock: Arc<dyn Clock>,
    employee_ids: Arc<dyn IdSequence>,
    late_cutoff: NaiveTime,
}

impl Portal {
    pub fn new(
        config: AppConfig,
        clock: Arc<dyn Clock>,
        employee_ids: Arc<dyn IdSequence>,
    ) -> Result<Self, PortalError> {
        let client = WebhookClient::new(WebhookConfig::from_app_config(&config))?;
        Self::with_client(config, client, clock, employee_ids)
    }

    pub fn with_client(
        config: AppConfig,
        client: WebhookClient,
        clock: Arc<dyn Clock>,
        employee_ids: Arc<dyn IdSequence>,
    ) -> Result<Self, PortalError> {
        let late_cutoff = config.late_cutoff()?;
        config.flag_cutoff_discrepancy();
        Ok(Self {
            config: Arc::new(config),
            client,
            clock,
            employee_ids,
            late_cutoff,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn dashboard(&self) -> AdminDashboard {
        AdminDashboard::new(self.client.clone())
    }

    fn context(&self) -> SubmissionContext {
        SubmissionContext::capture(self.clock.as_ref(), self.late_cutoff)
    }

    pub fn today(&self) -> NaiveDate {
        self.context().today()
    }

    pub fn late_cutoff(&self) -> NaiveTime {
        self.late_cutoff
    }

    pub async fn check_in(&self, form: &CheckInForm) -> Result<CheckInReceipt, PortalError> {
        let payload = form.validate(&self.context(), &self.config.departments)?;
        let resp = self.client.submit(Endpoint::Attendance, &payload).await?;
        info!(
            "Check-in recorded for {} at {} {} ({})",
            payload.employee_id,
            payload.date,
            payload.time,
            payload.status.as_str()
        );
        Ok(CheckInReceipt {
            employee_id: payload.employee_id,
            employee_name: payload.employee_name,
            date: payload.date,
            time: payload.time,
            status: payload.status,
            backend: resp.body,
        })
    }

    pub async fn request_leave(&self, form: &LeaveRequestForm) -> Result<LeaveReceipt, PortalError> {
        let validated = form.validate(&self.context())?;
        let resp = self
            .client
            .submit(Endpoint::LeaveRequest, &validated.payload)
            .await?;
        info!(
            "Leave request {} submitted for {}: {}, {} working day(s)",
            validated.payload.leave_id,
            validated.payload.employee_id,
            validated.payload.leave_type.as_str(),
            validated.payload.days
        );
        Ok(LeaveReceipt {
            leave_id: validated.payload.leave_id,
            summary: validated.summary,
            backend: resp.body,
        })
    }

    pub async fn log_overtime(&self, form: &OvertimeForm) -> Result<OvertimeReceipt, PortalError> {
        let validated = form.validate(&self.context())?;
        let resp = self
            .client
            .submit(Endpoint::OvertimeLog, &validated.payload)
            .await?;
        info!(
            "Overtime logged for {} on {}: {}h, pay {}",
            validated.payload.employee_id,
            validated.payload.date,
            validated.payload.overtime_hours,
            format_currency(validated.pay.overtime_pay)
        );
        Ok(OvertimeReceipt {
            pay: validated.pay,
            overtime_pay_display: format_currency(validated.pay.overtime_pay),
            pre_approved: validated.pre_approved,
            backend: resp.body,
        })
    }

    /// Previews the id the next registration would receive.
    pub fn next_employee_id(&self) -> String {
        self.employee_ids.peek_id()
    }

    /// The id is only consumed once the backend accepts the record.
    pub async fn register_employee(
        &self,
        form: &RegistrationForm,
    ) -> Result<RegistrationReceipt, PortalError> {
        let sequence = self.employee_ids.peek();
        let employee_id = format_employee_id(sequence);
        let payload = form.validate(&employee_id, &self.config.departments)?;
        let resp = self
            .client
            .submit(Endpoint::RegisterEmployee, &payload)
            .await?;
        self.employee_ids.commit(sequence);
        info!(
            "Registered {} ({}) in {}",
            payload.employee_name, employee_id, payload.department
        );
        Ok(RegistrationReceipt {
            employee_id,
            next_employee_id: self.employee_ids.peek_id(),
            backend: resp.body,
        })
    }
}
