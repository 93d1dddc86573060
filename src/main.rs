// src/main.rs
mod clock;
mod config;
mod dashboard;
mod employee_ids;
mod error;
mod forms;
mod photo;
mod portal;
mod server;
mod webhook_client;
mod working_time;

#[cfg(test)]
mod dashboard_tests;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::dashboard::{AttendanceFilter, LeaveDecision, LeaveReview, RecordKind};
use crate::employee_ids::SessionSequence;
use crate::forms::{
    estimate_overtime_pay, CheckInForm, LeaveRequestForm, LeaveStatus, LeaveType, OvertimeForm,
    RegistrationForm,
};
use crate::portal::Portal;
use crate::server::AppState;
use crate::working_time::{format_currency, LeaveSummary};

#[derive(Parser, Debug)]
#[command(name = "attendance-portal", version, about = "Employee attendance portal backed by n8n webhooks")]
struct Cli {
    /// Overrides N8N_BASE_URL.
    #[arg(long, global = true)]
    n8n_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the HTTP service.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Records an attendance check-in with a photo.
    CheckIn {
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: Option<String>,
        /// JPEG, PNG or WebP file.
        #[arg(long)]
        photo: PathBuf,
    },
    /// Submits a leave request.
    Leave {
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        leave_type: LeaveType,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        emergency_contact: Option<String>,
    },
    /// Working/weekend day breakdown for a date range. Works offline.
    LeaveSummary {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Logs overtime.
    Overtime {
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value_t = 8)]
        regular_hours: u32,
        #[arg(long)]
        overtime_hours: Decimal,
        #[arg(long)]
        hourly_rate: Decimal,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        approved_by: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Overtime rate and pay preview. Works offline.
    OvertimeEstimate {
        #[arg(long)]
        hourly_rate: Decimal,
        #[arg(long)]
        overtime_hours: Decimal,
    },
    /// Registers a new employee.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        hire_date: NaiveDate,
        #[arg(long)]
        hourly_rate: Decimal,
        /// Sequence number to use instead of DEFAULT_NEXT_EMPLOYEE_ID.
        #[arg(long)]
        employee_number: Option<u32>,
    },
    /// Dashboard headline numbers.
    Stats,
    /// Lists backend records.
    List {
        #[arg(value_enum)]
        kind: RecordKind,
        /// Attendance only.
        #[arg(long)]
        department: Option<String>,
        /// Attendance only: matches Employee ID or Name.
        #[arg(long)]
        search: Option<String>,
        /// Leave only.
        #[arg(long, value_enum)]
        status: Option<LeaveStatus>,
    },
    /// Approves or rejects a leave request.
    ReviewLeave {
        #[arg(long)]
        leave_id: String,
        #[arg(long, value_enum)]
        decision: LeaveDecision,
        #[arg(long, default_value = dashboard::DEFAULT_REVIEWER)]
        approved_by: String,
    },
    /// Triggers payroll generation.
    Payroll,
    /// Runs the daily attendance check and shows today's alerts.
    CheckAlerts,
}

fn init_tracing(debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to render output")?
    );
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::from_env().context("Failed to read configuration from environment")?;
    if let Some(url) = &cli.n8n_url {
        config.n8n_base_url = url.clone();
    }
    config.validate().context("Invalid configuration")?;
    info!("App configuration loaded.");
    Ok(config)
}

fn build_portal(config: AppConfig, first_employee_number: Option<u32>) -> Result<Portal> {
    let first = first_employee_number.unwrap_or(config.default_next_employee_id);
    Portal::new(
        config,
        Arc::new(SystemClock),
        Arc::new(SessionSequence::starting_at(first)),
    )
    .context("Failed to initialise portal")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug = AppConfig::from_env()
        .map(|c| c.enable_debug_mode)
        .unwrap_or(false);
    init_tracing(debug);

    match &cli.command {
        // Pure calculations, no backend needed
        Command::LeaveSummary { start, end } => {
            let summary = LeaveSummary::for_range(*start, *end)
                .context("End date must be after or equal to start date!")?;
            return print_json(&summary);
        }
        Command::OvertimeEstimate {
            hourly_rate,
            overtime_hours,
        } => {
            let pay = estimate_overtime_pay(*hourly_rate, *overtime_hours)?;
            println!("Overtime rate: {}/hour", format_currency(pay.overtime_rate));
            println!("Overtime pay:  {}", format_currency(pay.overtime_pay));
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli)?;

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server_host.clone());
            let port = port.unwrap_or(config.server_port);
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("Invalid listen address {}:{}", host, port))?;
            let portal = build_portal(config, None)?;
            server::run(AppState::new(portal), addr).await?;
        }
        Command::CheckIn {
            employee_id,
            name,
            department,
            photo,
        } => {
            let photo = std::fs::read(&photo)
                .with_context(|| format!("Failed to read photo {}", photo.display()))?;
            let form = CheckInForm {
                employee_id,
                employee_name: name,
                department,
                photo,
            };
            let receipt = build_portal(config, None)?.check_in(&form).await?;
            print_json(&receipt)?;
        }
        Command::Leave {
            employee_id,
            name,
            leave_type,
            start,
            end,
            reason,
            emergency_contact,
        } => {
            let form = LeaveRequestForm {
                employee_id,
                employee_name: name,
                leave_type: Some(leave_type),
                start_date: start,
                end_date: end,
                reason,
                emergency_contact,
            };
            let receipt = build_portal(config, None)?.request_leave(&form).await?;
            print_json(&receipt)?;
        }
        Command::Overtime {
            employee_id,
            name,
            date,
            regular_hours,
            overtime_hours,
            hourly_rate,
            reason,
            task,
            approved_by,
            notes,
        } => {
            let form = OvertimeForm {
                employee_id,
                employee_name: name,
                work_date: date,
                regular_hours,
                overtime_hours,
                hourly_rate,
                reason,
                task,
                approved_by,
                notes,
            };
            let receipt = build_portal(config, None)?.log_overtime(&form).await?;
            print_json(&receipt)?;
        }
        Command::Register {
            name,
            department,
            email,
            phone,
            hire_date,
            hourly_rate,
            employee_number,
        } => {
            let form = RegistrationForm {
                employee_name: name,
                department: Some(department),
                email,
                phone,
                hire_date,
                hourly_rate,
            };
            let receipt = build_portal(config, employee_number)?
                .register_employee(&form)
                .await?;
            print_json(&receipt)?;
        }
        Command::Stats => {
            let stats = build_portal(config, None)?.dashboard().stats().await?;
            print_json(&stats)?;
        }
        Command::List {
            kind,
            department,
            search,
            status,
        } => {
            let dashboard = build_portal(config, None)?.dashboard();
            let rows = match kind {
                RecordKind::Attendance => {
                    dashboard
                        .attendance(&AttendanceFilter { department, search })
                        .await?
                }
                RecordKind::Leave => dashboard.leave(status).await?,
                other => dashboard.list(other).await?,
            };
            print_json(&rows)?;
        }
        Command::ReviewLeave {
            leave_id,
            decision,
            approved_by,
        } => {
            let review = LeaveReview {
                leave_id,
                decision,
                approved_by,
            };
            let resp = build_portal(config, None)?
                .dashboard()
                .review_leave(&review)
                .await?;
            print_json(&resp.body)?;
        }
        Command::Payroll => {
            let body = build_portal(config, None)?
                .dashboard()
                .generate_payroll()
                .await?;
            print_json(&body)?;
        }
        Command::CheckAlerts => {
            let portal = build_portal(config, None)?;
            let check = portal.dashboard().check_alerts(portal.today()).await?;
            print_json(&check)?;
        }
        Command::LeaveSummary { .. } | Command::OvertimeEstimate { .. } => {}
    }

    Ok(())
}
