// src/server.rs
use anyhow::{Context, Result};
use axum::{
    extract::{FromRequest, FromRequestParts, Query, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dashboard::{
    AdminDashboard, AlertCheck, AttendanceFilter, LeaveDecision, LeaveReview, RecordKind, Row,
    SystemStats, DEFAULT_REVIEWER,
};
use crate::error::{PortalError, ValidationErrorReason};
use crate::forms::{
    estimate_overtime_pay, CheckInForm, LeaveRequestForm, LeaveStatus, OvertimeForm,
    RegistrationForm,
};
use crate::photo::decode_base64_upload;
use crate::portal::{
    CheckInReceipt, LeaveReceipt, OvertimeReceipt, Portal, RegistrationReceipt,
};
use crate::working_time::{format_currency, LeaveSummary, OvertimePay};

// --- Shared Application State ---

#[derive(Clone)]
pub struct AppState {
    pub portal: Portal,
    pub dashboard: AdminDashboard,
}

impl AppState {
    pub fn new(portal: Portal) -> Self {
        let dashboard = portal.dashboard();
        Self { portal, dashboard }
    }
}

// --- Extractors ---

/// `Json` whose rejection is reported in the same `{"error","message"}` shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(PortalError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(PortalError))]
pub struct ApiQuery<T>(pub T);

// --- Request / response bodies ---

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub employee_id: String,
    pub employee_name: String,
    #[serde(default)]
    pub department: Option<String>,
    /// Base64 image, plain or as a data URI.
    #[serde(default)]
    pub photo_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct LeaveSummaryQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct OvertimeEstimateQuery {
    pub hourly_rate: Decimal,
    pub overtime_hours: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OvertimeEstimate {
    #[serde(flatten)]
    pub pay: OvertimePay,
    pub overtime_rate_display: String,
    pub overtime_pay_display: String,
}

#[derive(Debug, Serialize)]
pub struct NextEmployeeId {
    pub employee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LeaveListQuery {
    #[serde(default)]
    pub status: Option<LeaveStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub leave_id: String,
    pub decision: LeaveDecision,
    #[serde(default)]
    pub approved_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub leave_id: String,
    pub decision: LeaveDecision,
    pub backend: Value,
}

// --- Router ---

pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/stats", get(handle_stats))
        .route("/attendance", get(handle_list_attendance))
        .route("/leave", get(handle_list_leave))
        .route("/overtime", get(handle_list_overtime))
        .route("/employees", get(handle_list_employees))
        .route("/alerts", get(handle_list_alerts))
        .route("/leave/review", post(handle_review_leave))
        .route("/payroll", post(handle_generate_payroll))
        .route("/alerts/check", post(handle_check_alerts));

    let api_routes = Router::new()
        .route("/attendance", post(handle_check_in))
        .route("/leave", post(handle_request_leave))
        .route("/leave/summary", get(handle_leave_summary))
        .route("/overtime", post(handle_log_overtime))
        .route("/overtime/estimate", get(handle_overtime_estimate))
        .route("/employees", post(handle_register_employee))
        .route("/employees/next-id", get(handle_next_employee_id))
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/api", api_routes)
        .route("/status", get(handle_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server on http://{}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

// --- Employee handlers ---

async fn handle_check_in(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CheckInRequest>,
) -> Result<Json<CheckInReceipt>, PortalError> {
    let mut form = CheckInForm {
        employee_id: req.employee_id,
        employee_name: req.employee_name,
        department: req.department,
        photo: Vec::new(),
    };
    form.check_identity()?;
    form.photo = decode_base64_upload(&req.photo_base64)?;
    Ok(Json(state.portal.check_in(&form).await?))
}

async fn handle_request_leave(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LeaveRequestForm>,
) -> Result<Json<LeaveReceipt>, PortalError> {
    Ok(Json(state.portal.request_leave(&form).await?))
}

async fn handle_leave_summary(
    ApiQuery(query): ApiQuery<LeaveSummaryQuery>,
) -> Result<Json<LeaveSummary>, PortalError> {
    let summary = LeaveSummary::for_range(query.start_date, query.end_date).ok_or(
        ValidationErrorReason::EndBeforeStart {
            start: query.start_date,
            end: query.end_date,
        },
    )?;
    Ok(Json(summary))
}

async fn handle_log_overtime(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<OvertimeForm>,
) -> Result<Json<OvertimeReceipt>, PortalError> {
    Ok(Json(state.portal.log_overtime(&form).await?))
}

async fn handle_overtime_estimate(
    ApiQuery(query): ApiQuery<OvertimeEstimateQuery>,
) -> Result<Json<OvertimeEstimate>, PortalError> {
    let pay = estimate_overtime_pay(query.hourly_rate, query.overtime_hours)?;
    Ok(Json(OvertimeEstimate {
        overtime_rate_display: format_currency(pay.overtime_rate),
        overtime_pay_display: format_currency(pay.overtime_pay),
        pay,
    }))
}

async fn handle_register_employee(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegistrationForm>,
) -> Result<Json<RegistrationReceipt>, PortalError> {
    Ok(Json(state.portal.register_employee(&form).await?))
}

async fn handle_next_employee_id(State(state): State<AppState>) -> Json<NextEmployeeId> {
    Json(NextEmployeeId {
        employee_id: state.portal.next_employee_id(),
    })
}

// --- Admin handlers ---

async fn handle_stats(State(state): State<AppState>) -> Result<Json<SystemStats>, PortalError> {
    Ok(Json(state.dashboard.stats().await?))
}

async fn handle_list_attendance(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<AttendanceFilter>,
) -> Result<Json<Vec<Row>>, PortalError> {
    Ok(Json(state.dashboard.attendance(&filter).await?))
}

async fn handle_list_leave(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LeaveListQuery>,
) -> Result<Json<Vec<Row>>, PortalError> {
    Ok(Json(state.dashboard.leave(query.status).await?))
}

async fn handle_list_overtime(State(state): State<AppState>) -> Result<Json<Vec<Row>>, PortalError> {
    Ok(Json(state.dashboard.list(RecordKind::Overtime).await?))
}

async fn handle_list_employees(State(state): State<AppState>) -> Result<Json<Vec<Row>>, PortalError> {
    Ok(Json(state.dashboard.list(RecordKind::Employees).await?))
}

async fn handle_list_alerts(State(state): State<AppState>) -> Result<Json<Vec<Row>>, PortalError> {
    Ok(Json(state.dashboard.list(RecordKind::Alerts).await?))
}

async fn handle_review_leave(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Result<Json<ReviewResponse>, PortalError> {
    let review = LeaveReview {
        leave_id: req.leave_id,
        decision: req.decision,
        approved_by: req
            .approved_by
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REVIEWER.to_string()),
    };
    let resp = state.dashboard.review_leave(&review).await?;
    Ok(Json(ReviewResponse {
        leave_id: review.leave_id,
        decision: review.decision,
        backend: resp.body,
    }))
}

async fn handle_generate_payroll(State(state): State<AppState>) -> Result<Json<Value>, PortalError> {
    Ok(Json(state.dashboard.generate_payroll().await?))
}

async fn handle_check_alerts(State(state): State<AppState>) -> Result<Json<AlertCheck>, PortalError> {
    let today = state.portal.today();
    Ok(Json(state.dashboard.check_alerts(today).await?))
}

// --- Status ---

async fn handle_status(State(state): State<AppState>) -> Html<String> {
    info!("Handling /status request...");
    let config = state.portal.config();
    Html(format!(
        "<h1>Attendance Portal</h1><p>Current Time (Server): {}</p><hr>\
         <p>n8n base URL: {}</p>\
         <p>Late after: {}</p>\
         <p>Next employee ID: {}</p>\
         <p>Departments: {}</p>",
        chrono::Local::now().to_rfc3339(),
        config.n8n_base_url,
        state.portal.late_cutoff().format("%H:%M"),
        state.portal.next_employee_id(),
        config.departments.join(", ")
    ))
}
