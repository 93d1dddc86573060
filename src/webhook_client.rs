// src/webhook_client.rs
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::PortalError;

// --- Endpoints ---

/// Webhook paths exposed by the n8n workflows, relative to the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Attendance,
    RegisterEmployee,
    LeaveRequest,
    OvertimeLog,
    GetAttendance,
    GetLeave,
    GetOvertime,
    GetEmployees,
    GetAlerts,
    GetStats,
    ApproveLeave,
    GeneratePayroll,
    CheckAlerts,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Attendance => "attendance",
            Endpoint::RegisterEmployee => "employee/register",
            Endpoint::LeaveRequest => "leave/request",
            Endpoint::OvertimeLog => "overtime/log",
            Endpoint::GetAttendance => "admin/get-attendance",
            Endpoint::GetLeave => "admin/get-leave",
            Endpoint::GetOvertime => "admin/get-overtime",
            Endpoint::GetEmployees => "admin/get-employees",
            Endpoint::GetAlerts => "admin/get-alerts",
            Endpoint::GetStats => "admin/get-stats",
            Endpoint::ApproveLeave => "admin/approve-leave",
            Endpoint::GeneratePayroll => "admin/generate-payroll",
            Endpoint::CheckAlerts => "admin/check-alerts",
        }
    }

    /// Reads are GET, everything else is POST with a JSON body.
    pub fn method(&self) -> Method {
        match self {
            Endpoint::GetAttendance
            | Endpoint::GetLeave
            | Endpoint::GetOvertime
            | Endpoint::GetEmployees
            | Endpoint::GetAlerts
            | Endpoint::GetStats => Method::GET,
            _ => Method::POST,
        }
    }
}

// --- Configuration ---

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.n8n_base_url.clone(),
            timeout: config.api_timeout(),
        }
    }
}

// --- Response ---

/// A parsed 200 response. The body is kept as loose JSON since the workflows
/// return sheet rows with whatever columns the sheet currently has.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl WebhookResponse {
    /// Rows under `data`, or an empty list when the field is absent.
    pub fn data_rows(&self) -> Vec<Map<String, Value>> {
        match self.body.get("data") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Value of a boolean `success` field; absent means `false`.
    pub fn success_flag(&self) -> bool {
        self.body
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Non-negative integer field, tolerating numbers sent as strings or floats.
    pub fn count(&self, field: &str) -> u64 {
        match self.body.get(field) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

// --- Client ---

#[derive(Debug, Clone)]
pub struct WebhookClient {
    config: Arc<WebhookConfig>,
    http_client: Client,
}

impl WebhookClient {
    pub fn new(config: WebhookConfig) -> Result<Self, PortalError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PortalError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    /// `{base_url}/{endpoint}` with exactly one slash between them.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, PortalError> {
        let joined = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.path()
        );
        Url::parse(&joined)
            .map_err(|e| PortalError::Config(format!("Invalid webhook URL '{}': {}", joined, e)))
    }

    /// POSTs `payload` as JSON.
    pub async fn submit<P: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        payload: &P,
    ) -> Result<WebhookResponse, PortalError> {
        let url = self.endpoint_url(endpoint)?;
        let request = self
            .http_client
            .request(endpoint.method(), url)
            .json(payload);
        self.send(request, endpoint).await
    }

    /// GETs (or POSTs with no body, for trigger endpoints) and returns the parsed body.
    pub async fn fetch(&self, endpoint: Endpoint) -> Result<WebhookResponse, PortalError> {
        let url = self.endpoint_url(endpoint)?;
        let request = self.http_client.request(endpoint.method(), url);
        self.send(request, endpoint).await
    }

    async fn send(
        &self,
        request_builder: RequestBuilder,
        endpoint: Endpoint,
    ) -> Result<WebhookResponse, PortalError> {
        let context_msg = endpoint.path();
        // Local fault (unserializable payload, bad URL state): nothing was sent
        let request = request_builder.build().map_err(|e| {
            error!("Request build failed for '{}': {}", context_msg, e);
            PortalError::Config(format!("Failed to build request for '{}': {}", context_msg, e))
        })?;
        debug!("Sending {} request for '{}' to {}", request.method(), context_msg, request.url());

        let resp = self.http_client.execute(request).await.map_err(|e| {
            // Network, DNS, refused connection or timeout: nothing came back
            error!("HTTP execution failed for '{}': {}", context_msg, e);
            PortalError::Connectivity(e)
        })?;

        let status = resp.status();
        info!("Received response for '{}': Status={}", context_msg, status);

        let bytes = resp.bytes().await.map_err(|e| {
            error!("Failed to read response body for '{}': {}", context_msg, e);
            PortalError::Connectivity(e)
        })?;

        if status != StatusCode::OK {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            error!(
                "n8n Error Response: Status={}, Body='{}' for '{}'",
                status, body, context_msg
            );
            return Err(PortalError::BackendRejected {
                status: status.as_u16(),
                message: body,
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            warn!("Empty 200 response for '{}'", context_msg);
            return Err(PortalError::InvalidResponse(format!(
                "empty body from '{}'",
                context_msg
            )));
        }

        let body = serde_json::from_slice::<Value>(&bytes).map_err(|e| {
            error!("JSON parse failed for '{}': {}", context_msg, e);
            PortalError::InvalidResponse(format!("'{}' returned non-JSON body: {}", context_msg, e))
        })?;
        debug!("Response body for '{}': {}", context_msg, body);

        Ok(WebhookResponse { status, body })
    }
}
