// src/config.rs
use chrono::NaiveTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::error::PortalError;
use crate::working_time::built_in_late_cutoff;

// --- Defaults ---

pub const N8N_URL_PLACEHOLDER: &str = "YOUR_N8N_URL_HERE";
pub const SHEET_ID_PLACEHOLDER: &str = "YOUR_SHEET_ID_HERE";
pub const DEFAULT_LATE_CUTOFF_TIME: &str = "09:30";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_NEXT_EMPLOYEE_ID: u32 = 21;
pub const DEFAULT_DEPARTMENTS: [&str; 7] = [
    "IT",
    "HR",
    "Finance",
    "Marketing",
    "Sales",
    "Operations",
    "Customer Service",
];

fn default_late_cutoff_time() -> String {
    DEFAULT_LATE_CUTOFF_TIME.to_string()
}
fn default_api_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}
fn default_next_employee_id() -> u32 {
    DEFAULT_NEXT_EMPLOYEE_ID
}
fn default_departments() -> Vec<String> {
    DEFAULT_DEPARTMENTS.iter().map(|d| d.to_string()).collect()
}
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}
fn default_server_port() -> u16 {
    3000
}

/// Application settings, read from the environment (and `.env` if present).
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    // Backend
    #[serde(default)]
    pub n8n_base_url: String,
    #[serde(default)]
    pub google_sheet_id: String,
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,

    // Attendance rules
    #[serde(default = "default_late_cutoff_time")]
    pub late_cutoff_time: String,
    #[serde(default = "default_next_employee_id")]
    pub default_next_employee_id: u32,
    #[serde(default = "default_departments")]
    pub departments: Vec<String>,

    // Server
    #[serde(default = "default_server_host")]
    pub server_host: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    #[serde(default)]
    pub enable_debug_mode: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        envy::from_env::<AppConfig>()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }

    /// Reports every missing or placeholder setting at once.
    pub fn validate(&self) -> Result<(), PortalError> {
        let mut errors = Vec::new();

        if self.n8n_base_url.trim().is_empty() || self.n8n_base_url == N8N_URL_PLACEHOLDER {
            errors.push("N8N_BASE_URL not configured".to_string());
        } else if let Err(e) = url::Url::parse(&self.n8n_base_url) {
            errors.push(format!("N8N_BASE_URL is not a valid URL: {}", e));
        }

        if self.google_sheet_id.trim().is_empty() || self.google_sheet_id == SHEET_ID_PLACEHOLDER {
            errors.push("GOOGLE_SHEET_ID not configured".to_string());
        }

        if let Err(e) = self.late_cutoff() {
            errors.push(e.to_string());
        }

        if self.departments.is_empty() {
            errors.push("DEPARTMENTS must list at least one department".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PortalError::Config(errors.join("; ")))
        }
    }

    /// The configured late-arrival cutoff. This value is authoritative.
    pub fn late_cutoff(&self) -> Result<NaiveTime, PortalError> {
        let raw = self.late_cutoff_time.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|e| {
                PortalError::Config(format!("LATE_CUTOFF_TIME '{}' is not HH:MM: {}", raw, e))
            })
    }

    /// Logs when the configured cutoff differs from the historical 09:30.
    /// Returns the configured value when it differs.
    pub fn flag_cutoff_discrepancy(&self) -> Option<NaiveTime> {
        let configured = self.late_cutoff().ok()?;
        let built_in = built_in_late_cutoff();
        if configured != built_in {
            warn!(
                "LATE_CUTOFF_TIME is {} but the check-in rule historically used {}. Using the configured value.",
                configured.format("%H:%M:%S"),
                built_in.format("%H:%M:%S")
            );
            Some(configured)
        } else {
            None
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}
