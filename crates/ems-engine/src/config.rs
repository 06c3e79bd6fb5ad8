//! Engine configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub planner_url: String,
    /// Seconds a clearance request may stay pending before auto-timeout.
    pub clearance_sla_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            planner_url: env::var("EMS_PLANNER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string()),
            clearance_sla_secs: env::var("EMS_CLEARANCE_SLA_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8),
        }
    }
}
