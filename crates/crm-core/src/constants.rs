//! Application-wide constants
//!
//! Centralized location for sentinel values, default endpoints and
//! timing values used across multiple modules.

/// Category value that disables a category predicate ("All statuses", "All sources", ...)
pub const ALL_SENTINEL: &str = "all";

/// Default API base URL when no config file or env override is present
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Default location of the static data payload
pub const DEFAULT_DATA_FILE: &str = "data/crm.json";

/// Timeout for a single HTTP request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

// New-leads polling
/// Base interval between successful polls
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Cap for the failure backoff
pub const DEFAULT_POLL_MAX_INTERVAL_SECS: u64 = 300;

// Environment overrides
pub const ENV_API_URL: &str = "CRM_API_URL";
pub const ENV_DATA_FILE: &str = "CRM_DATA_FILE";
pub const ENV_LOG_FILE: &str = "CRM_LOG_FILE";

// API routes, relative to the configured base URL
pub mod routes {
    /// Prospect creation (POST)
    pub const PROSPECTS: &str = "/api/prospects";
    /// Count of leads in `new` status for an agent (GET, `?agentId=`)
    pub const NEW_LEADS_COUNT: &str = "/api/leads/new/count";
}
