//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! client.

// Upstream endpoint
pub const RUTEN_BASE_URL: &str = "https://partner.ruten.com.tw";

// Request headers sent on every signed call
pub const HEADER_API_KEY: &str = "X-RT-Key";
pub const HEADER_TIMESTAMP: &str = "X-RT-Timestamp";
pub const HEADER_SIGNATURE: &str = "X-RT-Authorization";
pub const USER_AGENT: &str = "ruten-api-client/0.1";

// Response header carrying the upstream correlation identifier, when present
pub const HEADER_UPSTREAM_REQUEST_ID: &str = "x-request-id";

// Timeouts
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const TIME_PROBE_TIMEOUT_SECS: u64 = 5;

// Clock skew advisory
pub const CLOCK_SKEW_TOLERANCE_SECS: i64 = 300;
pub const DEFAULT_TIME_PROBE_URL: &str = "https://worldtimeapi.org/api/timezone/Etc/UTC";

// Paging defaults for product listing
pub const DEFAULT_PRODUCT_STATUS: &str = "all";
pub const DEFAULT_PAGE_OFFSET: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 30;

// Number of secret characters shown in diagnostics previews
pub const SECRET_PREVIEW_LEN: usize = 8;
