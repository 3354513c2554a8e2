//! Rows returned by the reporting queries used by `stats`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSummary {
    pub client: String,
    pub session_count: i64,
    pub total_seconds: i64,
    pub avg_seconds: i64,
    pub last_start: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBreakdown {
    pub app_name: String,
    pub total_seconds: i64,
}
