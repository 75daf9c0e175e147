//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from api-rpc crate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    Waiting,
    Serving,
    Completed,
    Cancelled,
}

impl TicketState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketState::Completed | TicketState::Cancelled)
    }
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketState::Waiting => write!(f, "WAITING"),
            TicketState::Serving => write!(f, "SERVING"),
            TicketState::Completed => write!(f, "COMPLETED"),
            TicketState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub seq: u64,
    pub display_number: u32,
    pub client_name: String,
    pub provider_id: String,
    pub state: TicketState,
    pub created_at: i64,
    pub called_at: Option<i64>,
    pub finished_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProviderRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetProviderActiveRequest {
    pub provider_id: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderRequest {
    pub provider_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveProviderResponse {
    pub provider_id: String,
    pub removed: bool,
}

/// Request to register a walk-in client
#[derive(Debug, Clone, Serialize)]
pub struct RegisterTicketRequest {
    pub name: String,
    pub display_number: i64,
    pub provider_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterTicketResponse {
    pub ticket_id: String,
    pub display_number: u32,
    pub provider_id: String,
    /// 1-based position in the provider's waiting line
    pub position: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketRequest {
    pub ticket_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FindTicketRequest {
    pub display_number: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallNextResponse {
    pub ticket: Option<Ticket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketView {
    pub ticket: Ticket,
    /// Present only while the ticket is waiting
    pub position: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SnapshotRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServingEntry {
    pub ticket_id: String,
    pub display_number: u32,
    pub client_name: String,
    pub called_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitingEntry {
    pub ticket_id: String,
    pub display_number: u32,
    pub client_name: String,
    pub position: usize,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSnapshot {
    pub provider: Provider,
    pub serving: Option<ServingEntry>,
    pub waiting: Vec<WaitingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub providers_active: usize,
    pub providers_total: usize,
    pub waiting_count: usize,
    pub serving_count: usize,
    pub active_tickets: usize,
    pub version: String,
    pub uptime_seconds: u64,
}

/// `period` is one of `today`, `week`, `month`, `year`, `all` (default `today`)
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketTotals {
    pub finished_count: usize,
    pub completed_count: usize,
    pub cancelled_count: usize,
    pub in_progress_count: usize,
    pub avg_wait_ms: i64,
    pub avg_service_ms: i64,
    pub avg_total_ms: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderStats {
    pub provider_id: String,
    pub provider_name: Option<String>,
    #[serde(flatten)]
    pub totals: TicketTotals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub period: String,
    pub window_start: Option<i64>,
    pub window_end: i64,
    #[serde(flatten)]
    pub totals: TicketTotals,
    pub per_provider: Vec<ProviderStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderDay {
    pub provider_id: String,
    pub provider_name: Option<String>,
    pub completed_count: usize,
    pub total_service_ms: i64,
    pub first_call_at: Option<i64>,
    pub last_call_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailySummary {
    pub day_start: i64,
    pub completed_count: usize,
    pub providers: Vec<ProviderDay>,
}

/// Finished tickets created in `[from, to)` (epoch ms)
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_response_reads_flattened_totals() {
        let raw = json!({
            "period": "week",
            "window_start": 1,
            "window_end": 2,
            "finished_count": 3,
            "completed_count": 2,
            "cancelled_count": 1,
            "in_progress_count": 0,
            "avg_wait_ms": 10,
            "avg_service_ms": 20,
            "avg_total_ms": 30,
            "per_provider": []
        });
        let resp: StatsResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.period, "week");
        assert_eq!(resp.totals.completed_count, 2);
        assert_eq!(resp.totals.avg_total_ms, 30);
    }

    #[test]
    fn test_empty_filters_are_omitted() {
        assert_eq!(serde_json::to_value(HistoryRequest::default()).unwrap(), json!({}));
        let req = StatsRequest {
            period: Some("all".into()),
            provider_id: None,
        };
        assert_eq!(serde_json::to_value(req).unwrap(), json!({"period": "all"}));
    }
}
