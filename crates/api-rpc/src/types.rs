//! RPC Request/Response Types
//!
//! Parameters are JSON objects keyed by field name. Results reuse the core
//! view types where they already have the right shape.

use serde::{Deserialize, Serialize};
use walkin_core::application::{StatsReport, TicketFilter};
use walkin_core::domain::{ProviderSummary, SystemStatus, Ticket};

/// provider.create.v1
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProviderRequest {
    pub name: String,
}

/// provider.set_active.v1
#[derive(Debug, Clone, Deserialize)]
pub struct SetProviderActiveRequest {
    pub provider_id: String,
    pub active: bool,
}

/// provider.remove.v1, queue.call_next.v1
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRequest {
    pub provider_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveProviderResponse {
    pub provider_id: String,
    pub removed: bool,
}

/// ticket.register.v1
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterTicketRequest {
    pub name: String,
    pub display_number: i64,
    pub provider_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterTicketResponse {
    pub ticket_id: String,
    pub display_number: u32,
    pub provider_id: String,
    pub position: usize,
}

/// ticket.complete.v1, ticket.cancel.v1, ticket.get.v1
#[derive(Debug, Clone, Deserialize)]
pub struct TicketRequest {
    pub ticket_id: String,
}

/// ticket.find.v1
#[derive(Debug, Clone, Deserialize)]
pub struct FindTicketRequest {
    pub display_number: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallNextResponse {
    /// `None` when nobody is waiting
    pub ticket: Option<Ticket>,
}

/// queue.snapshot.v1 (all providers when `provider_id` is absent)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotRequest {
    #[serde(default)]
    pub provider_id: Option<String>,
}

/// admin.status.v1
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: SystemStatus,
    pub active_tickets: usize,
    pub version: String,
    pub uptime_seconds: u64,
}

/// report.stats.v1
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsRequest {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
}

pub type StatsResponse = StatsReport;

/// report.history.v1 - creation window `[from, to)` in epoch ms
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryRequest {
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub to: Option<i64>,
}

impl From<HistoryRequest> for TicketFilter {
    fn from(req: HistoryRequest) -> Self {
        TicketFilter {
            provider_id: req.provider_id,
            created_from: req.from,
            created_to: req.to,
        }
    }
}

pub type ProviderResponse = ProviderSummary;
