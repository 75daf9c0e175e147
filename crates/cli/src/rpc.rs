//! Minimal JSON-RPC 2.0 client over reqwest

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

pub struct RpcClient {
    url: String,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` with named params and decode the result
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let response: JsonRpcResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to daemon")?
            .json()
            .await
            .context("Failed to parse response")?;

        if let Some(error) = response.error {
            anyhow::bail!("RPC error ({}): {}", error.code, error.message);
        }

        let result = response
            .result
            .ok_or_else(|| anyhow::anyhow!("No result in response"))?;
        serde_json::from_value(result).with_context(|| format!("Unexpected {} result", method))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub display_number: u32,
    pub client_name: String,
    pub provider_id: String,
    pub state: String,
    pub created_at: i64,
    pub called_at: Option<i64>,
    pub finished_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketView {
    pub ticket: Ticket,
    pub position: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registered {
    pub ticket_id: String,
    pub display_number: u32,
    pub position: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallNext {
    pub ticket: Option<Ticket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Serving {
    pub display_number: u32,
    pub client_name: String,
    pub called_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Waiting {
    pub ticket_id: String,
    pub display_number: u32,
    pub client_name: String,
    pub position: usize,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSnapshot {
    pub provider: Provider,
    pub serving: Option<Serving>,
    pub waiting: Vec<Waiting>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub providers_active: usize,
    pub providers_total: usize,
    pub waiting_count: usize,
    pub serving_count: usize,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Totals {
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
    pub totals: Totals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stats {
    pub period: String,
    #[serde(flatten)]
    pub totals: Totals,
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
pub struct Daily {
    pub day_start: i64,
    pub completed_count: usize,
    pub providers: Vec<ProviderDay>,
}
