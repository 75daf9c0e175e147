//! Walk-in Queue Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    CallNextResponse, CreateProviderRequest, DailySummary, FindTicketRequest, HistoryRequest,
    Provider, ProviderRequest, QueueSnapshot, RegisterTicketRequest, RegisterTicketResponse,
    RemoveProviderResponse, SetProviderActiveRequest, SnapshotRequest, StatsRequest,
    StatsResponse, StatusResponse, Ticket, TicketRequest, TicketView,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Walk-in queue daemon client
///
/// # Example
///
/// ```no_run
/// use walkin_sdk::WalkinClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WalkinClient::connect("http://127.0.0.1:9610").await?;
/// let carlos = client.create_provider("Carlos").await?;
/// let ticket = client.register("Alice", 7, &carlos.id).await?;
/// println!("Alice is #{} in line", ticket.position);
/// # Ok(())
/// # }
/// ```
pub struct WalkinClient {
    client: HttpClient,
}

impl WalkinClient {
    /// Connect to the daemon at `url` (e.g. `http://127.0.0.1:9610`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    // ----- providers -----

    pub async fn list_providers(&self) -> Result<Vec<Provider>> {
        Ok(self.client.request("provider.list.v1", rpc_params![]).await?)
    }

    pub async fn create_provider(&self, name: impl Into<String>) -> Result<Provider> {
        let request = CreateProviderRequest { name: name.into() };
        self.call("provider.create.v1", &request).await
    }

    /// Activate or deactivate a provider. Deactivation stops new
    /// registrations but keeps the existing line.
    pub async fn set_provider_active(
        &self,
        provider_id: impl Into<String>,
        active: bool,
    ) -> Result<Provider> {
        let request = SetProviderActiveRequest {
            provider_id: provider_id.into(),
            active,
        };
        self.call("provider.set_active.v1", &request).await
    }

    /// Remove a provider. Fails with a conflict while it has active tickets.
    pub async fn remove_provider(
        &self,
        provider_id: impl Into<String>,
    ) -> Result<RemoveProviderResponse> {
        let request = ProviderRequest {
            provider_id: provider_id.into(),
        };
        self.call("provider.remove.v1", &request).await
    }

    // ----- tickets -----

    pub async fn register(
        &self,
        name: impl Into<String>,
        display_number: i64,
        provider_id: impl Into<String>,
    ) -> Result<RegisterTicketResponse> {
        let request = RegisterTicketRequest {
            name: name.into(),
            display_number,
            provider_id: provider_id.into(),
        };
        self.call("ticket.register.v1", &request).await
    }

    /// Promote the head of the provider's line. `None` when nobody waits.
    pub async fn call_next(&self, provider_id: impl Into<String>) -> Result<Option<Ticket>> {
        let request = ProviderRequest {
            provider_id: provider_id.into(),
        };
        let response: CallNextResponse = self.call("queue.call_next.v1", &request).await?;
        Ok(response.ticket)
    }

    pub async fn complete(&self, ticket_id: impl Into<String>) -> Result<Ticket> {
        let request = TicketRequest {
            ticket_id: ticket_id.into(),
        };
        self.call("ticket.complete.v1", &request).await
    }

    pub async fn cancel(&self, ticket_id: impl Into<String>) -> Result<Ticket> {
        let request = TicketRequest {
            ticket_id: ticket_id.into(),
        };
        self.call("ticket.cancel.v1", &request).await
    }

    pub async fn get_ticket(&self, ticket_id: impl Into<String>) -> Result<TicketView> {
        let request = TicketRequest {
            ticket_id: ticket_id.into(),
        };
        self.call("ticket.get.v1", &request).await
    }

    /// Look up the active ticket holding `display_number`
    pub async fn find_ticket(&self, display_number: i64) -> Result<TicketView> {
        self.call("ticket.find.v1", &FindTicketRequest { display_number })
            .await
    }

    // ----- views -----

    /// All queues, or just one when `provider_id` is given
    pub async fn snapshot(&self, provider_id: Option<String>) -> Result<Vec<QueueSnapshot>> {
        self.call("queue.snapshot.v1", &SnapshotRequest { provider_id })
            .await
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        Ok(self.client.request("admin.status.v1", rpc_params![]).await?)
    }

    pub async fn stats(&self, request: StatsRequest) -> Result<StatsResponse> {
        self.call("report.stats.v1", &request).await
    }

    pub async fn daily(&self) -> Result<DailySummary> {
        Ok(self.client.request("report.daily.v1", rpc_params![]).await?)
    }

    pub async fn history(&self, request: HistoryRequest) -> Result<Vec<Ticket>> {
        self.call("report.history.v1", &request).await
    }

    /// Send `request` as named parameters
    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let params = object_params(request)?;
        Ok(self.client.request(method, params).await?)
    }
}

fn object_params<T: Serialize>(request: &T) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    match serde_json::to_value(request)? {
        serde_json::Value::Object(fields) => {
            for (name, value) in fields {
                params.insert(&name, value)?;
            }
        }
        other => {
            return Err(SdkError::Other(format!(
                "request must serialize to an object, got {}",
                other
            )))
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::core::traits::ToRpcParams;

    #[test]
    fn test_requests_are_sent_as_named_params() {
        let request = RegisterTicketRequest {
            name: "Alice".into(),
            display_number: 7,
            provider_id: "p-1".into(),
        };
        let raw = object_params(&request)
            .unwrap()
            .to_rpc_params()
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(raw.get()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "Alice", "display_number": 7, "provider_id": "p-1"})
        );
    }

    #[test]
    fn test_empty_request_sends_no_params() {
        let raw = object_params(&HistoryRequest::default())
            .unwrap()
            .to_rpc_params()
            .unwrap();
        assert!(raw.is_none());
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let result = WalkinClient::connect("not a url").await;
        assert!(matches!(result, Err(SdkError::Connection(_))));
    }
}
