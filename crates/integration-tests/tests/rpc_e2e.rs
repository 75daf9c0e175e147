//! JSON-RPC end-to-end through the SDK on an ephemeral port

use std::sync::Arc;

use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::HttpClientBuilder;
use serde_json::Value;
use walkin_api_rpc::{RateLimitConfig, RpcServer, RpcServerConfig, RunningServer};
use walkin_core::application::QueueEngine;
use walkin_core::port::{SequentialIdProvider, SystemTimeProvider};
use walkin_sdk::{code, HistoryRequest, StatsRequest, TicketState, WalkinClient};

async fn start(rate_limit: RateLimitConfig) -> (RunningServer, WalkinClient) {
    let engine = Arc::new(QueueEngine::new(
        Arc::new(SequentialIdProvider::new("t")),
        Arc::new(SystemTimeProvider),
    ));
    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        rate_limit,
    };
    let server = RpcServer::new(config, engine).start().await.unwrap();
    let client = WalkinClient::connect(server.url()).await.unwrap();
    (server, client)
}

#[tokio::test]
async fn test_full_service_over_rpc() {
    let (server, client) = start(RateLimitConfig::default()).await;

    let carlos = client.create_provider("Carlos").await.unwrap();
    assert!(carlos.active);

    let alice = client.register("Alice", 1, &carlos.id).await.unwrap();
    let bruno = client.register("Bruno", 2, &carlos.id).await.unwrap();
    assert_eq!((alice.position, bruno.position), (1, 2));

    let serving = client.call_next(&carlos.id).await.unwrap().unwrap();
    assert_eq!(serving.id, alice.ticket_id);
    assert_eq!(serving.state, TicketState::Serving);

    let view = client.get_ticket(&bruno.ticket_id).await.unwrap();
    assert_eq!(view.position, Some(1));
    let found = client.find_ticket(2).await.unwrap();
    assert_eq!(found.ticket.id, bruno.ticket_id);

    let queues = client.snapshot(None).await.unwrap();
    assert_eq!(queues.len(), 1);
    assert_eq!(queues[0].serving.as_ref().unwrap().display_number, 1);
    assert_eq!(queues[0].waiting[0].client_name, "Bruno");

    let done = client.complete(&alice.ticket_id).await.unwrap();
    assert_eq!(done.state, TicketState::Completed);
    client.cancel(&bruno.ticket_id).await.unwrap();

    let status = client.status().await.unwrap();
    assert_eq!(status.providers_total, 1);
    assert_eq!(status.waiting_count, 0);
    assert_eq!(status.active_tickets, 0);

    let stats = client.stats(StatsRequest::default()).await.unwrap();
    assert_eq!(stats.period, "today");
    assert_eq!(stats.totals.completed_count, 1);
    assert_eq!(stats.totals.cancelled_count, 1);

    let daily = client.daily().await.unwrap();
    assert_eq!(daily.completed_count, 1);

    let history = client.history(HistoryRequest::default()).await.unwrap();
    assert_eq!(history.len(), 2);

    let removed = client.remove_provider(&carlos.id).await.unwrap();
    assert!(removed.removed);
    assert!(client.list_providers().await.unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_errors_carry_code_and_kind() {
    let (server, client) = start(RateLimitConfig::default()).await;
    let carlos = client.create_provider("Carlos").await.unwrap();

    let err = client.register("A", 1, &carlos.id).await.unwrap_err();
    assert!(err.is_validation(), "{:?}", err);

    let err = client.call_next("nobody").await.unwrap_err();
    assert!(err.is_not_found(), "{:?}", err);

    client.register("Alice", 1, &carlos.id).await.unwrap();
    let err = client.remove_provider(&carlos.id).await.unwrap_err();
    assert!(err.is_conflict(), "{:?}", err);
    match err {
        walkin_sdk::SdkError::Rpc { kind, .. } => assert_eq!(kind.as_deref(), Some("conflict")),
        other => panic!("unexpected {:?}", other),
    }

    let err = client
        .stats(StatsRequest {
            period: Some("decade".into()),
            provider_id: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(code::VALIDATION));

    server.stop().await;
}

#[tokio::test]
async fn test_mutations_are_throttled() {
    let (server, client) = start(RateLimitConfig {
        burst: 2,
        per_second: 1,
    })
    .await;

    client.create_provider("Carlos").await.unwrap();
    client.create_provider("Dora").await.unwrap();
    let err = client.create_provider("Elena").await.unwrap_err();
    assert!(err.is_throttled(), "{:?}", err);

    // Reads never consume tokens
    assert_eq!(client.list_providers().await.unwrap().len(), 2);

    server.stop().await;
}

#[tokio::test]
async fn test_malformed_params_are_validation_errors() {
    let (server, client) = start(RateLimitConfig::default()).await;
    let carlos = client.create_provider("Carlos").await.unwrap();
    let raw = HttpClientBuilder::default().build(server.url()).unwrap();

    let mut params = ObjectParams::new();
    params.insert("name", "Alice").unwrap();
    params.insert("display_number", "seven").unwrap();
    params.insert("provider_id", &carlos.id).unwrap();
    let err = raw
        .request::<Value, _>("ticket.register.v1", params)
        .await
        .unwrap_err();
    let err = walkin_sdk::SdkError::from(err);
    assert!(err.is_validation(), "{:?}", err);

    let mut params = ObjectParams::new();
    params.insert("active", true).unwrap();
    let err = raw
        .request::<Value, _>("provider.create.v1", params)
        .await
        .unwrap_err();
    let err = walkin_sdk::SdkError::from(err);
    assert!(err.is_validation(), "{:?}", err);
    assert_eq!(err.code(), Some(code::VALIDATION));

    // Optional params still reject a wrong shape
    let mut params = ObjectParams::new();
    params.insert("provider_id", 42).unwrap();
    let err = raw
        .request::<Value, _>("queue.snapshot.v1", params)
        .await
        .unwrap_err();
    assert!(walkin_sdk::SdkError::from(err).is_validation());

    assert!(client.snapshot(None).await.unwrap()[0].waiting.is_empty());
    server.stop().await;
}
