//! Walk-in Queue SDK - Rust Client Library
//!
//! Typed client for the walk-in queue daemon's JSON-RPC API.
//!
//! # Example
//!
//! ```no_run
//! use walkin_sdk::WalkinClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WalkinClient::connect("http://127.0.0.1:9610").await?;
//!
//!     let provider = client.create_provider("Carlos").await?;
//!     client.register("Alice", 12, &provider.id).await?;
//!
//!     if let Some(ticket) = client.call_next(&provider.id).await? {
//!         println!("Now serving #{} {}", ticket.display_number, ticket.client_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::WalkinClient;
pub use error::{code, Result, SdkError};
pub use types::{
    CallNextResponse, CreateProviderRequest, DailySummary, FindTicketRequest, HistoryRequest,
    Provider, ProviderDay, ProviderRequest, ProviderStats, QueueSnapshot, RegisterTicketRequest,
    RegisterTicketResponse, RemoveProviderResponse, ServingEntry, SetProviderActiveRequest,
    SnapshotRequest, StatsRequest, StatsResponse, StatusResponse, Ticket, TicketRequest,
    TicketState, TicketTotals, TicketView, WaitingEntry,
};
