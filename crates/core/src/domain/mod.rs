// Domain Layer - Pure business logic and entities

pub mod error;
pub mod provider;
pub mod queue;
pub mod ticket;

// Re-exports
pub use error::DomainError;
pub use provider::{Provider, ProviderSummary};
pub use queue::{
    ProviderQueue, QueueSnapshot, ServingEntry, SystemStatus, TicketView, WaitingEntry,
};
pub use ticket::{DisplayNumber, ProviderId, Ticket, TicketId, TicketState};
