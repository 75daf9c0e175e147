// Application Layer - Use Cases and Business Logic

pub mod engine;
pub mod journal;
pub mod shutdown;
pub mod stats;

// Re-exports
pub use engine::{Enqueued, QueueEngine, TicketFilter};
pub use journal::{journal_channel, JournalSender, JournalStats, JournalWriter, QueueEvent};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use stats::{
    DailySummary, ProviderDay, ProviderStats, StatsAggregator, StatsPeriod, StatsReport,
    TicketTotals,
};
