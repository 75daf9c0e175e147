// Journal - persists engine state changes in the background
//
// The engine pushes events while it still holds the provider lock, so the
// channel order matches the mutation order of every ticket. The writer drains
// the channel outside any critical section.

use crate::application::shutdown::ShutdownToken;
use crate::domain::{Provider, ProviderId, Ticket};
use crate::error::Result;
use crate::port::QueueStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// State change published by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    ProviderUpserted(Provider),
    ProviderRemoved(ProviderId),
    TicketUpserted(Ticket),
}

pub type JournalSender = mpsc::UnboundedSender<QueueEvent>;

/// Create the engine → writer channel
pub fn journal_channel() -> (JournalSender, mpsc::UnboundedReceiver<QueueEvent>) {
    mpsc::unbounded_channel()
}

/// Background writer applying events to a `QueueStore`
pub struct JournalWriter {
    store: Arc<dyn QueueStore>,
    rx: mpsc::UnboundedReceiver<QueueEvent>,
}

/// Counters reported when the writer stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JournalStats {
    pub written: usize,
    pub failed: usize,
}

impl JournalWriter {
    pub fn new(store: Arc<dyn QueueStore>, rx: mpsc::UnboundedReceiver<QueueEvent>) -> Self {
        Self { store, rx }
    }

    /// Run until shutdown is requested or every sender is dropped.
    ///
    /// Events already queued at shutdown are still written.
    pub async fn run(self, mut shutdown: ShutdownToken) -> JournalStats {
        let JournalWriter { store, mut rx } = self;
        let mut stats = JournalStats::default();
        info!("Journal writer started");

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => record(&mut stats, apply(store.as_ref(), &event).await),
                    None => break,
                },
                _ = shutdown.wait() => {
                    while let Ok(event) = rx.try_recv() {
                        record(&mut stats, apply(store.as_ref(), &event).await);
                    }
                    break;
                }
            }
        }

        info!(
            written = stats.written,
            failed = stats.failed,
            "Journal writer stopped"
        );
        stats
    }
}

/// Apply one event to the store
pub async fn apply(store: &dyn QueueStore, event: &QueueEvent) -> Result<()> {
    match event {
        QueueEvent::ProviderUpserted(provider) => store.upsert_provider(provider).await,
        QueueEvent::ProviderRemoved(id) => store.delete_provider(id).await,
        QueueEvent::TicketUpserted(ticket) => store.upsert_ticket(ticket).await,
    }
    .inspect(|_| debug!(?event, "Journal event written"))
    .inspect_err(|e| error!(error = %e, ?event, "Journal write failed"))
}

fn record(stats: &mut JournalStats, outcome: Result<()>) {
    match outcome {
        Ok(()) => stats.written += 1,
        Err(_) => stats.failed += 1,
    }
}
