// Queue Store Port (Interface)

use crate::domain::{Provider, ProviderId, Ticket};
use crate::error::Result;
use async_trait::async_trait;

/// Everything needed to rebuild the engine after a restart
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub providers: Vec<Provider>,
    pub tickets: Vec<Ticket>,
}

/// Durable storage for providers and ticket history.
///
/// Writes are idempotent upserts keyed by id; the journal replays the latest
/// state of an entity, never a delta.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Load all registered providers and every ticket (active and terminal)
    async fn load(&self) -> Result<StoreSnapshot>;

    /// Insert or update a provider
    async fn upsert_provider(&self, provider: &Provider) -> Result<()>;

    /// Delete a provider row; its tickets are kept
    async fn delete_provider(&self, id: &ProviderId) -> Result<()>;

    /// Insert or update a ticket
    async fn upsert_ticket(&self, ticket: &Ticket) -> Result<()>;
}

/// In-memory store for tests
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MemoryQueueStore {
        providers: Mutex<HashMap<ProviderId, Provider>>,
        tickets: Mutex<HashMap<String, Ticket>>,
        fail_writes: Mutex<bool>,
    }

    impl MemoryQueueStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent write fail with a database error
        pub fn set_fail_writes(&self, fail: bool) {
            *self.fail_writes.lock() = fail;
        }

        pub fn ticket(&self, id: &str) -> Option<Ticket> {
            self.tickets.lock().get(id).cloned()
        }

        pub fn provider(&self, id: &str) -> Option<Provider> {
            self.providers.lock().get(id).cloned()
        }

        fn check_writable(&self) -> Result<()> {
            if *self.fail_writes.lock() {
                return Err(crate::error::AppError::Database(
                    "memory store is read-only".to_string(),
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl QueueStore for MemoryQueueStore {
        async fn load(&self) -> Result<StoreSnapshot> {
            Ok(StoreSnapshot {
                providers: self.providers.lock().values().cloned().collect(),
                tickets: self.tickets.lock().values().cloned().collect(),
            })
        }

        async fn upsert_provider(&self, provider: &Provider) -> Result<()> {
            self.check_writable()?;
            self.providers
                .lock()
                .insert(provider.id.clone(), provider.clone());
            Ok(())
        }

        async fn delete_provider(&self, id: &ProviderId) -> Result<()> {
            self.check_writable()?;
            self.providers.lock().remove(id);
            Ok(())
        }

        async fn upsert_ticket(&self, ticket: &Ticket) -> Result<()> {
            self.check_writable()?;
            self.tickets.lock().insert(ticket.id.clone(), ticket.clone());
            Ok(())
        }
    }
}
