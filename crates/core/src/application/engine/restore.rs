// Engine reconstruction from a stored snapshot

use super::{ProviderSlot, QueueEngine};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, StoreSnapshot, TimeProvider};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

impl QueueEngine {
    /// Rebuild providers, queues and history from `snapshot`.
    ///
    /// Waiting tickets are re-queued by arrival sequence. Sequence counters
    /// resume after the highest stored value.
    pub fn restore(
        snapshot: StoreSnapshot,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self> {
        let engine = Self::new(id_provider, time_provider);
        let StoreSnapshot {
            mut providers,
            mut tickets,
        } = snapshot;
        providers.sort_by_key(|p| p.seq);
        tickets.sort_by_key(|t| t.seq);

        let provider_count = providers.len();
        let max_provider_seq = providers.iter().map(|p| p.seq).max().unwrap_or(0);
        let max_ticket_seq = tickets.iter().map(|t| t.seq).max().unwrap_or(0);

        // Not shared yet: lock order does not matter here
        let mut map = engine.providers.write();
        let mut registry = engine.tickets.write();

        for provider in providers {
            map.insert(provider.id.clone(), ProviderSlot::new(provider));
        }

        let mut active = 0usize;
        let mut closed = 0usize;
        for ticket in tickets {
            if ticket.state.is_terminal() {
                registry.close(ticket);
                closed += 1;
                continue;
            }

            let slot = map.get(&ticket.provider_id).ok_or_else(|| {
                AppError::InvalidState(format!(
                    "Active ticket {} references unknown provider {}",
                    ticket.id, ticket.provider_id
                ))
            })?;
            if let Some(holder) = registry.holder_of(ticket.display_number) {
                return Err(AppError::InvalidState(format!(
                    "Display number {} is held by both {} and {}",
                    ticket.display_number, holder, ticket.id
                )));
            }
            slot.queue
                .lock()
                .restore_ticket(ticket.clone())
                .map_err(|e| {
                    AppError::InvalidState(format!("Cannot restore ticket {}: {}", ticket.id, e))
                })?;
            registry.insert_active(&ticket);
            active += 1;
        }

        drop(registry);
        drop(map);

        engine
            .provider_seq
            .store(max_provider_seq + 1, Ordering::SeqCst);
        engine.ticket_seq.store(max_ticket_seq + 1, Ordering::SeqCst);

        info!(
            providers = provider_count,
            active_tickets = active,
            history_tickets = closed,
            "Queue engine restored"
        );
        Ok(engine)
    }
}
