// Queue Engine - single mutation gateway for providers and tickets
//
// Locking discipline:
// - one `Mutex<ProviderQueue>` per provider, held for the whole mutation
// - `tickets` (registry) is only taken while a provider lock is held, never
//   the other way around
// - `providers` (map) is held just long enough to clone a slot, except in
//   `register_provider` and `remove_provider`, which publish under it;
//   `remove_provider` takes it after the provider lock
// - no operation holds two provider locks

mod registry;
mod restore;


use crate::application::journal::{JournalSender, QueueEvent};
use crate::domain::ticket::normalize_name;
use crate::domain::{
    DisplayNumber, DomainError, Provider, ProviderId, ProviderQueue, ProviderSummary,
    QueueSnapshot, SystemStatus, Ticket, TicketState, TicketView,
};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TimeProvider};
use parking_lot::{Mutex, RwLock};
use registry::{TicketEntry, TicketRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Provider handle; `name` and `seq` are immutable after registration
#[derive(Clone)]
struct ProviderSlot {
    name: String,
    seq: u64,
    queue: Arc<Mutex<ProviderQueue>>,
}

impl ProviderSlot {
    fn new(provider: Provider) -> Self {
        Self {
            name: provider.name.clone(),
            seq: provider.seq,
            queue: Arc::new(Mutex::new(ProviderQueue::new(provider))),
        }
    }
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enqueued {
    pub ticket: Ticket,
    pub position: usize,
}

/// Ticket selection by provider and creation window `[created_from, created_to)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    #[serde(default)]
    pub provider_id: Option<ProviderId>,
    #[serde(default)]
    pub created_from: Option<i64>,
    #[serde(default)]
    pub created_to: Option<i64>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(provider_id) = &self.provider_id {
            if &ticket.provider_id != provider_id {
                return false;
            }
        }
        if let Some(from) = self.created_from {
            if ticket.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.created_to {
            if ticket.created_at >= to {
                return false;
            }
        }
        true
    }
}

/// Process-wide registry of provider queues
pub struct QueueEngine {
    providers: RwLock<HashMap<ProviderId, ProviderSlot>>,
    tickets: RwLock<TicketRegistry>,
    provider_seq: AtomicU64,
    ticket_seq: AtomicU64,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    journal: Option<JournalSender>,
}

impl QueueEngine {
    pub fn new(id_provider: Arc<dyn IdProvider>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            tickets: RwLock::new(TicketRegistry::default()),
            provider_seq: AtomicU64::new(1),
            ticket_seq: AtomicU64::new(1),
            id_provider,
            time_provider,
            journal: None,
        }
    }

    /// Publish every state change to `journal`
    pub fn with_journal(mut self, journal: JournalSender) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn time_provider(&self) -> Arc<dyn TimeProvider> {
        Arc::clone(&self.time_provider)
    }

    // ------------------------------------------------------------------
    // Providers
    // ------------------------------------------------------------------

    pub fn register_provider(&self, name: &str) -> Result<Provider> {
        let name = normalize_name("Provider name", name)?;

        let mut providers = self.providers.write();
        if providers.values().any(|slot| slot.name == name) {
            return Err(AppError::Conflict(format!(
                "A provider named '{}' already exists",
                name
            )));
        }

        let provider = Provider::new(
            self.id_provider.generate_id(),
            name,
            self.provider_seq.fetch_add(1, Ordering::SeqCst),
            self.time_provider.now_millis(),
        );
        providers.insert(provider.id.clone(), ProviderSlot::new(provider.clone()));
        // Published under the map lock so a same-name removal is journaled first
        self.publish(QueueEvent::ProviderUpserted(provider.clone()));
        drop(providers);

        info!(provider_id = %provider.id, name = %provider.name, "Provider registered");
        Ok(provider)
    }

    pub fn set_provider_active(&self, provider_id: &str, active: bool) -> Result<ProviderSummary> {
        let slot = self.slot(provider_id)?;
        let mut queue = slot.queue.lock();
        ensure_live(&queue, provider_id)?;

        queue.set_active(active);
        let provider = queue.provider().clone();
        self.publish(QueueEvent::ProviderUpserted(provider.clone()));

        info!(
            provider_id = %provider_id,
            active,
            waiting = queue.waiting_len(),
            serving = queue.serving().is_some(),
            "Provider activation changed"
        );
        Ok(provider.summary())
    }

    pub fn remove_provider(&self, provider_id: &str) -> Result<()> {
        let slot = self.slot(provider_id)?;
        let mut queue = slot.queue.lock();
        ensure_live(&queue, provider_id)?;

        if let Err(e) = queue.retire() {
            warn!(
                provider_id = %provider_id,
                waiting = queue.waiting_len(),
                serving = queue.serving().is_some(),
                "Refusing to remove provider with clients"
            );
            return Err(e.into());
        }
        let mut providers = self.providers.write();
        providers.remove(provider_id);
        self.publish(QueueEvent::ProviderRemoved(provider_id.to_string()));
        drop(providers);

        info!(provider_id = %provider_id, "Provider removed");
        Ok(())
    }

    /// Registered providers in registration order
    pub fn list_providers(&self) -> Vec<ProviderSummary> {
        self.slots_in_order()
            .into_iter()
            .filter_map(|slot| {
                let queue = slot.queue.lock();
                (!queue.is_removed()).then(|| queue.provider().summary())
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Tickets
    // ------------------------------------------------------------------

    pub fn enqueue_ticket(
        &self,
        provider_id: &str,
        display_number: i64,
        client_name: &str,
    ) -> Result<Enqueued> {
        let client_name = normalize_name("Client name", client_name)?;
        let display_number = DisplayNumber::new(display_number)?;

        let slot = self.slot(provider_id)?;
        let mut queue = slot.queue.lock();
        ensure_live(&queue, provider_id)?;
        queue.ensure_accepting()?;

        let mut registry = self.tickets.write();
        if registry.holder_of(display_number).is_some() {
            return Err(AppError::Validation(format!(
                "Display number {} is already in use by an active ticket",
                display_number
            )));
        }

        let ticket = Ticket::new(
            self.id_provider.generate_id(),
            self.ticket_seq.fetch_add(1, Ordering::SeqCst),
            display_number,
            client_name,
            provider_id,
            self.time_provider.now_millis(),
        );
        let position = queue.enqueue(ticket.clone())?;
        registry.insert_active(&ticket);
        drop(registry);

        self.publish(QueueEvent::TicketUpserted(ticket.clone()));
        info!(
            ticket_id = %ticket.id,
            provider_id = %provider_id,
            display_number = %ticket.display_number,
            position,
            "Ticket enqueued"
        );
        Ok(Enqueued { ticket, position })
    }

    /// Start serving the next waiting client; `Ok(None)` when nobody waits
    pub fn call_next(&self, provider_id: &str) -> Result<Option<Ticket>> {
        let slot = self.slot(provider_id)?;
        let mut queue = slot.queue.lock();
        ensure_live(&queue, provider_id)?;

        let called = queue
            .call_next(self.time_provider.now_millis())
            .inspect_err(|e| debug!(provider_id = %provider_id, error = %e, "Call next rejected"))?;

        match &called {
            Some(ticket) => {
                self.publish(QueueEvent::TicketUpserted(ticket.clone()));
                info!(
                    ticket_id = %ticket.id,
                    provider_id = %provider_id,
                    display_number = %ticket.display_number,
                    "Ticket called"
                );
            }
            None => debug!(provider_id = %provider_id, "No ticket waiting"),
        }
        Ok(called)
    }

    pub fn complete_service(&self, ticket_id: &str) -> Result<Ticket> {
        let slot = self.active_slot(ticket_id)?;
        let mut queue = slot.queue.lock();

        let ticket = match queue.complete(ticket_id, self.time_provider.now_millis()) {
            Ok(ticket) => ticket,
            Err(DomainError::TicketNotInQueue { .. }) => {
                return Err(self.already_finished(ticket_id))
            }
            Err(e) => return Err(e.into()),
        };
        self.tickets.write().close(ticket.clone());
        self.publish(QueueEvent::TicketUpserted(ticket.clone()));

        info!(
            ticket_id = %ticket.id,
            provider_id = %ticket.provider_id,
            service_ms = ?ticket.service_ms(),
            "Service completed"
        );
        Ok(ticket)
    }

    pub fn cancel_ticket(&self, ticket_id: &str) -> Result<Ticket> {
        let slot = self.active_slot(ticket_id)?;
        let mut queue = slot.queue.lock();

        let ticket = match queue.cancel(ticket_id, self.time_provider.now_millis()) {
            Ok(ticket) => ticket,
            Err(DomainError::TicketNotInQueue { .. }) => {
                return Err(self.already_finished(ticket_id))
            }
            Err(e) => return Err(e.into()),
        };
        self.tickets.write().close(ticket.clone());
        self.publish(QueueEvent::TicketUpserted(ticket.clone()));

        info!(
            ticket_id = %ticket.id,
            provider_id = %ticket.provider_id,
            was_serving = ticket.called_at.is_some(),
            "Ticket cancelled"
        );
        Ok(ticket)
    }

    /// Any ticket (active or terminal), with its position while Waiting
    pub fn get_ticket(&self, ticket_id: &str) -> Result<TicketView> {
        let entry = self.tickets.read().get(ticket_id).cloned();
        match entry {
            None => Err(ticket_not_found(ticket_id)),
            Some(TicketEntry::Closed(ticket)) => Ok(TicketView {
                ticket,
                position: None,
            }),
            Some(TicketEntry::Active(provider_id)) => {
                // Release the map before taking the provider lock
                let slot = self.providers.read().get(&provider_id).cloned();
                if let Some(slot) = slot {
                    let queue = slot.queue.lock();
                    if let Some(ticket) = queue.find(ticket_id) {
                        return Ok(TicketView {
                            ticket: ticket.clone(),
                            position: queue.position_of(ticket_id),
                        });
                    }
                }
                // Finished between the two reads
                match self.tickets.read().get(ticket_id) {
                    Some(TicketEntry::Closed(ticket)) => Ok(TicketView {
                        ticket: ticket.clone(),
                        position: None,
                    }),
                    _ => Err(ticket_not_found(ticket_id)),
                }
            }
        }
    }

    /// The active ticket holding `display_number`
    pub fn find_active_ticket(&self, display_number: i64) -> Result<TicketView> {
        let number = DisplayNumber::new(display_number)?;
        let holder = self.tickets.read().holder_of(number).cloned();
        let ticket_id = holder.ok_or_else(|| {
            AppError::NotFound(format!("No active ticket with number {}", number))
        })?;

        let view = self.get_ticket(&ticket_id)?;
        if view.ticket.state.is_terminal() {
            return Err(AppError::NotFound(format!(
                "No active ticket with number {}",
                number
            )));
        }
        Ok(view)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn queue_snapshot(&self, provider_id: &str) -> Result<QueueSnapshot> {
        let slot = self.slot(provider_id)?;
        let queue = slot.queue.lock();
        ensure_live(&queue, provider_id)?;
        Ok(queue.snapshot())
    }

    /// One snapshot per provider, each taken under its own lock
    pub fn all_queues(&self) -> Vec<QueueSnapshot> {
        self.slots_in_order()
            .into_iter()
            .filter_map(|slot| {
                let queue = slot.queue.lock();
                (!queue.is_removed()).then(|| queue.snapshot())
            })
            .collect()
    }

    pub fn system_status(&self) -> SystemStatus {
        let mut status = SystemStatus::default();
        for slot in self.slots_in_order() {
            let queue = slot.queue.lock();
            if queue.is_removed() {
                continue;
            }
            status.providers_total += 1;
            if queue.is_active() {
                status.providers_active += 1;
            }
            status.waiting_count += queue.waiting_len();
            if queue.serving().is_some() {
                status.serving_count += 1;
            }
        }
        status
    }

    /// Active and terminal tickets matching `filter`, in arrival order
    pub fn tickets(&self, filter: &TicketFilter) -> Vec<Ticket> {
        let mut by_id: HashMap<String, Ticket> = HashMap::new();

        // Active tickets first; a ticket that finishes meanwhile is replaced by
        // its terminal copy from the registry below.
        for slot in self.slots_in_order() {
            let queue = slot.queue.lock();
            for ticket in queue.active_tickets().filter(|t| filter.matches(t)) {
                by_id.insert(ticket.id.clone(), ticket.clone());
            }
        }
        for ticket in self.tickets.read().closed().filter(|t| filter.matches(t)) {
            by_id.insert(ticket.id.clone(), ticket.clone());
        }

        let mut tickets: Vec<Ticket> = by_id.into_values().collect();
        tickets.sort_by_key(|t| t.seq);
        tickets
    }

    /// Terminal tickets matching `filter`, in arrival order
    pub fn history(&self, filter: &TicketFilter) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .read()
            .closed()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tickets.sort_by_key(|t| t.seq);
        tickets
    }

    /// Names of currently registered providers
    pub fn provider_names(&self) -> HashMap<ProviderId, String> {
        self.providers
            .read()
            .iter()
            .map(|(id, slot)| (id.clone(), slot.name.clone()))
            .collect()
    }

    /// Number of Waiting + Serving tickets across all providers
    pub fn active_ticket_count(&self) -> usize {
        self.tickets.read().active_count()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn slot(&self, provider_id: &str) -> Result<ProviderSlot> {
        self.providers
            .read()
            .get(provider_id)
            .cloned()
            .ok_or_else(|| provider_not_found(provider_id))
    }

    fn slots_in_order(&self) -> Vec<ProviderSlot> {
        let mut slots: Vec<ProviderSlot> = self.providers.read().values().cloned().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots
    }

    /// Slot of the provider holding an active ticket
    fn active_slot(&self, ticket_id: &str) -> Result<ProviderSlot> {
        let entry = self.tickets.read().get(ticket_id).cloned();
        match entry {
            None => Err(ticket_not_found(ticket_id)),
            Some(TicketEntry::Closed(ticket)) => Err(finished_conflict(&ticket)),
            Some(TicketEntry::Active(provider_id)) => self
                .slot(&provider_id)
                .map_err(|_| self.already_finished(ticket_id)),
        }
    }

    /// Error for a ticket that left its queue before we took the lock
    fn already_finished(&self, ticket_id: &str) -> AppError {
        match self.tickets.read().get(ticket_id) {
            Some(TicketEntry::Closed(ticket)) => finished_conflict(ticket),
            Some(TicketEntry::Active(_)) => {
                AppError::Conflict(format!("Ticket {} is not in its queue", ticket_id))
            }
            None => ticket_not_found(ticket_id),
        }
    }

    fn publish(&self, event: QueueEvent) {
        if let Some(journal) = &self.journal {
            if journal.send(event).is_err() {
                warn!("Journal channel closed; state change not persisted");
            }
        }
    }
}

fn ensure_live(queue: &ProviderQueue, provider_id: &str) -> Result<()> {
    if queue.is_removed() {
        return Err(provider_not_found(provider_id));
    }
    Ok(())
}

fn provider_not_found(provider_id: &str) -> AppError {
    AppError::NotFound(format!("Provider {} not found", provider_id))
}

fn ticket_not_found(ticket_id: &str) -> AppError {
    AppError::NotFound(format!("Ticket {} not found", ticket_id))
}

fn finished_conflict(ticket: &Ticket) -> AppError {
    let state = match ticket.state {
        TicketState::Completed => "completed",
        TicketState::Cancelled => "cancelled",
        TicketState::Waiting | TicketState::Serving => "active",
    };
    AppError::Conflict(format!("Ticket {} is already {}", ticket.id, state))
}
