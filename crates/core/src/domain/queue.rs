// Provider Queue Domain Model
//
// Owns the Waiting sequence and the Serving slot of one provider.
// Positions are never stored: they are the 1-based index in `waiting`.

use crate::domain::error::{DomainError, Result};
use crate::domain::provider::{Provider, ProviderSummary};
use crate::domain::ticket::{DisplayNumber, Ticket, TicketId, TicketState};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ProviderQueue {
    provider: Provider,
    waiting: VecDeque<Ticket>,
    serving: Option<Ticket>,
    /// Set under the queue lock when the provider is removed, so holders of a
    /// stale handle observe the removal.
    removed: bool,
}

impl ProviderQueue {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            waiting: VecDeque::new(),
            serving: None,
            removed: false,
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn is_active(&self) -> bool {
        self.provider.active
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn serving(&self) -> Option<&Ticket> {
        self.serving.as_ref()
    }

    /// Waiting and Serving tickets, serving first
    pub fn active_tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.serving.iter().chain(self.waiting.iter())
    }

    pub fn set_active(&mut self, active: bool) {
        self.provider.active = active;
    }

    /// Fails unless the queue accepts new tickets
    pub fn ensure_accepting(&self) -> Result<()> {
        if !self.provider.active {
            return Err(DomainError::ProviderInactive(self.provider.id.clone()));
        }
        Ok(())
    }

    /// Append a Waiting ticket; returns its position
    pub fn enqueue(&mut self, ticket: Ticket) -> Result<usize> {
        self.ensure_accepting()?;
        if ticket.state != TicketState::Waiting {
            return Err(DomainError::InvalidStateTransition {
                from: ticket.state.to_string(),
                to: TicketState::Waiting.to_string(),
            });
        }
        self.waiting.push_back(ticket);
        Ok(self.waiting.len())
    }

    /// Move the front of the Waiting sequence into the Serving slot.
    ///
    /// `Ok(None)` when nobody is waiting.
    pub fn call_next(&mut self, now_millis: i64) -> Result<Option<Ticket>> {
        if !self.provider.active {
            return Err(DomainError::ProviderInactive(self.provider.id.clone()));
        }
        if self.serving.is_some() {
            return Err(DomainError::ProviderBusy(self.provider.id.clone()));
        }
        let Some(front) = self.waiting.front() else {
            return Ok(None);
        };

        // Transition a copy first so a failure leaves the sequence untouched
        let mut ticket = front.clone();
        ticket.start(now_millis)?;
        self.waiting.pop_front();
        self.serving = Some(ticket.clone());
        Ok(Some(ticket))
    }

    /// Serving -> Completed, clearing the slot
    pub fn complete(&mut self, ticket_id: &str, now_millis: i64) -> Result<Ticket> {
        match self.serving.as_ref() {
            Some(serving) if serving.id == ticket_id => {
                let mut ticket = serving.clone();
                ticket.complete(now_millis)?;
                self.serving = None;
                Ok(ticket)
            }
            _ => match self.waiting.iter().find(|t| t.id == ticket_id) {
                Some(waiting) => Err(DomainError::InvalidStateTransition {
                    from: waiting.state.to_string(),
                    to: TicketState::Completed.to_string(),
                }),
                None => Err(self.not_in_queue(ticket_id)),
            },
        }
    }

    /// Waiting | Serving -> Cancelled
    pub fn cancel(&mut self, ticket_id: &str, now_millis: i64) -> Result<Ticket> {
        if let Some(serving) = self.serving.as_ref() {
            if serving.id == ticket_id {
                let mut ticket = serving.clone();
                ticket.cancel(now_millis)?;
                self.serving = None;
                return Ok(ticket);
            }
        }

        let index = self
            .waiting
            .iter()
            .position(|t| t.id == ticket_id)
            .ok_or_else(|| self.not_in_queue(ticket_id))?;
        let mut ticket = self.waiting[index].clone();
        ticket.cancel(now_millis)?;
        self.waiting.remove(index);
        Ok(ticket)
    }

    /// Mark as removed; fails while anyone is waiting or being served
    pub fn retire(&mut self) -> Result<()> {
        if self.serving.is_some() || !self.waiting.is_empty() {
            return Err(DomainError::ProviderNotEmpty(self.provider.id.clone()));
        }
        self.removed = true;
        Ok(())
    }

    /// 1-based rank of a Waiting ticket
    pub fn position_of(&self, ticket_id: &str) -> Option<usize> {
        self.waiting
            .iter()
            .position(|t| t.id == ticket_id)
            .map(|index| index + 1)
    }

    pub fn find(&self, ticket_id: &str) -> Option<&Ticket> {
        self.active_tickets().find(|t| t.id == ticket_id)
    }

    /// Used by restore; bypasses the activation check but keeps state rules
    pub(crate) fn restore_ticket(&mut self, ticket: Ticket) -> Result<()> {
        match ticket.state {
            TicketState::Waiting => {
                self.waiting.push_back(ticket);
                Ok(())
            }
            TicketState::Serving if self.serving.is_none() => {
                self.serving = Some(ticket);
                Ok(())
            }
            TicketState::Serving => Err(DomainError::ProviderBusy(self.provider.id.clone())),
            state => Err(DomainError::InvalidStateTransition {
                from: state.to_string(),
                to: TicketState::Waiting.to_string(),
            }),
        }
    }

    /// Consistent copy of this queue with derived positions
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            provider: self.provider.summary(),
            serving: self.serving.as_ref().map(ServingEntry::from),
            waiting: self
                .waiting
                .iter()
                .enumerate()
                .map(|(index, ticket)| WaitingEntry {
                    ticket_id: ticket.id.clone(),
                    display_number: ticket.display_number,
                    client_name: ticket.client_name.clone(),
                    position: index + 1,
                    created_at: ticket.created_at,
                })
                .collect(),
        }
    }

    fn not_in_queue(&self, ticket_id: &str) -> DomainError {
        DomainError::TicketNotInQueue {
            ticket_id: ticket_id.to_string(),
            provider_id: self.provider.id.clone(),
        }
    }
}

/// Waiting entry with its derived position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingEntry {
    pub ticket_id: TicketId,
    pub display_number: DisplayNumber,
    pub client_name: String,
    pub position: usize,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingEntry {
    pub ticket_id: TicketId,
    pub display_number: DisplayNumber,
    pub client_name: String,
    pub called_at: Option<i64>,
}

impl From<&Ticket> for ServingEntry {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id.clone(),
            display_number: ticket.display_number,
            client_name: ticket.client_name.clone(),
            called_at: ticket.called_at,
        }
    }
}

/// Point-in-time view of one provider's queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub provider: ProviderSummary,
    pub serving: Option<ServingEntry>,
    pub waiting: Vec<WaitingEntry>,
}

/// Cross-provider counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub providers_active: usize,
    pub providers_total: usize,
    pub waiting_count: usize,
    pub serving_count: usize,
}

/// A ticket together with its current position (Waiting only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketView {
    pub ticket: Ticket,
    pub position: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> ProviderQueue {
        ProviderQueue::new(Provider::new("p-1", "Carlos", 1, 0))
    }

    fn ticket(n: u64) -> Ticket {
        Ticket::new(
            format!("t-{}", n),
            n,
            DisplayNumber::new(n as i64).unwrap(),
            format!("Client {}", n),
            "p-1",
            (n * 1_000) as i64,
        )
    }

    fn positions(q: &ProviderQueue) -> Vec<usize> {
        q.snapshot().waiting.iter().map(|w| w.position).collect()
    }

    #[test]
    fn test_enqueue_returns_contiguous_positions() {
        let mut q = queue();
        assert_eq!(q.enqueue(ticket(1)).unwrap(), 1);
        assert_eq!(q.enqueue(ticket(2)).unwrap(), 2);
        assert_eq!(q.enqueue(ticket(3)).unwrap(), 3);
        assert_eq!(positions(&q), vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel_mid_sequence_shifts_positions() {
        let mut q = queue();
        for n in 1..=4 {
            q.enqueue(ticket(n)).unwrap();
        }
        let cancelled = q.cancel("t-2", 9_000).unwrap();
        assert_eq!(cancelled.state, TicketState::Cancelled);
        assert_eq!(positions(&q), vec![1, 2, 3]);
        assert_eq!(q.position_of("t-3"), Some(2));
        assert_eq!(q.position_of("t-2"), None);
    }

    #[test]
    fn test_call_next_is_fifo_and_single_serving() {
        let mut q = queue();
        q.enqueue(ticket(1)).unwrap();
        q.enqueue(ticket(2)).unwrap();

        let called = q.call_next(5_000).unwrap().unwrap();
        assert_eq!(called.id, "t-1");
        assert_eq!(called.called_at, Some(5_000));
        assert_eq!(q.serving().map(|t| t.id.as_str()), Some("t-1"));

        let busy = q.call_next(6_000).unwrap_err();
        assert_eq!(busy, DomainError::ProviderBusy("p-1".to_string()));
        assert_eq!(q.waiting_len(), 1);
    }

    #[test]
    fn test_call_next_on_empty_queue_is_none() {
        let mut q = queue();
        assert_eq!(q.call_next(1_000).unwrap(), None);
    }

    #[test]
    fn test_inactive_queue_rejects_enqueue_and_call() {
        let mut q = queue();
        q.enqueue(ticket(1)).unwrap();
        q.set_active(false);

        assert!(matches!(
            q.enqueue(ticket(2)),
            Err(DomainError::ProviderInactive(_))
        ));
        assert!(matches!(
            q.call_next(1_000),
            Err(DomainError::ProviderInactive(_))
        ));
        // Waiting sequence is preserved across deactivation
        assert_eq!(q.waiting_len(), 1);
    }

    #[test]
    fn test_complete_requires_serving() {
        let mut q = queue();
        q.enqueue(ticket(1)).unwrap();
        assert!(matches!(
            q.complete("t-1", 2_000),
            Err(DomainError::InvalidStateTransition { .. })
        ));
        assert!(matches!(
            q.complete("t-9", 2_000),
            Err(DomainError::TicketNotInQueue { .. })
        ));

        q.call_next(2_000).unwrap();
        let done = q.complete("t-1", 3_000).unwrap();
        assert_eq!(done.state, TicketState::Completed);
        assert!(q.serving().is_none());
    }

    #[test]
    fn test_retire_requires_empty_queue() {
        let mut q = queue();
        q.enqueue(ticket(1)).unwrap();
        assert!(q.retire().is_err());
        assert!(!q.is_removed());

        q.call_next(1_000).unwrap();
        assert!(q.retire().is_err());

        q.complete("t-1", 2_000).unwrap();
        q.retire().unwrap();
        assert!(q.is_removed());
    }
}
