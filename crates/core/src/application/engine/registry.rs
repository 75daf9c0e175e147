// Engine-wide ticket index
//
// Active tickets live in their provider's queue; the registry only records
// which provider holds them. Terminal tickets are moved here for history.

use crate::domain::{DisplayNumber, ProviderId, Ticket, TicketId};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub(crate) enum TicketEntry {
    Active(ProviderId),
    Closed(Ticket),
}

#[derive(Debug, Default)]
pub(crate) struct TicketRegistry {
    entries: HashMap<TicketId, TicketEntry>,
    active_numbers: HashMap<DisplayNumber, TicketId>,
}

impl TicketRegistry {
    pub fn get(&self, ticket_id: &str) -> Option<&TicketEntry> {
        self.entries.get(ticket_id)
    }

    /// Active ticket currently holding `number`
    pub fn holder_of(&self, number: DisplayNumber) -> Option<&TicketId> {
        self.active_numbers.get(&number)
    }

    pub fn insert_active(&mut self, ticket: &Ticket) {
        self.active_numbers
            .insert(ticket.display_number, ticket.id.clone());
        self.entries.insert(
            ticket.id.clone(),
            TicketEntry::Active(ticket.provider_id.clone()),
        );
    }

    /// Record a terminal ticket and release its display number
    pub fn close(&mut self, ticket: Ticket) {
        if self.active_numbers.get(&ticket.display_number) == Some(&ticket.id) {
            self.active_numbers.remove(&ticket.display_number);
        }
        self.entries
            .insert(ticket.id.clone(), TicketEntry::Closed(ticket));
    }

    pub fn closed(&self) -> impl Iterator<Item = &Ticket> {
        self.entries.values().filter_map(|entry| match entry {
            TicketEntry::Closed(ticket) => Some(ticket),
            TicketEntry::Active(_) => None,
        })
    }

    pub fn active_count(&self) -> usize {
        self.active_numbers.len()
    }
}
