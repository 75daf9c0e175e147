// Domain Error Types

use crate::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid ticket state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Provider {0} is inactive")]
    ProviderInactive(String),

    #[error("Provider {0} is already serving a ticket")]
    ProviderBusy(String),

    #[error("Provider {0} still has clients waiting or in service")]
    ProviderNotEmpty(String),

    #[error("Ticket {ticket_id} is not active in the queue of provider {provider_id}")]
    TicketNotInQueue {
        ticket_id: String,
        provider_id: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Conflict,
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
