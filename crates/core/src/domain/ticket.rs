// Ticket Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Ticket ID (UUID v4 in production)
pub type TicketId = String;

/// Provider identifier
pub type ProviderId = String;

/// Minimum/maximum length of a client or provider name (after trimming)
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;

/// Ticket State
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    Waiting,
    Serving,
    Completed,
    Cancelled,
}

impl TicketState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketState::Completed | TicketState::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Parse the stored representation (inverse of `Display`)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WAITING" => Some(TicketState::Waiting),
            "SERVING" => Some(TicketState::Serving),
            "COMPLETED" => Some(TicketState::Completed),
            "CANCELLED" => Some(TicketState::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketState::Waiting => write!(f, "WAITING"),
            TicketState::Serving => write!(f, "SERVING"),
            TicketState::Completed => write!(f, "COMPLETED"),
            TicketState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Client-facing ticket label. Carries no ordering semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayNumber(u32);

impl DisplayNumber {
    /// Accepts the raw caller-supplied number; must be in `1..=u32::MAX`
    pub fn new(raw: i64) -> Result<Self> {
        if raw <= 0 {
            return Err(DomainError::Validation(format!(
                "Display number must be a positive integer, got {}",
                raw
            )));
        }
        u32::try_from(raw).map(Self).map_err(|_| {
            DomainError::Validation(format!("Display number {} is out of range", raw))
        })
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for DisplayNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Trim and length-check a person's or provider's name
pub fn normalize_name(field: &str, raw: &str) -> Result<String> {
    let name = raw.trim();
    let len = name.chars().count();
    if len < MIN_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "{} must have at least {} characters",
            field, MIN_NAME_LEN
        )));
    }
    if len > MAX_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "{} must have at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

/// Ticket Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    /// Engine-wide arrival order (strictly increasing)
    pub seq: u64,
    pub display_number: DisplayNumber,
    pub client_name: String,
    pub provider_id: ProviderId,
    pub state: TicketState,

    pub created_at: i64, // epoch ms
    pub called_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl Ticket {
    /// Create a new Waiting ticket
    ///
    /// # Arguments
    ///
    /// * `id` - Unique ticket ID (injected, not generated)
    /// * `seq` - Arrival sequence number
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        seq: u64,
        display_number: DisplayNumber,
        client_name: impl Into<String>,
        provider_id: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            seq,
            display_number,
            client_name: client_name.into(),
            provider_id: provider_id.into(),
            state: TicketState::Waiting,
            created_at,
            called_at: None,
            finished_at: None,
        }
    }

    fn transition_error(&self, to: TicketState) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }

    /// Waiting -> Serving
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        if self.state != TicketState::Waiting {
            return Err(self.transition_error(TicketState::Serving));
        }
        self.state = TicketState::Serving;
        self.called_at = Some(now_millis);
        Ok(())
    }

    /// Serving -> Completed
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        if self.state != TicketState::Serving {
            return Err(self.transition_error(TicketState::Completed));
        }
        self.state = TicketState::Completed;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Waiting | Serving -> Cancelled
    pub fn cancel(&mut self, now_millis: i64) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.transition_error(TicketState::Cancelled));
        }
        self.state = TicketState::Cancelled;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// call - creation, once the ticket has been called
    pub fn wait_ms(&self) -> Option<i64> {
        self.called_at.map(|called| called - self.created_at)
    }

    /// finish - call, once a called ticket has finished
    pub fn service_ms(&self) -> Option<i64> {
        match (self.called_at, self.finished_at) {
            (Some(called), Some(finished)) => Some(finished - called),
            _ => None,
        }
    }

    /// finish - creation
    pub fn total_ms(&self) -> Option<i64> {
        self.finished_at.map(|finished| finished - self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> Ticket {
        Ticket::new(
            "t-1",
            1,
            DisplayNumber::new(7).unwrap(),
            "Ana",
            "p-1",
            1_000,
        )
    }

    #[test]
    fn test_full_lifecycle_stamps_timestamps() {
        let mut t = ticket();
        assert_eq!(t.state, TicketState::Waiting);

        t.start(4_000).unwrap();
        assert_eq!(t.state, TicketState::Serving);
        assert_eq!(t.wait_ms(), Some(3_000));

        t.complete(10_000).unwrap();
        assert_eq!(t.state, TicketState::Completed);
        assert_eq!(t.service_ms(), Some(6_000));
        assert_eq!(t.total_ms(), Some(9_000));
    }

    #[test]
    fn test_cancel_from_waiting_and_serving() {
        let mut waiting = ticket();
        waiting.cancel(2_000).unwrap();
        assert_eq!(waiting.state, TicketState::Cancelled);
        assert_eq!(waiting.called_at, None);
        assert_eq!(waiting.service_ms(), None);

        let mut serving = ticket();
        serving.start(2_000).unwrap();
        serving.cancel(3_000).unwrap();
        assert_eq!(serving.state, TicketState::Cancelled);
        assert_eq!(serving.service_ms(), Some(1_000));
    }

    #[test]
    fn test_invalid_transitions_leave_state_unchanged() {
        let mut t = ticket();
        assert!(t.complete(2_000).is_err());
        assert_eq!(t.state, TicketState::Waiting);
        assert_eq!(t.finished_at, None);

        t.start(2_000).unwrap();
        assert!(t.start(3_000).is_err());
        assert_eq!(t.called_at, Some(2_000));

        t.complete(4_000).unwrap();
        let before = t.clone();
        assert!(t.cancel(5_000).is_err());
        assert!(t.complete(5_000).is_err());
        assert!(t.start(5_000).is_err());
        assert_eq!(t, before);
    }

    #[test]
    fn test_display_number_bounds() {
        assert!(DisplayNumber::new(0).is_err());
        assert!(DisplayNumber::new(-3).is_err());
        assert!(DisplayNumber::new(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(DisplayNumber::new(42).unwrap().get(), 42);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Client name", "  Bia ").unwrap(), "Bia");
        assert!(normalize_name("Client name", " a ").is_err());
        assert!(normalize_name("Client name", "").is_err());
        assert!(normalize_name("Client name", &"x".repeat(101)).is_err());
    }

    #[test]
    fn test_state_round_trips_through_display() {
        for state in [
            TicketState::Waiting,
            TicketState::Serving,
            TicketState::Completed,
            TicketState::Cancelled,
        ] {
            assert_eq!(TicketState::parse(&state.to_string()), Some(state));
        }
        assert_eq!(TicketState::parse("DONE"), None);
    }
}
