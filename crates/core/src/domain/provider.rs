// Provider Domain Model

use crate::domain::ticket::ProviderId;
use serde::{Deserialize, Serialize};

/// A service resource (e.g. a barber) owning one queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub active: bool,
    /// Registration order (strictly increasing)
    pub seq: u64,
    pub created_at: i64, // epoch ms
}

impl Provider {
    pub fn new(id: impl Into<String>, name: impl Into<String>, seq: u64, created_at: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active: true,
            seq,
            created_at,
        }
    }

    pub fn summary(&self) -> ProviderSummary {
        ProviderSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            active: self.active,
        }
    }
}

/// Public view of a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub id: ProviderId,
    pub name: String,
    pub active: bool,
}
