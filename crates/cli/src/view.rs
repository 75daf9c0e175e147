//! Table rows and value formatting

use crate::rpc::{Provider, ProviderDay, ProviderStats, Ticket, Waiting};
use chrono::{DateTime, Utc};
use tabled::Tabled;

#[derive(Tabled)]
pub struct ProviderRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ACTIVE")]
    active: String,
}

impl From<&Provider> for ProviderRow {
    fn from(p: &Provider) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            active: if p.active { "yes" } else { "no" }.to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct WaitingRow {
    #[tabled(rename = "POS")]
    position: usize,
    #[tabled(rename = "NUMBER")]
    number: u32,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "SINCE")]
    since: String,
    #[tabled(rename = "TICKET")]
    ticket_id: String,
}

impl From<&Waiting> for WaitingRow {
    fn from(w: &Waiting) -> Self {
        Self {
            position: w.position,
            number: w.display_number,
            client: w.client_name.clone(),
            since: clock(Some(w.created_at)),
            ticket_id: w.ticket_id.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct TicketRow {
    #[tabled(rename = "NUMBER")]
    number: u32,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "PROVIDER")]
    provider: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "CALLED")]
    called: String,
    #[tabled(rename = "FINISHED")]
    finished: String,
}

impl From<&Ticket> for TicketRow {
    fn from(t: &Ticket) -> Self {
        Self {
            number: t.display_number,
            client: t.client_name.clone(),
            provider: t.provider_id.clone(),
            state: t.state.clone(),
            created: clock(Some(t.created_at)),
            called: clock(t.called_at),
            finished: clock(t.finished_at),
        }
    }
}

#[derive(Tabled)]
pub struct ProviderStatsRow {
    #[tabled(rename = "PROVIDER")]
    provider: String,
    #[tabled(rename = "DONE")]
    completed: usize,
    #[tabled(rename = "CANCELLED")]
    cancelled: usize,
    #[tabled(rename = "IN PROGRESS")]
    in_progress: usize,
    #[tabled(rename = "AVG WAIT")]
    avg_wait: String,
    #[tabled(rename = "AVG SERVICE")]
    avg_service: String,
    #[tabled(rename = "AVG TOTAL")]
    avg_total: String,
}

impl From<&ProviderStats> for ProviderStatsRow {
    fn from(s: &ProviderStats) -> Self {
        Self {
            provider: display_name(s.provider_name.as_deref(), &s.provider_id),
            completed: s.totals.completed_count,
            cancelled: s.totals.cancelled_count,
            in_progress: s.totals.in_progress_count,
            avg_wait: duration(s.totals.avg_wait_ms),
            avg_service: duration(s.totals.avg_service_ms),
            avg_total: duration(s.totals.avg_total_ms),
        }
    }
}

#[derive(Tabled)]
pub struct ProviderDayRow {
    #[tabled(rename = "PROVIDER")]
    provider: String,
    #[tabled(rename = "DONE")]
    completed: usize,
    #[tabled(rename = "SERVICE TIME")]
    service: String,
    #[tabled(rename = "FIRST CALL")]
    first_call: String,
    #[tabled(rename = "LAST CALL")]
    last_call: String,
}

impl From<&ProviderDay> for ProviderDayRow {
    fn from(d: &ProviderDay) -> Self {
        Self {
            provider: display_name(d.provider_name.as_deref(), &d.provider_id),
            completed: d.completed_count,
            service: duration(d.total_service_ms),
            first_call: clock(d.first_call_at),
            last_call: clock(d.last_call_at),
        }
    }
}

/// Removed providers only keep their id
fn display_name(name: Option<&str>, id: &str) -> String {
    match name {
        Some(name) => name.to_string(),
        None => format!("{} (removed)", id),
    }
}

/// `HH:MM:SS` in UTC, `-` when absent
pub fn clock(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn date(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Compact human duration: `42s`, `5m 03s`, `1h 02m`
pub fn duration(millis: i64) -> String {
    let secs = millis.max(0) / 1000;
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m {:02}s", s / 60, s % 60),
        s => format!("{}h {:02}m", s / 3600, (s % 3600) / 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        assert_eq!(duration(0), "0s");
        assert_eq!(duration(42_900), "42s");
        assert_eq!(duration(303_000), "5m 03s");
        assert_eq!(duration(3_720_000), "1h 02m");
        assert_eq!(duration(-5), "0s");
    }

    #[test]
    fn test_clock_and_date() {
        // 2024-03-10T15:00:00Z
        assert_eq!(clock(Some(1_710_082_800_000)), "15:00:00");
        assert_eq!(clock(None), "-");
        assert_eq!(date(1_710_082_800_000), "2024-03-10");
    }

    #[test]
    fn test_removed_provider_name() {
        assert_eq!(display_name(Some("Carlos"), "p-1"), "Carlos");
        assert_eq!(display_name(None, "p-1"), "p-1 (removed)");
    }
}
