// Stats Aggregator - read-only counts and timing averages over ticket history

use crate::application::engine::{QueueEngine, TicketFilter};
use crate::domain::{ProviderId, Ticket, TicketState};
use crate::error::{AppError, Result};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Reporting window, bounded by ticket creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    /// Since 00:00 UTC of the current day
    #[default]
    Today,
    Week,
    Month,
    Year,
    All,
}

impl StatsPeriod {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "day" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(AppError::Validation(format!(
                "Unknown period '{}' (expected today, week, month, year or all)",
                other
            ))),
        }
    }

    /// Inclusive lower bound in epoch ms; `None` for `All`
    pub fn window_start(&self, now_millis: i64) -> Option<i64> {
        match self {
            Self::Today => Some(start_of_utc_day(now_millis)),
            Self::Week => Some(now_millis - 7 * DAY_MS),
            Self::Month => Some(now_millis - 30 * DAY_MS),
            Self::Year => Some(now_millis - 365 * DAY_MS),
            Self::All => None,
        }
    }
}

fn start_of_utc_day(now_millis: i64) -> i64 {
    DateTime::from_timestamp_millis(now_millis)
        .and_then(|dt| dt.date_naive().and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .unwrap_or(now_millis)
}

/// Counts and integer-millisecond means for one set of tickets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTotals {
    pub finished_count: usize,
    pub completed_count: usize,
    pub cancelled_count: usize,
    pub in_progress_count: usize,
    pub avg_wait_ms: i64,
    pub avg_service_ms: i64,
    pub avg_total_ms: i64,
}

#[derive(Default)]
struct Accumulator {
    completed: usize,
    cancelled: usize,
    in_progress: usize,
    wait: Mean,
    service: Mean,
    total: Mean,
}

#[derive(Default)]
struct Mean {
    sum: i64,
    count: i64,
}

impl Mean {
    fn add(&mut self, value: Option<i64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn get(&self) -> i64 {
        if self.count == 0 {
            0
        } else {
            self.sum / self.count
        }
    }
}

impl Accumulator {
    fn add(&mut self, ticket: &Ticket) {
        match ticket.state {
            TicketState::Waiting | TicketState::Serving => {
                // Incomplete intervals stay out of the averages
                self.in_progress += 1;
                return;
            }
            TicketState::Completed => {
                self.completed += 1;
                self.service.add(ticket.service_ms());
                self.total.add(ticket.total_ms());
            }
            TicketState::Cancelled => self.cancelled += 1,
        }
        self.wait.add(ticket.wait_ms());
    }

    fn finish(&self) -> TicketTotals {
        TicketTotals {
            finished_count: self.completed + self.cancelled,
            completed_count: self.completed,
            cancelled_count: self.cancelled,
            in_progress_count: self.in_progress,
            avg_wait_ms: self.wait.get(),
            avg_service_ms: self.service.get(),
            avg_total_ms: self.total.get(),
        }
    }
}

/// Aggregate `tickets` as a whole
pub fn aggregate<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> TicketTotals {
    let mut acc = Accumulator::default();
    for ticket in tickets {
        acc.add(ticket);
    }
    acc.finish()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub provider_id: ProviderId,
    /// `None` once the provider has been removed
    pub provider_name: Option<String>,
    #[serde(flatten)]
    pub totals: TicketTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub period: StatsPeriod,
    pub window_start: Option<i64>,
    pub window_end: i64,
    #[serde(flatten)]
    pub totals: TicketTotals,
    pub per_provider: Vec<ProviderStats>,
}

/// One provider's completed work for the day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDay {
    pub provider_id: ProviderId,
    pub provider_name: Option<String>,
    pub completed_count: usize,
    pub total_service_ms: i64,
    pub first_call_at: Option<i64>,
    pub last_call_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub day_start: i64,
    pub completed_count: usize,
    pub providers: Vec<ProviderDay>,
}

/// Derives statistics from the engine's ticket history
pub struct StatsAggregator {
    engine: Arc<QueueEngine>,
}

impl StatsAggregator {
    pub fn new(engine: Arc<QueueEngine>) -> Self {
        Self { engine }
    }

    pub fn report(&self, period: StatsPeriod, provider_id: Option<&str>) -> StatsReport {
        let now = self.engine.time_provider().now_millis();
        let window_start = period.window_start(now);
        let tickets = self.engine.tickets(&TicketFilter {
            provider_id: provider_id.map(str::to_string),
            created_from: window_start,
            created_to: None,
        });

        let mut per_provider: BTreeMap<&str, Accumulator> = BTreeMap::new();
        for ticket in &tickets {
            per_provider
                .entry(ticket.provider_id.as_str())
                .or_default()
                .add(ticket);
        }
        let names = self.engine.provider_names();
        let per_provider = per_provider
            .into_iter()
            .map(|(id, acc)| ProviderStats {
                provider_id: id.to_string(),
                provider_name: names.get(id).cloned(),
                totals: acc.finish(),
            })
            .collect();

        debug!(?period, tickets = tickets.len(), "Stats computed");
        StatsReport {
            period,
            window_start,
            window_end: now,
            totals: aggregate(&tickets),
            per_provider,
        }
    }

    /// Completed services of the current UTC day, per provider
    pub fn daily_summary(&self) -> DailySummary {
        let now = self.engine.time_provider().now_millis();
        let day_start = start_of_utc_day(now);
        let completed: Vec<Ticket> = self
            .engine
            .history(&TicketFilter {
                provider_id: None,
                created_from: Some(day_start),
                created_to: None,
            })
            .into_iter()
            .filter(|t| t.state == TicketState::Completed)
            .collect();

        let names = self.engine.provider_names();
        let providers = summarize_days(&completed, &names);
        DailySummary {
            day_start,
            completed_count: completed.len(),
            providers,
        }
    }
}

fn summarize_days(completed: &[Ticket], names: &HashMap<ProviderId, String>) -> Vec<ProviderDay> {
    let mut days: BTreeMap<&str, ProviderDay> = BTreeMap::new();
    for ticket in completed {
        let day = days
            .entry(ticket.provider_id.as_str())
            .or_insert_with(|| ProviderDay {
                provider_id: ticket.provider_id.clone(),
                provider_name: names.get(&ticket.provider_id).cloned(),
                completed_count: 0,
                total_service_ms: 0,
                first_call_at: None,
                last_call_at: None,
            });
        day.completed_count += 1;
        day.total_service_ms += ticket.service_ms().unwrap_or(0);
        if let Some(called) = ticket.called_at {
            day.first_call_at = Some(day.first_call_at.map_or(called, |t| t.min(called)));
            day.last_call_at = Some(day.last_call_at.map_or(called, |t| t.max(called)));
        }
    }
    days.into_values().collect()
}
