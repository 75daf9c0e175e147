//! RPC Method Handlers
//!
//! Thin adapters from request types to `QueueEngine` / `StatsAggregator`.
//! Engine calls never block on I/O, so handlers are synchronous.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::types::{
    CallNextResponse, CreateProviderRequest, FindTicketRequest, HistoryRequest, ProviderRequest,
    ProviderResponse, RegisterTicketRequest, RegisterTicketResponse, RemoveProviderResponse,
    SetProviderActiveRequest, SnapshotRequest, StatsRequest, StatsResponse, StatusResponse,
    TicketRequest,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use walkin_core::application::{DailySummary, QueueEngine, StatsAggregator, StatsPeriod};
use walkin_core::domain::{QueueSnapshot, Ticket, TicketView};

pub type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    engine: Arc<QueueEngine>,
    stats: StatsAggregator,
    rate_limiter: RateLimiter,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(engine: Arc<QueueEngine>, rate_limit: RateLimitConfig) -> Self {
        Self {
            stats: StatsAggregator::new(Arc::clone(&engine)),
            engine,
            rate_limiter: RateLimiter::new(rate_limit),
            start_time: Instant::now(),
        }
    }

    fn admit(&self, method: &'static str) -> RpcResult<()> {
        if self.rate_limiter.try_acquire() {
            return Ok(());
        }
        warn!(method, "Request throttled");
        Err(throttled())
    }

    /// provider.list.v1
    pub fn list_providers(&self) -> RpcResult<Vec<ProviderResponse>> {
        Ok(self.engine.list_providers())
    }

    /// provider.create.v1
    pub fn create_provider(&self, req: CreateProviderRequest) -> RpcResult<ProviderResponse> {
        self.admit("provider.create.v1")?;
        let provider = self
            .engine
            .register_provider(&req.name)
            .map_err(to_rpc_error)?;
        Ok(provider.summary())
    }

    /// provider.set_active.v1
    pub fn set_provider_active(
        &self,
        req: SetProviderActiveRequest,
    ) -> RpcResult<ProviderResponse> {
        self.admit("provider.set_active.v1")?;
        self.engine
            .set_provider_active(&req.provider_id, req.active)
            .map_err(to_rpc_error)
    }

    /// provider.remove.v1
    pub fn remove_provider(&self, req: ProviderRequest) -> RpcResult<RemoveProviderResponse> {
        self.admit("provider.remove.v1")?;
        self.engine
            .remove_provider(&req.provider_id)
            .map_err(to_rpc_error)?;
        Ok(RemoveProviderResponse {
            provider_id: req.provider_id,
            removed: true,
        })
    }

    /// ticket.register.v1
    pub fn register_ticket(&self, req: RegisterTicketRequest) -> RpcResult<RegisterTicketResponse> {
        self.admit("ticket.register.v1")?;
        let enqueued = self
            .engine
            .enqueue_ticket(&req.provider_id, req.display_number, &req.name)
            .map_err(to_rpc_error)?;
        Ok(RegisterTicketResponse {
            ticket_id: enqueued.ticket.id,
            display_number: enqueued.ticket.display_number.get(),
            provider_id: enqueued.ticket.provider_id,
            position: enqueued.position,
        })
    }

    /// queue.call_next.v1
    pub fn call_next(&self, req: ProviderRequest) -> RpcResult<CallNextResponse> {
        self.admit("queue.call_next.v1")?;
        let ticket = self
            .engine
            .call_next(&req.provider_id)
            .map_err(to_rpc_error)?;
        Ok(CallNextResponse { ticket })
    }

    /// ticket.complete.v1
    pub fn complete_ticket(&self, req: TicketRequest) -> RpcResult<Ticket> {
        self.admit("ticket.complete.v1")?;
        self.engine
            .complete_service(&req.ticket_id)
            .map_err(to_rpc_error)
    }

    /// ticket.cancel.v1
    pub fn cancel_ticket(&self, req: TicketRequest) -> RpcResult<Ticket> {
        self.admit("ticket.cancel.v1")?;
        self.engine
            .cancel_ticket(&req.ticket_id)
            .map_err(to_rpc_error)
    }

    /// ticket.get.v1
    pub fn get_ticket(&self, req: TicketRequest) -> RpcResult<TicketView> {
        self.engine.get_ticket(&req.ticket_id).map_err(to_rpc_error)
    }

    /// ticket.find.v1
    pub fn find_ticket(&self, req: FindTicketRequest) -> RpcResult<TicketView> {
        self.engine
            .find_active_ticket(req.display_number)
            .map_err(to_rpc_error)
    }

    /// queue.snapshot.v1
    pub fn snapshot(&self, req: SnapshotRequest) -> RpcResult<Vec<QueueSnapshot>> {
        match req.provider_id {
            Some(id) => self
                .engine
                .queue_snapshot(&id)
                .map(|snapshot| vec![snapshot])
                .map_err(to_rpc_error),
            None => Ok(self.engine.all_queues()),
        }
    }

    /// admin.status.v1
    pub fn status(&self) -> RpcResult<StatusResponse> {
        Ok(StatusResponse {
            status: self.engine.system_status(),
            active_tickets: self.engine.active_ticket_count(),
            version: walkin_core::VERSION.to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        })
    }

    /// report.stats.v1
    pub fn stats(&self, req: StatsRequest) -> RpcResult<StatsResponse> {
        let period = match req.period.as_deref() {
            Some(raw) => StatsPeriod::parse(raw).map_err(to_rpc_error)?,
            None => StatsPeriod::default(),
        };
        debug!(?period, provider_id = ?req.provider_id, "Stats requested");
        Ok(self.stats.report(period, req.provider_id.as_deref()))
    }

    /// report.daily.v1
    pub fn daily(&self) -> RpcResult<DailySummary> {
        Ok(self.stats.daily_summary())
    }

    /// report.history.v1
    pub fn history(&self, req: HistoryRequest) -> RpcResult<Vec<Ticket>> {
        Ok(self.engine.history(&req.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use walkin_core::port::{ManualTimeProvider, SequentialIdProvider};

    fn handler(burst: u32) -> RpcHandler {
        let engine = Arc::new(QueueEngine::new(
            Arc::new(SequentialIdProvider::new("id")),
            Arc::new(ManualTimeProvider::new(1_000)),
        ));
        RpcHandler::new(
            engine,
            RateLimitConfig {
                burst,
                per_second: 0,
            },
        )
    }

    fn create(h: &RpcHandler, name: &str) -> String {
        h.create_provider(CreateProviderRequest {
            name: name.to_string(),
        })
        .unwrap()
        .id
    }

    fn register(h: &RpcHandler, provider_id: &str, number: i64) -> RpcResult<RegisterTicketResponse> {
        h.register_ticket(RegisterTicketRequest {
            name: "Alice".to_string(),
            display_number: number,
            provider_id: provider_id.to_string(),
        })
    }

    #[test]
    fn test_register_and_call_next() {
        let h = handler(100);
        let p = create(&h, "Carlos");
        let first = register(&h, &p, 1).unwrap();
        let second = register(&h, &p, 2).unwrap();
        assert_eq!((first.position, second.position), (1, 2));

        let called = h
            .call_next(ProviderRequest {
                provider_id: p.clone(),
            })
            .unwrap();
        assert_eq!(called.ticket.map(|t| t.id), Some(first.ticket_id));

        let snapshots = h.snapshot(SnapshotRequest::default()).unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].waiting[0].position, 1);

        let status = h.status().unwrap();
        assert_eq!(status.status.waiting_count, 1);
        assert_eq!(status.status.serving_count, 1);
        assert_eq!(status.active_tickets, 2);
    }

    #[test]
    fn test_errors_map_to_codes() {
        let h = handler(100);
        let p = create(&h, "Carlos");

        let err = register(&h, &p, 0).unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);

        let err = register(&h, "missing", 1).unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);

        register(&h, &p, 1).unwrap();
        let err = h
            .remove_provider(ProviderRequest { provider_id: p })
            .unwrap_err();
        assert_eq!(err.code(), code::CONFLICT);

        let err = h
            .stats(StatsRequest {
                period: Some("fortnight".to_string()),
                provider_id: None,
            })
            .unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }

    #[test]
    fn test_mutations_are_throttled_reads_are_not() {
        let h = handler(2);
        let p = create(&h, "Carlos");
        register(&h, &p, 1).unwrap();

        let err = register(&h, &p, 2).unwrap_err();
        assert_eq!(err.code(), code::THROTTLED);

        assert_eq!(h.list_providers().unwrap().len(), 1);
        assert!(h.snapshot(SnapshotRequest { provider_id: Some(p) }).is_ok());
        assert!(h.stats(StatsRequest::default()).is_ok());
    }

    #[test]
    fn test_history_and_lookup() {
        let h = handler(100);
        let p = create(&h, "Carlos");
        let t = register(&h, &p, 5).unwrap();

        let found = h.find_ticket(FindTicketRequest { display_number: 5 }).unwrap();
        assert_eq!(found.ticket.id, t.ticket_id);
        assert_eq!(found.position, Some(1));

        h.cancel_ticket(TicketRequest {
            ticket_id: t.ticket_id.clone(),
        })
        .unwrap();
        let history = h.history(HistoryRequest::default()).unwrap();
        assert_eq!(history.len(), 1);

        let view = h
            .get_ticket(TicketRequest {
                ticket_id: t.ticket_id,
            })
            .unwrap();
        assert_eq!(view.position, None);
        assert_eq!(h.daily().unwrap().completed_count, 0);
    }
}
