//! End-to-end queue scenarios against the engine and statistics

use std::sync::Arc;

use walkin_core::application::{QueueEngine, StatsAggregator, StatsPeriod};
use walkin_core::domain::TicketState;
use walkin_core::port::{ManualTimeProvider, SequentialIdProvider};
use walkin_core::ErrorKind;

// 2024-03-10T09:00:00Z
const OPEN: i64 = 1_710_061_200_000;
const MINUTE: i64 = 60_000;

fn engine() -> (Arc<QueueEngine>, Arc<ManualTimeProvider>) {
    let clock = Arc::new(ManualTimeProvider::new(OPEN));
    let engine = QueueEngine::new(Arc::new(SequentialIdProvider::new("t")), clock.clone());
    (Arc::new(engine), clock)
}

fn waiting_numbers(engine: &QueueEngine, provider_id: &str) -> Vec<(u32, usize)> {
    engine
        .queue_snapshot(provider_id)
        .unwrap()
        .waiting
        .iter()
        .map(|w| (w.display_number.get(), w.position))
        .collect()
}

#[test]
fn test_enqueue_call_cancel_complete() {
    let (engine, _) = engine();
    let p = engine.register_provider("Carlos").unwrap();

    let a = engine.enqueue_ticket(&p.id, 1, "Alice").unwrap().ticket;
    let b = engine.enqueue_ticket(&p.id, 2, "Bruno").unwrap().ticket;
    engine.enqueue_ticket(&p.id, 3, "Clara").unwrap();
    assert_eq!(waiting_numbers(&engine, &p.id), vec![(1, 1), (2, 2), (3, 3)]);

    let called = engine.call_next(&p.id).unwrap().unwrap();
    assert_eq!(called.id, a.id);
    let snapshot = engine.queue_snapshot(&p.id).unwrap();
    assert_eq!(snapshot.serving.unwrap().ticket_id, a.id);
    assert_eq!(waiting_numbers(&engine, &p.id), vec![(2, 1), (3, 2)]);

    engine.cancel_ticket(&b.id).unwrap();
    assert_eq!(waiting_numbers(&engine, &p.id), vec![(3, 1)]);

    let done = engine.complete_service(&a.id).unwrap();
    assert_eq!(done.state, TicketState::Completed);
    assert!(engine.queue_snapshot(&p.id).unwrap().serving.is_none());
}

#[test]
fn test_duplicate_number_leaves_queue_unchanged() {
    let (engine, _) = engine();
    let p = engine.register_provider("Carlos").unwrap();
    let q = engine.register_provider("Dora").unwrap();
    engine.enqueue_ticket(&p.id, 7, "Alice").unwrap();

    let err = engine.enqueue_ticket(&q.id, 7, "Bruno").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(engine.queue_snapshot(&q.id).unwrap().waiting.is_empty());
    assert_eq!(engine.system_status().waiting_count, 1);
}

#[test]
fn test_deactivated_provider_finishes_current_client() {
    let (engine, _) = engine();
    let p = engine.register_provider("Carlos").unwrap();
    let a = engine.enqueue_ticket(&p.id, 1, "Alice").unwrap().ticket;
    engine.enqueue_ticket(&p.id, 2, "Bruno").unwrap();
    engine.call_next(&p.id).unwrap();

    engine.set_provider_active(&p.id, false).unwrap();
    assert_eq!(
        engine.call_next(&p.id).unwrap_err().kind(),
        ErrorKind::Conflict
    );
    assert_eq!(
        engine.enqueue_ticket(&p.id, 3, "Clara").unwrap_err().kind(),
        ErrorKind::Conflict
    );

    let done = engine.complete_service(&a.id).unwrap();
    assert_eq!(done.state, TicketState::Completed);
}

#[test]
fn test_removed_provider_is_gone_but_history_stays() {
    let (engine, _) = engine();
    let p = engine.register_provider("Carlos").unwrap();
    let a = engine.enqueue_ticket(&p.id, 1, "Alice").unwrap().ticket;

    assert_eq!(
        engine.remove_provider(&p.id).unwrap_err().kind(),
        ErrorKind::Conflict
    );
    engine.cancel_ticket(&a.id).unwrap();
    engine.remove_provider(&p.id).unwrap();

    assert_eq!(
        engine.queue_snapshot(&p.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        engine.get_ticket(&a.id).unwrap().ticket.state,
        TicketState::Cancelled
    );
}

#[test]
fn test_statistics_match_hand_computed_means() {
    let (engine, clock) = engine();
    let stats = StatsAggregator::new(Arc::clone(&engine));
    let p = engine.register_provider("Carlos").unwrap();

    // Empty day: zeros, not errors
    let empty = stats.report(StatsPeriod::Today, None);
    assert_eq!(empty.totals.finished_count, 0);
    assert_eq!(empty.totals.avg_wait_ms, 0);

    let a = engine.enqueue_ticket(&p.id, 1, "Alice").unwrap().ticket;
    let b = engine.enqueue_ticket(&p.id, 2, "Bruno").unwrap().ticket;

    // Alice: waits 10 min, served 20 min
    clock.advance(10 * MINUTE);
    engine.call_next(&p.id).unwrap();
    clock.advance(20 * MINUTE);
    engine.complete_service(&a.id).unwrap();

    // Bruno: waits 30 min, served 10 min
    engine.call_next(&p.id).unwrap();
    clock.advance(10 * MINUTE);
    engine.complete_service(&b.id).unwrap();

    let report = stats.report(StatsPeriod::Today, None);
    assert_eq!(report.totals.completed_count, 2);
    assert_eq!(report.totals.avg_wait_ms, 20 * MINUTE);
    assert_eq!(report.totals.avg_service_ms, 15 * MINUTE);
    assert_eq!(report.totals.avg_total_ms, 35 * MINUTE);
    assert_eq!(report.per_provider.len(), 1);
    assert_eq!(report.per_provider[0].provider_name.as_deref(), Some("Carlos"));

    let daily = stats.daily_summary();
    assert_eq!(daily.completed_count, 2);
    assert_eq!(daily.providers[0].total_service_ms, 30 * MINUTE);
    assert_eq!(daily.providers[0].first_call_at, Some(OPEN + 10 * MINUTE));
    assert_eq!(daily.providers[0].last_call_at, Some(OPEN + 30 * MINUTE));
}
