//! Journal -> SQLite -> restore round trips

use std::sync::Arc;

use walkin_core::application::{
    journal_channel, shutdown_channel, JournalWriter, QueueEngine, TicketFilter,
};
use walkin_core::domain::TicketState;
use walkin_core::port::{ManualTimeProvider, QueueStore, SequentialIdProvider};
use walkin_core::ErrorKind;
use walkin_infra_sqlite::{create_pool, run_migrations, SqliteQueueStore};

const START: i64 = 1_710_061_200_000;

async fn store() -> Arc<SqliteQueueStore> {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqliteQueueStore::new(pool))
}

/// Run `work` against a journaled engine, then drain the journal
async fn journaled<F>(store: &Arc<SqliteQueueStore>, prefix: &str, work: F) -> QueueEngine
where
    F: FnOnce(&QueueEngine),
{
    let snapshot = store.load().await.unwrap();
    let (tx, rx) = journal_channel();
    let engine = QueueEngine::restore(
        snapshot,
        Arc::new(SequentialIdProvider::new(prefix)),
        Arc::new(ManualTimeProvider::new(START)),
    )
    .unwrap()
    .with_journal(tx);

    let (shutdown, token) = shutdown_channel();
    let writer = JournalWriter::new(store.clone(), rx);
    let task = tokio::spawn(writer.run(token));

    work(&engine);

    shutdown.shutdown();
    let stats = task.await.unwrap();
    assert_eq!(stats.failed, 0);
    engine
}

async fn reopen(store: &Arc<SqliteQueueStore>) -> QueueEngine {
    QueueEngine::restore(
        store.load().await.unwrap(),
        Arc::new(SequentialIdProvider::new("after")),
        Arc::new(ManualTimeProvider::new(START)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_restart_restores_queues_and_history() {
    let store = store().await;

    let before = journaled(&store, "before", |engine| {
        let carlos = engine.register_provider("Carlos").unwrap();
        let dora = engine.register_provider("Dora").unwrap();
        let a = engine.enqueue_ticket(&carlos.id, 1, "Alice").unwrap().ticket;
        let b = engine.enqueue_ticket(&carlos.id, 2, "Bruno").unwrap().ticket;
        engine.enqueue_ticket(&carlos.id, 3, "Clara").unwrap();
        engine.enqueue_ticket(&dora.id, 4, "Diego").unwrap();

        engine.call_next(&carlos.id).unwrap();
        engine.complete_service(&a.id).unwrap();
        engine.call_next(&carlos.id).unwrap();
        assert_eq!(engine.get_ticket(&b.id).unwrap().ticket.state, TicketState::Serving);
        engine.set_provider_active(&dora.id, false).unwrap();
    })
    .await;

    let after = reopen(&store).await;

    assert_eq!(after.list_providers(), before.list_providers());
    assert_eq!(after.all_queues(), before.all_queues());
    assert_eq!(after.system_status(), before.system_status());
    assert_eq!(
        after.history(&TicketFilter::default()),
        before.history(&TicketFilter::default())
    );
}

#[tokio::test]
async fn test_restored_engine_keeps_rules_and_sequence() {
    let store = store().await;

    journaled(&store, "first", |engine| {
        let carlos = engine.register_provider("Carlos").unwrap();
        engine.enqueue_ticket(&carlos.id, 7, "Alice").unwrap();
    })
    .await;

    let after = reopen(&store).await;
    let carlos = after.list_providers().remove(0);

    // Number 7 is still held, provider name still taken
    assert_eq!(
        after.enqueue_ticket(&carlos.id, 7, "Bruno").unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert!(after.register_provider("Carlos").is_err());

    // New arrivals queue behind restored ones
    let clara = after.enqueue_ticket(&carlos.id, 8, "Clara").unwrap();
    assert_eq!(clara.position, 2);
    let first = after.call_next(&carlos.id).unwrap().unwrap();
    assert_eq!(first.display_number.get(), 7);
    assert!(clara.ticket.seq > first.seq);
}

#[tokio::test]
async fn test_removed_provider_stays_removed() {
    let store = store().await;

    journaled(&store, "first", |engine| {
        let carlos = engine.register_provider("Carlos").unwrap();
        let t = engine.enqueue_ticket(&carlos.id, 1, "Alice").unwrap().ticket;
        engine.cancel_ticket(&t.id).unwrap();
        engine.remove_provider(&carlos.id).unwrap();
    })
    .await;

    let after = reopen(&store).await;
    assert!(after.list_providers().is_empty());

    let history = after.history(&TicketFilter::default());
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].state, TicketState::Cancelled);

    // The freed name can be registered again
    after.register_provider("Carlos").unwrap();
}

#[tokio::test]
async fn test_reused_name_survives_restart() {
    let store = store().await;

    let before = journaled(&store, "first", |engine| {
        let old = engine.register_provider("Carlos").unwrap();
        engine.remove_provider(&old.id).unwrap();
        let new = engine.register_provider("Carlos").unwrap();
        engine.enqueue_ticket(&new.id, 5, "Alice").unwrap();
        engine.set_provider_active(&new.id, false).unwrap();
    })
    .await;

    let after = reopen(&store).await;
    assert_eq!(after.list_providers(), before.list_providers());
    assert!(!after.list_providers()[0].active);
    assert_eq!(after.all_queues(), before.all_queues());
}
