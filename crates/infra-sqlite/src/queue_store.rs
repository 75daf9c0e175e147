// SQLite QueueStore Implementation

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use walkin_core::domain::{DisplayNumber, Provider, ProviderId, Ticket, TicketState};
use walkin_core::error::{AppError, Result};
use walkin_core::port::{QueueStore, StoreSnapshot};

// Helper to convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite result codes: https://www.sqlite.org/rescode.html
            Some(code) => match code.as_ref() {
                "2067" | "1555" => AppError::Database(format!(
                    "Unique constraint violation: {}",
                    db_err.message()
                )),
                "5" => AppError::Database(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                other => AppError::Database(format!(
                    "Database error [{}]: {}",
                    other,
                    db_err.message()
                )),
            },
            None => AppError::Database(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Database(format!("Column not found: {}", col)),
        _ => AppError::Database(err.to_string()),
    }
}

pub struct SqliteQueueStore {
    pool: SqlitePool,
}

impl SqliteQueueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn load(&self) -> Result<StoreSnapshot> {
        let providers = sqlx::query_as::<_, ProviderRow>(
            "SELECT id, name, active, seq, created_at FROM providers ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .into_iter()
        .map(ProviderRow::into_provider)
        .collect::<Result<Vec<_>>>()?;

        let tickets = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, seq, display_number, client_name, provider_id, state,
                   created_at, called_at, finished_at
            FROM tickets
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .into_iter()
        .map(TicketRow::into_ticket)
        .collect::<Result<Vec<_>>>()?;

        debug!(
            providers = providers.len(),
            tickets = tickets.len(),
            "Queue state loaded"
        );
        Ok(StoreSnapshot { providers, tickets })
    }

    async fn upsert_provider(&self, provider: &Provider) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO providers (id, name, active, seq, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                active = excluded.active
            "#,
        )
        .bind(&provider.id)
        .bind(&provider.name)
        .bind(provider.active)
        .bind(to_db_seq(provider.seq)?)
        .bind(provider.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_provider(&self, id: &ProviderId) -> Result<()> {
        sqlx::query("DELETE FROM providers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn upsert_ticket(&self, ticket: &Ticket) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, seq, display_number, client_name, provider_id, state,
                created_at, called_at, finished_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                state = excluded.state,
                called_at = excluded.called_at,
                finished_at = excluded.finished_at
            "#,
        )
        .bind(&ticket.id)
        .bind(to_db_seq(ticket.seq)?)
        .bind(i64::from(ticket.display_number.get()))
        .bind(&ticket.client_name)
        .bind(&ticket.provider_id)
        .bind(ticket.state.to_string())
        .bind(ticket.created_at)
        .bind(ticket.called_at)
        .bind(ticket.finished_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn to_db_seq(seq: u64) -> Result<i64> {
    i64::try_from(seq).map_err(|_| AppError::InvalidState(format!("Sequence {} overflows", seq)))
}

fn from_db_seq(seq: i64) -> Result<u64> {
    u64::try_from(seq).map_err(|_| AppError::InvalidState(format!("Negative sequence {}", seq)))
}

#[derive(Debug, sqlx::FromRow)]
struct ProviderRow {
    id: String,
    name: String,
    active: bool,
    seq: i64,
    created_at: i64,
}

impl ProviderRow {
    fn into_provider(self) -> Result<Provider> {
        Ok(Provider {
            id: self.id,
            name: self.name,
            active: self.active,
            seq: from_db_seq(self.seq)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: String,
    seq: i64,
    display_number: i64,
    client_name: String,
    provider_id: String,
    state: String,
    created_at: i64,
    called_at: Option<i64>,
    finished_at: Option<i64>,
}

impl TicketRow {
    fn into_ticket(self) -> Result<Ticket> {
        let state = TicketState::parse(&self.state).ok_or_else(|| {
            AppError::InvalidState(format!("Ticket {} has unknown state {}", self.id, self.state))
        })?;
        let display_number = DisplayNumber::new(self.display_number).map_err(|e| {
            AppError::InvalidState(format!("Ticket {} has bad number: {}", self.id, e))
        })?;

        Ok(Ticket {
            seq: from_db_seq(self.seq)?,
            display_number,
            client_name: self.client_name,
            provider_id: self.provider_id,
            state,
            created_at: self.created_at,
            called_at: self.called_at,
            finished_at: self.finished_at,
            id: self.id,
        })
    }
}
