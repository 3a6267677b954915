//! # Session Repository
//!
//! Database operations for cash-shift sessions.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Lifecycle                                  │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── insert_open() → row with NULL closing columns                  │
//! │         (the partial unique index rejects a second open row)           │
//! │                                                                         │
//! │  2. CLOSE (exactly once, terminal)                                     │
//! │     └── close() → one UPDATE writes all four closing columns,          │
//! │         guarded by closed_at IS NULL                                   │
//! │                                                                         │
//! │  3. NEVER DELETED                                                      │
//! │     └── closed rows are permanent financial history                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Single-Open-Shift Guarantee
//! "Is a shift open?" followed by "insert a shift" is a classic
//! check-then-act race. The guarantee does not live here in Rust — it
//! lives in `idx_cash_sessions_one_open`, a partial unique index on the
//! tenant column over open rows. Whoever inserts second gets a UNIQUE
//! violation, surfaced as [`DbError::UniqueViolation`], no matter how
//! the requests interleave.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::{CashSession, ClosingFigures, HistoryFilter, SessionState, HISTORY_PAGE_SIZE};

/// Repository for cash session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

/// Flat row shape as stored; converted into the core enum on read.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    tenant_id: String,
    operator_id: String,
    opened_at: DateTime<Utc>,
    opening_cents: i64,
    closed_at: Option<DateTime<Utc>>,
    theoretical_cents: Option<i64>,
    actual_cents: Option<i64>,
    variance_cents: Option<i64>,
    stock_control_done: bool,
}

impl SessionRow {
    /// Rebuilds the two-state session from the nullable columns.
    ///
    /// The schema CHECK keeps the closing columns all-NULL or all-set;
    /// a row violating that is corrupt and is reported, not guessed at.
    fn into_session(self) -> DbResult<CashSession> {
        let state = match (
            self.closed_at,
            self.theoretical_cents,
            self.actual_cents,
            self.variance_cents,
        ) {
            (None, None, None, None) => SessionState::Open,
            (Some(closed_at), Some(theoretical), Some(actual), Some(variance)) => {
                SessionState::Closed(ClosingFigures {
                    closed_at,
                    theoretical_cents: theoretical,
                    actual_cents: actual,
                    variance_cents: variance,
                })
            }
            _ => {
                return Err(DbError::Internal(format!(
                    "session {} has partial closing figures",
                    self.id
                )))
            }
        };

        Ok(CashSession {
            id: self.id,
            tenant_id: self.tenant_id,
            operator_id: self.operator_id,
            opened_at: self.opened_at,
            opening_cents: self.opening_cents,
            stock_control_done: self.stock_control_done,
            state,
        })
    }
}

const SESSION_COLUMNS: &str = "id, tenant_id, operator_id, opened_at, opening_cents, \
     closed_at, theoretical_cents, actual_cents, variance_cents, stock_control_done";

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Inserts a freshly opened session.
    ///
    /// ## Errors
    /// [`DbError::UniqueViolation`] if another open session exists for
    /// the tenant — this is the loser's side of an open race and is the
    /// signal the service maps to a Conflict.
    pub async fn insert_open(&self, session: &CashSession) -> DbResult<()> {
        debug!(id = %session.id, operator = %session.operator_id, "Inserting open session");

        sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, tenant_id, operator_id, opened_at, opening_cents,
                closed_at, theoretical_cents, actual_cents, variance_cents,
                stock_control_done
            ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, NULL, NULL, ?6)
            "#,
        )
        .bind(&session.id)
        .bind(&session.tenant_id)
        .bind(&session.operator_id)
        .bind(session.opened_at)
        .bind(session.opening_cents)
        .bind(session.stock_control_done)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_session).transpose()
    }

    /// The currently open session, if any.
    ///
    /// The unique index guarantees there is at most one.
    pub async fn find_open(&self) -> DbResult<Option<CashSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE closed_at IS NULL"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_session).transpose()
    }

    /// The open session owned by the given operator, if any.
    pub async fn find_open_for_operator(&self, operator_id: &str) -> DbResult<Option<CashSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE closed_at IS NULL AND operator_id = ?1"
        ))
        .bind(operator_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_session).transpose()
    }

    /// The most recently closed session, by close instant.
    ///
    /// This is the anchor of the floating-balance computation: the gap
    /// between this session's close and "now" is the window of
    /// unattributed cash movement.
    pub async fn find_last_closed(&self) -> DbResult<Option<CashSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE closed_at IS NOT NULL \
             ORDER BY closed_at DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_session).transpose()
    }

    /// Writes the closing figures, transitioning OPEN → CLOSED.
    ///
    /// All four closing columns land in a single conditional UPDATE, so
    /// a session can never be observed half-closed. The `closed_at IS
    /// NULL` guard makes the close exactly-once: a raced or repeated
    /// close touches zero rows and reports NotFound instead of
    /// overwriting reconciled history.
    pub async fn close(&self, id: &str, figures: &ClosingFigures) -> DbResult<()> {
        debug!(id = %id, variance = figures.variance_cents, "Closing session");

        let result = sqlx::query(
            r#"
            UPDATE cash_sessions SET
                closed_at = ?2,
                theoretical_cents = ?3,
                actual_cents = ?4,
                variance_cents = ?5
            WHERE id = ?1 AND closed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(figures.closed_at)
        .bind(figures.theoretical_cents)
        .bind(figures.actual_cents)
        .bind(figures.variance_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open session", id));
        }

        Ok(())
    }

    /// Marks the operator's open session as stock-controlled.
    ///
    /// Best-effort annotation: returns whether a session was touched,
    /// and touching none is not an error.
    pub async fn set_stock_control_done(&self, operator_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE cash_sessions SET stock_control_done = 1 \
             WHERE operator_id = ?1 AND closed_at IS NULL",
        )
        .bind(operator_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Filtered session history, newest first, capped at one page.
    ///
    /// Filters are conjunctive; the end date is inclusive through the
    /// end of that day.
    pub async fn history(&self, filter: &HistoryFilter) -> DbResult<Vec<CashSession>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE 1=1"
        ));

        if let Some(from) = filter.date_from {
            qb.push(" AND opened_at >= ");
            qb.push_bind(start_of_day(from));
        }
        if let Some(to) = filter.date_to {
            // Inclusive through end-of-day: strictly before the next
            // day's midnight.
            if let Some(next) = to.succ_opt() {
                qb.push(" AND opened_at < ");
                qb.push_bind(start_of_day(next));
            }
        }
        if let Some(operator_id) = &filter.operator_id {
            qb.push(" AND operator_id = ");
            qb.push_bind(operator_id.clone());
        }
        if filter.variance_only {
            qb.push(" AND variance_cents IS NOT NULL AND variance_cents != 0");
        }
        if let Some(done) = filter.stock_control {
            qb.push(" AND stock_control_done = ");
            qb.push_bind(done);
        }

        qb.push(" ORDER BY opened_at DESC LIMIT ");
        qb.push_bind(HISTORY_PAGE_SIZE);

        let rows: Vec<SessionRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter().map(SessionRow::into_session).collect()
    }
}

/// Midnight UTC at the start of the given date.
fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use till_core::DEFAULT_TENANT_ID;

    async fn test_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        // Sessions reference operators; register the test crew.
        for (id, name, role) in [
            ("op-a", "Alice", "manager"),
            ("op-b", "Bob", "cashier"),
            ("op-c", "Carol", "cashier"),
        ] {
            sqlx::query(
                "INSERT INTO users (id, tenant_id, name, role, is_active, created_at) \
                 VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            )
            .bind(id)
            .bind(DEFAULT_TENANT_ID)
            .bind(name)
            .bind(role)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();
        }
        db
    }

    fn open_session(id: &str, operator: &str, opened_at: DateTime<Utc>) -> CashSession {
        CashSession {
            id: id.to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            operator_id: operator.to_string(),
            opened_at,
            opening_cents: 100_000,
            stock_control_done: false,
            state: SessionState::Open,
        }
    }

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, h, 0, 0).unwrap()
    }

    fn figures(closed_at: DateTime<Utc>, variance: i64) -> ClosingFigures {
        ClosingFigures {
            closed_at,
            theoretical_cents: 130_000,
            actual_cents: 130_000 + variance,
            variance_cents: variance,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_open() {
        let db = test_db().await;
        let repo = db.sessions();

        assert!(repo.find_open().await.unwrap().is_none());

        repo.insert_open(&open_session("s-1", "op-b", ts(8)))
            .await
            .unwrap();

        let found = repo.find_open().await.unwrap().unwrap();
        assert_eq!(found.id, "s-1");
        assert!(found.is_open());

        // Scoped lookup only matches the owner.
        assert!(repo
            .find_open_for_operator("op-b")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .find_open_for_operator("op-c")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_second_open_session_is_rejected() {
        let db = test_db().await;
        let repo = db.sessions();

        repo.insert_open(&open_session("s-1", "op-b", ts(8)))
            .await
            .unwrap();

        // A second open row violates the partial unique index no matter
        // which operator tries.
        let err = repo
            .insert_open(&open_session("s-2", "op-c", ts(9)))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");

        // After closing, a new shift may open again.
        repo.close("s-1", &figures(ts(17), 0)).await.unwrap();
        repo.insert_open(&open_session("s-2", "op-c", ts(18)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_close_is_exactly_once() {
        let db = test_db().await;
        let repo = db.sessions();

        repo.insert_open(&open_session("s-1", "op-b", ts(8)))
            .await
            .unwrap();
        repo.close("s-1", &figures(ts(17), -500)).await.unwrap();

        let closed = repo.get_by_id("s-1").await.unwrap().unwrap();
        let stored = closed.closing().unwrap();
        assert_eq!(stored.variance_cents, -500);
        assert_eq!(stored.closed_at, ts(17));

        // A second close must not rewrite history.
        let err = repo.close("s-1", &figures(ts(18), 0)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        let still = repo.get_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(still.closing().unwrap().closed_at, ts(17));
    }

    #[tokio::test]
    async fn test_find_last_closed_orders_by_close_instant() {
        let db = test_db().await;
        let repo = db.sessions();

        repo.insert_open(&open_session("s-1", "op-b", ts(8)))
            .await
            .unwrap();
        repo.close("s-1", &figures(ts(10), 0)).await.unwrap();

        repo.insert_open(&open_session("s-2", "op-c", ts(11)))
            .await
            .unwrap();
        repo.close("s-2", &figures(ts(15), 100)).await.unwrap();

        let last = repo.find_last_closed().await.unwrap().unwrap();
        assert_eq!(last.id, "s-2");
    }

    #[tokio::test]
    async fn test_stock_control_is_best_effort() {
        let db = test_db().await;
        let repo = db.sessions();

        // No open session: a no-op, not an error.
        assert!(!repo.set_stock_control_done("op-b").await.unwrap());

        repo.insert_open(&open_session("s-1", "op-b", ts(8)))
            .await
            .unwrap();
        assert!(repo.set_stock_control_done("op-b").await.unwrap());

        let session = repo.find_open().await.unwrap().unwrap();
        assert!(session.stock_control_done);
    }

    #[tokio::test]
    async fn test_history_filters_conjunctively() {
        let db = test_db().await;
        let repo = db.sessions();

        // Three sessions across two days and two operators; one with a
        // variance, one stock-controlled.
        repo.insert_open(&open_session("s-1", "op-b", ts(8)))
            .await
            .unwrap();
        repo.close("s-1", &figures(ts(10), -500)).await.unwrap();

        repo.insert_open(&open_session("s-2", "op-c", ts(11)))
            .await
            .unwrap();
        repo.set_stock_control_done("op-c").await.unwrap();
        repo.close("s-2", &figures(ts(15), 0)).await.unwrap();

        let day2 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        repo.insert_open(&open_session("s-3", "op-b", day2))
            .await
            .unwrap();

        // Unfiltered: newest first.
        let all = repo.history(&HistoryFilter::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec!["s-3", "s-2", "s-1"]
        );

        // variance_only keeps just the shifted drawer.
        let filter = HistoryFilter {
            variance_only: true,
            ..Default::default()
        };
        let with_variance = repo.history(&filter).await.unwrap();
        assert_eq!(with_variance.len(), 1);
        assert_eq!(with_variance[0].id, "s-1");

        // Operator + stock control combine.
        let filter = HistoryFilter {
            operator_id: Some("op-c".to_string()),
            stock_control: Some(true),
            ..Default::default()
        };
        let checked = repo.history(&filter).await.unwrap();
        assert_eq!(checked.len(), 1);
        assert_eq!(checked[0].id, "s-2");

        // End date inclusive through end-of-day: March 1 catches s-1
        // and s-2 but not the March 2 shift.
        let filter = HistoryFilter {
            date_from: Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            date_to: Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            ..Default::default()
        };
        let day_one = repo.history(&filter).await.unwrap();
        assert_eq!(
            day_one.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec!["s-2", "s-1"]
        );
    }
}
