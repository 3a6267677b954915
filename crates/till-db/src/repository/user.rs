//! # User Directory
//!
//! Read-side projection of the auth module's user records.
//!
//! The drawer subsystem does not own users, passwords, or permissions;
//! it only needs `id -> (name, role)` to apply the drawer policy and to
//! name a conflicting holder in error messages.

use sqlx::SqlitePool;

use crate::error::DbResult;
use till_core::{Operator, Role};

/// Read-only lookup of operators.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    role: Role,
}

impl UserDirectory {
    /// Creates a new UserDirectory.
    pub fn new(pool: SqlitePool) -> Self {
        UserDirectory { pool }
    }

    /// Looks up an active operator by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Operator>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, role FROM users WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Operator {
            id: r.id,
            name: r.name,
            role: r.role,
        }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use till_core::DEFAULT_TENANT_ID;

    #[tokio::test]
    async fn test_lookup_maps_role() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::query(
            "INSERT INTO users (id, tenant_id, name, role, is_active, created_at) \
             VALUES ('op-a', ?1, 'Alice', 'manager', 1, ?2), \
                    ('op-b', ?1, 'Bob', 'cashier', 0, ?2)",
        )
        .bind(DEFAULT_TENANT_ID)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let users = db.users();

        let alice = users.get("op-a").await.unwrap().unwrap();
        assert_eq!(alice.name, "Alice");
        assert!(alice.role.is_privileged());

        // Deactivated and unknown operators both come back empty.
        assert!(users.get("op-b").await.unwrap().is_none());
        assert!(users.get("nobody").await.unwrap().is_none());
    }
}
