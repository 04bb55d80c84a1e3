//! Resolution of the `userId` foreign key for records created without one.
//!
//! Calendar events carry a `createdByEmail` that names their author; tasks
//! and work schedules have no such hint. In both cases the fallback is
//! deterministic: the most recently created admin-role user.

use async_trait::async_trait;
use db::{
    models::user::User,
    store::JsonRow,
    tables::{LogicalTable::*, TableRef},
};
use serde_json::Value;
use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Tables whose created records are attributed to a user.
pub fn requires_user_id(table: &TableRef) -> bool {
    matches!(
        table.logical,
        Some(CalendarEvents) | Some(Tasks) | Some(WorkSchedules)
    )
}

#[async_trait]
pub trait UserResolver: Send + Sync {
    /// Pick the user a new record should be attributed to. `row` is the
    /// already-translated internal record. `None` means no candidate exists
    /// and the record is stored unattributed.
    async fn resolve_user_id(
        &self,
        table: &TableRef,
        row: &JsonRow,
    ) -> Result<Option<i64>, ResolveError>;
}

pub struct DbUserResolver {
    pool: SqlitePool,
}

impl DbUserResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserResolver for DbUserResolver {
    async fn resolve_user_id(
        &self,
        table: &TableRef,
        row: &JsonRow,
    ) -> Result<Option<i64>, ResolveError> {
        if table.is(CalendarEvents) {
            if let Some(email) = row.get("createdByEmail").and_then(Value::as_str) {
                if let Some(user) = User::find_by_email(&self.pool, email).await? {
                    return Ok(Some(user.id));
                }
                tracing::debug!(
                    email = %email,
                    "no user matches createdByEmail, falling back to latest admin"
                );
            }
        }
        Ok(User::latest_admin(&self.pool).await?.map(|u| u.id))
    }
}

#[cfg(test)]
mod tests {
    use db::{DBService, store::RecordStore};
    use serde_json::json;

    use super::*;

    fn row(value: serde_json::Value) -> JsonRow {
        value.as_object().unwrap().clone()
    }

    async fn seeded() -> (DbUserResolver, i64, i64) {
        let db = DBService::new_in_memory().await.unwrap();
        let store = RecordStore::new(db.pool.clone());
        let admin = store
            .insert(
                "User",
                &row(json!({"name": "Admin", "email": "admin@gym.fr", "role": "admin"})),
            )
            .await
            .unwrap();
        let employee = store
            .insert(
                "User",
                &row(json!({"name": "Ana", "email": "ana@gym.fr", "role": "employee"})),
            )
            .await
            .unwrap();
        (
            DbUserResolver::new(db.pool),
            admin["id"].as_i64().unwrap(),
            employee["id"].as_i64().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_calendar_event_resolves_created_by_email() {
        let (resolver, _, employee_id) = seeded().await;
        let events = TableRef::resolve("calendar_events");
        let resolved = resolver
            .resolve_user_id(&events, &row(json!({"createdByEmail": "ana@gym.fr"})))
            .await
            .unwrap();
        assert_eq!(resolved, Some(employee_id));
    }

    #[tokio::test]
    async fn test_unmatched_email_falls_back_to_admin() {
        let (resolver, admin_id, _) = seeded().await;
        let events = TableRef::resolve("calendar_events");
        let resolved = resolver
            .resolve_user_id(&events, &row(json!({"createdByEmail": "ghost@gym.fr"})))
            .await
            .unwrap();
        assert_eq!(resolved, Some(admin_id));
    }

    #[tokio::test]
    async fn test_tasks_always_use_admin_fallback() {
        let (resolver, admin_id, _) = seeded().await;
        let tasks = TableRef::resolve("tasks");
        let resolved = resolver
            .resolve_user_id(&tasks, &row(json!({"title": "Open up"})))
            .await
            .unwrap();
        assert_eq!(resolved, Some(admin_id));
    }

    #[tokio::test]
    async fn test_no_admin_resolves_to_none() {
        let db = DBService::new_in_memory().await.unwrap();
        let resolver = DbUserResolver::new(db.pool);
        let tasks = TableRef::resolve("tasks");
        let resolved = resolver
            .resolve_user_id(&tasks, &JsonRow::new())
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_requires_user_id_tables() {
        for name in ["calendar_events", "tasks", "work_schedules"] {
            assert!(requires_user_id(&TableRef::resolve(name)), "{name}");
        }
        for name in ["gyms", "employees", "app_config", "mystery"] {
            assert!(!requires_user_id(&TableRef::resolve(name)), "{name}");
        }
    }
}
