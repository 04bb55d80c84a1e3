use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Employee,
    Admin,
    Superadmin,
}

/// The one backing type the proxy needs typed access to: write paths
/// resolve a `userId` from a creator email or fall back to an admin.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
    #[sqlx(rename = "gymId")]
    pub gym_id: Option<i64>,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM "User" WHERE "email" = $1"#)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// The deterministic fallback writer: the most recently created
    /// `admin`-role user (ties broken by highest id).
    pub async fn latest_admin(pool: &SqlitePool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT * FROM "User"
               WHERE "role" = 'admin'
               ORDER BY "createdAt" DESC, "id" DESC
               LIMIT 1"#,
        )
        .fetch_optional(pool)
        .await
    }
}
