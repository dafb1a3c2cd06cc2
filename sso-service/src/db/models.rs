//! Row types mapped straight off the storage schema.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<i16>,
    pub avatar_file_key: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub code: String,
    pub secret_key: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: i64,
    pub user_id: i64,
    pub refresh_token_id: String,
    pub user_agent: String,
    pub fingerprint: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct PermissionRow {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub active: bool,
}
