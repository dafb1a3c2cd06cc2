//! Storage-facing data transfer types.
//!
//! Absence is represented by a zero id, not by an option: repositories hand
//! back default records where a lookup was tolerant of a miss, and the
//! aggregate builder ignores zero-id records.

use chrono::{DateTime, Utc};

use crate::domain::Gender;

#[derive(Debug, Clone, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub avatar_file_key: Option<String>,
    pub roles: Vec<Role>,
    /// Permission codes, denormalized union over the user's roles.
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Client {
    pub id: i64,
    pub code: String,
    /// Raw HS256 key for every token issued to this client's users.
    pub secret_key: String,
    pub audiences: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub refresh_token_id: String,
    pub user_agent: String,
    pub fingerprint: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Role {
    pub id: i64,
    pub code: String,
}

/// User-shaped profile view: no password hash, no permissions.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub avatar_file_key: Option<String>,
}

/// Snapshot for the login use case.
#[derive(Debug, Default)]
pub struct DataForLogin {
    pub user: User,
    pub client: Client,
    pub sessions: Vec<Session>,
}

/// Snapshot for the register use case.
#[derive(Debug, Default)]
pub struct DataForRegister {
    pub user: User,
    pub client: Client,
    pub default_roles: Vec<Role>,
    pub default_permission_codes: Vec<String>,
}

/// Snapshot for the refresh use case.
#[derive(Debug, Default)]
pub struct DataForRefreshTokens {
    pub user: User,
    pub session: Session,
}

/// Snapshot for the logout use case.
#[derive(Debug, Default)]
pub struct DataForLogout {
    pub session: Session,
}
