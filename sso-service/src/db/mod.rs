//! Storage port and its SQLite implementation.

mod models;
mod sqlite;

pub use models::{ClientRow, PermissionRow, RoleRow, SessionRow, UserRow};
pub use sqlite::{SqliteStorage, MIGRATOR};

use async_trait::async_trait;

use crate::error::Result;

/// Capability set the core consumes. Lookups that miss return
/// [`SsoError::EntityNotFound`](crate::SsoError::EntityNotFound); inserts that
/// violate a uniqueness constraint return
/// [`SsoError::EntityExists`](crate::SsoError::EntityExists).
#[async_trait]
pub trait Storage: Send + Sync {
    async fn user(&self, id: i64) -> Result<UserRow>;
    async fn user_by_username(&self, username: &str) -> Result<UserRow>;
    async fn create_user(&self, user: &UserRow) -> Result<i64>;
    async fn update_user(&self, user: &UserRow) -> Result<()>;
    /// Soft delete: flips the deleted flag and bumps `updated_at`.
    async fn remove_user(&self, id: i64) -> Result<()>;

    async fn roles_by_user_id(&self, user_id: i64) -> Result<Vec<RoleRow>>;
    async fn permissions_by_user_id(&self, user_id: i64) -> Result<Vec<PermissionRow>>;

    async fn sessions_by_user_id(&self, user_id: i64) -> Result<Vec<SessionRow>>;
    async fn session_by_refresh_token_id(&self, refresh_token_id: &str) -> Result<SessionRow>;
    async fn create_session(&self, session: &SessionRow) -> Result<i64>;
    async fn update_session(&self, session: &SessionRow) -> Result<()>;
    /// Hard delete; sessions have no soft-delete flag.
    async fn remove_session(&self, id: i64) -> Result<()>;

    async fn client_by_code(&self, code: &str) -> Result<ClientRow>;
    /// The client only if a user-client link exists.
    async fn client_by_code_and_user_id(&self, code: &str, user_id: i64) -> Result<ClientRow>;
    async fn audiences_by_client_id(&self, client_id: i64) -> Result<Vec<String>>;
    async fn roles_by_client_id(&self, client_id: i64) -> Result<Vec<RoleRow>>;
    async fn permissions_by_role_codes(&self, codes: &[String]) -> Result<Vec<PermissionRow>>;

    async fn create_user_client_link(&self, user_id: i64, client_id: i64) -> Result<()>;
    async fn create_user_role_link(&self, user_id: i64, role_id: i64) -> Result<()>;
}
