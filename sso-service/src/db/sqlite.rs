//! SQLite implementation of the storage port.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;

use crate::db::{ClientRow, PermissionRow, RoleRow, SessionRow, Storage, UserRow};
use crate::error::{Result, SsoError};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Opens (creating if missing) the database file and applies migrations.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await.map_err(sqlx::Error::from)?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool; the caller is responsible for migrations.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn user(&self, id: i64) -> Result<UserRow> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, full_name, date_of_birth, gender,
                   avatar_file_key, deleted, created_at, updated_at
            FROM users
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SsoError::EntityNotFound)
    }

    async fn user_by_username(&self, username: &str) -> Result<UserRow> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, full_name, date_of_birth, gender,
                   avatar_file_key, deleted, created_at, updated_at
            FROM users
            WHERE username = ? AND deleted = 0
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SsoError::EntityNotFound)
    }

    async fn create_user(&self, user: &UserRow) -> Result<i64> {
        let now = Utc::now();

        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, password_hash, full_name, date_of_birth,
                               gender, avatar_file_key, deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.date_of_birth)
        .bind(user.gender)
        .bind(&user.avatar_file_key)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(into_exists)
    }

    async fn update_user(&self, user: &UserRow) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, password_hash = ?, full_name = ?, date_of_birth = ?,
                gender = ?, avatar_file_key = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.date_of_birth)
        .bind(user.gender)
        .bind(&user.avatar_file_key)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_user(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET deleted = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn roles_by_user_id(&self, user_id: i64) -> Result<Vec<RoleRow>> {
        let roles = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT r.id, r.code, r.description, r.active
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ? AND r.active = 1 AND r.deleted = 0
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn permissions_by_user_id(&self, user_id: i64) -> Result<Vec<PermissionRow>> {
        let permissions = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT p.id, p.code, p.description, p.active
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = ? AND p.active = 1 AND p.deleted = 0
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    async fn sessions_by_user_id(&self, user_id: i64) -> Result<Vec<SessionRow>> {
        let sessions = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, refresh_token_id, user_agent, fingerprint,
                   expires_at, created_at, updated_at
            FROM sessions
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn session_by_refresh_token_id(&self, refresh_token_id: &str) -> Result<SessionRow> {
        sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, refresh_token_id, user_agent, fingerprint,
                   expires_at, created_at, updated_at
            FROM sessions
            WHERE refresh_token_id = ?
            "#,
        )
        .bind(refresh_token_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SsoError::EntityNotFound)
    }

    async fn create_session(&self, session: &SessionRow) -> Result<i64> {
        let now = Utc::now();

        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO sessions (user_id, refresh_token_id, user_agent, fingerprint,
                                  expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(session.user_id)
        .bind(&session.refresh_token_id)
        .bind(&session.user_agent)
        .bind(&session.fingerprint)
        .bind(session.expires_at)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(into_exists)
    }

    async fn update_session(&self, session: &SessionRow) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET refresh_token_id = ?, user_agent = ?, fingerprint = ?,
                expires_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&session.refresh_token_id)
        .bind(&session.user_agent)
        .bind(&session.fingerprint)
        .bind(session.expires_at)
        .bind(Utc::now())
        .bind(session.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_session(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn client_by_code(&self, code: &str) -> Result<ClientRow> {
        sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, code, secret_key, deleted, created_at, updated_at
            FROM clients
            WHERE code = ? AND deleted = 0
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SsoError::EntityNotFound)
    }

    async fn client_by_code_and_user_id(&self, code: &str, user_id: i64) -> Result<ClientRow> {
        sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT c.id, c.code, c.secret_key, c.deleted, c.created_at, c.updated_at
            FROM clients c
            JOIN user_clients uc ON uc.client_id = c.id
            WHERE c.code = ? AND uc.user_id = ? AND c.deleted = 0
            "#,
        )
        .bind(code)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SsoError::EntityNotFound)
    }

    async fn audiences_by_client_id(&self, client_id: i64) -> Result<Vec<String>> {
        let audiences = sqlx::query_scalar::<_, String>(
            "SELECT name FROM audiences WHERE client_id = ? ORDER BY id",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(audiences)
    }

    async fn roles_by_client_id(&self, client_id: i64) -> Result<Vec<RoleRow>> {
        let roles = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT r.id, r.code, r.description, r.active
            FROM roles r
            JOIN client_default_roles cdr ON cdr.role_id = r.id
            WHERE cdr.client_id = ? AND r.active = 1 AND r.deleted = 0
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn permissions_by_role_codes(&self, codes: &[String]) -> Result<Vec<PermissionRow>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::new(
            r#"
            SELECT DISTINCT p.id, p.code, p.description, p.active
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN roles r ON r.id = rp.role_id
            WHERE p.active = 1 AND p.deleted = 0 AND r.code IN (
            "#,
        );

        let mut separated = builder.separated(", ");
        for code in codes {
            separated.push_bind(code);
        }
        separated.push_unseparated(")");

        let permissions = builder
            .build_query_as::<PermissionRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(permissions)
    }

    async fn create_user_client_link(&self, user_id: i64, client_id: i64) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO user_clients (user_id, client_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(client_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(into_exists)?;

        Ok(())
    }

    async fn create_user_role_link(&self, user_id: i64, role_id: i64) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(into_exists)?;

        Ok(())
    }
}

fn into_exists(err: sqlx::Error) -> SsoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return SsoError::EntityExists;
        }
    }

    SsoError::Database(err)
}
