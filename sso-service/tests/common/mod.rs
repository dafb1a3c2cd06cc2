//! Shared fixtures: an in-memory SQLite pool with migrations applied and
//! seed helpers for clients, users and sessions.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use sso_service::config::TokenSettings;
use sso_service::db::{SqliteStorage, Storage, MIGRATOR};
use sso_service::repo::{AuthRepository, ProfileRepository};

pub const CLIENT_CODE: &str = "web";
pub const SECRET_KEY: &str = "98649a5c-2137-4a78-a63f-fbab416a7f9e";
pub const USERNAME: &str = "u";
pub const PASSWORD: &str = "123456";
// bcrypt hash of "123456" at cost 10.
pub const PASSWORD_HASH: &str = "$2a$10$MzZyhvwQgTriuJ3pPH0z.exkmUxk2gwV1vFHlQvd9457n27gGR4NO";
pub const USER_AGENT: &str = "ua";
pub const FINGERPRINT: &str = "fp";
pub const ISSUER: &str = "iss";

pub async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");

    MIGRATOR.run(&pool).await.expect("migrations");

    pool
}

pub fn storage(pool: &SqlitePool) -> Arc<dyn Storage> {
    Arc::new(SqliteStorage::from_pool(pool.clone()))
}

pub fn auth_repo(pool: &SqlitePool) -> AuthRepository {
    AuthRepository::new(storage(pool))
}

pub fn profile_repo(pool: &SqlitePool) -> ProfileRepository {
    ProfileRepository::new(storage(pool))
}

pub fn token_settings() -> TokenSettings {
    TokenSettings {
        access_token_ttl: Duration::minutes(10),
        refresh_token_ttl: Duration::hours(1),
    }
}

pub async fn seed_client(pool: &SqlitePool, code: &str, secret_key: &str) -> i64 {
    let now = Utc::now();
    sqlx::query_scalar(
        "INSERT INTO clients (code, secret_key, deleted, created_at, updated_at)
         VALUES (?, ?, 0, ?, ?) RETURNING id",
    )
    .bind(code)
    .bind(secret_key)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed client")
}

pub async fn seed_user(pool: &SqlitePool, username: &str, password_hash: &str) -> i64 {
    let now = Utc::now();
    sqlx::query_scalar(
        "INSERT INTO users (username, password_hash, full_name, deleted, created_at, updated_at)
         VALUES (?, ?, 'seeded user', 0, ?, ?) RETURNING id",
    )
    .bind(username)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed user")
}

pub async fn link_user_client(pool: &SqlitePool, user_id: i64, client_id: i64) {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO user_clients (user_id, client_id, created_at, updated_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(client_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("link user to client");
}

/// Seeds a role with one permission and makes it a default role of the client.
pub async fn seed_default_role(
    pool: &SqlitePool,
    client_id: i64,
    role_code: &str,
    permission_code: &str,
) -> i64 {
    let now = Utc::now();

    let role_id: i64 = sqlx::query_scalar(
        "INSERT INTO roles (code, active, deleted, created_at, updated_at)
         VALUES (?, 1, 0, ?, ?) RETURNING id",
    )
    .bind(role_code)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed role");

    let permission_id: i64 = sqlx::query_scalar(
        "INSERT INTO permissions (code, active, deleted, created_at, updated_at)
         VALUES (?, 1, 0, ?, ?) RETURNING id",
    )
    .bind(permission_code)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed permission");

    sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id, created_at, updated_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(role_id)
    .bind(permission_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("link role to permission");

    sqlx::query(
        "INSERT INTO client_default_roles (client_id, role_id, created_at, updated_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(client_id)
    .bind(role_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("link client to default role");

    role_id
}

pub async fn seed_session(
    pool: &SqlitePool,
    user_id: i64,
    refresh_token_id: &str,
    expires_at: DateTime<Utc>,
) -> i64 {
    let now = Utc::now();
    sqlx::query_scalar(
        "INSERT INTO sessions (user_id, refresh_token_id, user_agent, fingerprint,
                               expires_at, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(refresh_token_id)
    .bind(USER_AGENT)
    .bind(FINGERPRINT)
    .bind(expires_at)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed session")
}

pub async fn session_count(pool: &SqlitePool, user_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("count sessions")
}

pub async fn session_jtis(pool: &SqlitePool, user_id: i64) -> Vec<String> {
    sqlx::query_scalar("SELECT refresh_token_id FROM sessions WHERE user_id = ? ORDER BY id")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .expect("list session jtis")
}
