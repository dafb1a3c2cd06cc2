use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::db::{PermissionRow, RoleRow, SessionRow, Storage, UserRow};
use crate::domain::{Auth, DataStatus, Gender, Session, User};
use crate::dto;
use crate::error::{Result, SsoError};

/// Loads authentication snapshots and persists aggregate mutation plans.
#[derive(Clone)]
pub struct AuthRepository {
    storage: Arc<dyn Storage>,
}

impl AuthRepository {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn client_by_code(&self, code: &str) -> Result<dto::Client> {
        let client = self.storage.client_by_code(code).await?;
        let audiences = self.storage.audiences_by_client_id(client.id).await?;

        Ok(client_dto(client, audiences))
    }

    /// Snapshot for login: the user with roles and permissions, the client if
    /// the user is linked to it, and every session of the user.
    ///
    /// A missing user propagates as not-found. A missing client link does not:
    /// the aggregate fails the login itself when it cannot sign tokens.
    pub async fn data_for_login(
        &self,
        username: &str,
        client_code: &str,
    ) -> Result<dto::DataForLogin> {
        let user = self.user_by_username(username).await?;

        let client = match self.storage.client_by_code_and_user_id(client_code, user.id).await {
            Ok(client) => {
                let audiences = self.storage.audiences_by_client_id(client.id).await?;
                client_dto(client, audiences)
            }
            Err(SsoError::EntityNotFound) => {
                warn!(client_code, "client not found for user");
                dto::Client::default()
            }
            Err(err) => return Err(err),
        };

        let sessions = self
            .storage
            .sessions_by_user_id(user.id)
            .await?
            .into_iter()
            .map(session_dto)
            .collect();

        Ok(dto::DataForLogin { user, client, sessions })
    }

    /// Snapshot for registration: tolerant of a missing user (a default user
    /// means the username is free); the client with its default roles and the
    /// permission codes those roles span.
    pub async fn data_for_register(
        &self,
        username: &str,
        client_code: &str,
    ) -> Result<dto::DataForRegister> {
        let user = match self.user_by_username(username).await {
            Ok(user) => user,
            Err(SsoError::EntityNotFound) => dto::User::default(),
            Err(err) => return Err(err),
        };

        let client = self.client_by_code(client_code).await?;

        let default_roles: Vec<dto::Role> = self
            .storage
            .roles_by_client_id(client.id)
            .await?
            .into_iter()
            .map(role_dto)
            .collect();

        let role_codes: Vec<String> = default_roles.iter().map(|role| role.code.clone()).collect();
        let default_permission_codes = self
            .storage
            .permissions_by_role_codes(&role_codes)
            .await?
            .into_iter()
            .map(|permission| permission.code)
            .collect();

        Ok(dto::DataForRegister { user, client, default_roles, default_permission_codes })
    }

    pub async fn data_for_refresh_tokens(
        &self,
        refresh_token_id: &str,
    ) -> Result<dto::DataForRefreshTokens> {
        let session = self.storage.session_by_refresh_token_id(refresh_token_id).await?;
        let user = self.user(session.user_id).await?;

        Ok(dto::DataForRefreshTokens { user, session: session_dto(session) })
    }

    pub async fn data_for_logout(&self, refresh_token_id: &str) -> Result<dto::DataForLogout> {
        let session = self.storage.session_by_refresh_token_id(refresh_token_id).await?;

        Ok(dto::DataForLogout { session: session_dto(session) })
    }

    /// Persists the aggregate's mutation plan: the user first, then each
    /// session, dispatching on the data status.
    ///
    /// Writes are sequential; there is no cross-entity transaction. A crash
    /// between the user and session writes can leave a user without the
    /// session the operation was about to create.
    pub async fn save(&self, auth: &mut Auth) -> Result<()> {
        self.save_user(auth).await?;
        self.save_sessions(auth).await?;

        Ok(())
    }

    async fn save_user(&self, auth: &mut Auth) -> Result<()> {
        match auth.user.status() {
            DataStatus::ToCreate => {
                let id = self.storage.create_user(&user_row(&auth.user)).await?;
                auth.user.id = id;

                if auth.client.id != 0 {
                    self.storage.create_user_client_link(id, auth.client.id).await?;
                }
                for role in &auth.user.roles {
                    self.storage.create_user_role_link(id, role.id).await?;
                }
            }
            DataStatus::ToUpdate => {
                if auth.user.id == 0 {
                    return Err(SsoError::RequireIdToUpdate);
                }
                self.storage.update_user(&user_row(&auth.user)).await?;
            }
            DataStatus::ToRemove => {
                if auth.user.id == 0 {
                    return Err(SsoError::RequireIdToRemove);
                }
                self.storage.remove_user(auth.user.id).await?;
            }
            DataStatus::None => {}
        }

        auth.user.reset_status();

        Ok(())
    }

    async fn save_sessions(&self, auth: &mut Auth) -> Result<()> {
        let mut kept = Vec::with_capacity(auth.sessions.len());

        for mut session in std::mem::take(&mut auth.sessions) {
            match session.status() {
                DataStatus::ToCreate => {
                    if session.user_id == 0 {
                        session.user_id = auth.user.id;
                    }
                    let id = self.storage.create_session(&session_row(&session)).await?;
                    session.id = id;
                    session.reset_status();
                    kept.push(session);
                }
                DataStatus::ToUpdate => {
                    if session.id == 0 {
                        return Err(SsoError::RequireIdToUpdate);
                    }
                    self.storage.update_session(&session_row(&session)).await?;
                    session.reset_status();
                    kept.push(session);
                }
                DataStatus::ToRemove => {
                    if session.id == 0 {
                        return Err(SsoError::RequireIdToRemove);
                    }
                    self.storage.remove_session(session.id).await?;
                }
                DataStatus::None => kept.push(session),
            }
        }

        auth.sessions = kept;

        Ok(())
    }

    async fn user(&self, id: i64) -> Result<dto::User> {
        let user = self.storage.user(id).await?;
        self.user_with_roles_and_permissions(user).await
    }

    async fn user_by_username(&self, username: &str) -> Result<dto::User> {
        let user = self.storage.user_by_username(username).await?;
        self.user_with_roles_and_permissions(user).await
    }

    async fn user_with_roles_and_permissions(&self, user: UserRow) -> Result<dto::User> {
        let roles = self.storage.roles_by_user_id(user.id).await?;
        let permissions = self.storage.permissions_by_user_id(user.id).await?;

        Ok(user_dto(user, roles, permissions))
    }
}

fn user_dto(user: UserRow, roles: Vec<RoleRow>, permissions: Vec<PermissionRow>) -> dto::User {
    dto::User {
        id: user.id,
        username: user.username,
        password_hash: user.password_hash,
        full_name: user.full_name,
        date_of_birth: user.date_of_birth,
        gender: user.gender.and_then(Gender::from_i16),
        avatar_file_key: user.avatar_file_key,
        roles: roles.into_iter().map(role_dto).collect(),
        permissions: permissions.into_iter().map(|permission| permission.code).collect(),
    }
}

fn client_dto(client: crate::db::ClientRow, audiences: Vec<String>) -> dto::Client {
    dto::Client {
        id: client.id,
        code: client.code,
        secret_key: client.secret_key,
        audiences,
    }
}

fn session_dto(session: SessionRow) -> dto::Session {
    dto::Session {
        id: session.id,
        user_id: session.user_id,
        refresh_token_id: session.refresh_token_id,
        user_agent: session.user_agent,
        fingerprint: session.fingerprint,
        expires_at: session.expires_at,
    }
}

fn role_dto(role: RoleRow) -> dto::Role {
    dto::Role { id: role.id, code: role.code }
}

fn user_row(user: &User) -> UserRow {
    let now = Utc::now();

    UserRow {
        id: user.id,
        username: user.username.clone(),
        password_hash: user.password_hash.clone(),
        full_name: user.full_name.clone(),
        date_of_birth: user.date_of_birth,
        gender: user.gender.map(Gender::as_i16),
        avatar_file_key: user.avatar_file_key.clone(),
        deleted: false,
        created_at: now,
        updated_at: now,
    }
}

fn session_row(session: &Session) -> SessionRow {
    let now = Utc::now();

    SessionRow {
        id: session.id,
        user_id: session.user_id,
        refresh_token_id: session.refresh_token_id.clone(),
        user_agent: session.user_agent.clone(),
        fingerprint: session.fingerprint.clone(),
        expires_at: session.expires_at,
        created_at: now,
        updated_at: now,
    }
}
