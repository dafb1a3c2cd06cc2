use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::TokenSettings;
use crate::domain::{self, Auth, Gender, Tokens};
use crate::error::{Result, SsoError};
use crate::kafka::RegistrationEvents;
use crate::repo::AuthRepository;

#[derive(Debug, Clone)]
pub struct RegisterParams {
    pub username: String,
    pub password: String,
    pub client_code: String,
    pub full_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub avatar_file_key: Option<String>,
    pub user_agent: String,
    pub fingerprint: String,
    pub issuer: String,
}

/// Registers a new user for a client, opens their first session and announces
/// the registration on the client's event topic.
#[derive(Clone)]
pub struct Register {
    tokens: TokenSettings,
    repo: AuthRepository,
    events: RegistrationEvents,
}

impl Register {
    pub fn new(tokens: TokenSettings, repo: AuthRepository, events: RegistrationEvents) -> Self {
        Self { tokens, repo, events }
    }

    pub async fn execute(&self, params: RegisterParams) -> Result<Tokens> {
        info!(
            username = %params.username,
            client_code = %params.client_code,
            "attempting to register new user"
        );

        let data = self
            .repo
            .data_for_register(&params.username, &params.client_code)
            .await
            .map_err(|err| match err {
                SsoError::EntityNotFound => {
                    warn!(client_code = %params.client_code, "client not found");
                    SsoError::ClientNotFound
                }
                err => {
                    error!(error = %err, "failed to load register data");
                    err
                }
            })?;

        let mut auth = Auth::builder(self.tokens.access_token_ttl, self.tokens.refresh_token_ttl)
            .user(data.user)
            .client(data.client)
            .default_roles(data.default_roles)
            .default_permission_codes(data.default_permission_codes)
            .build()?;

        auth.register(&domain::RegisterParams {
            username: params.username.clone(),
            password: params.password,
            full_name: params.full_name,
            date_of_birth: params.date_of_birth,
            gender: params.gender,
            avatar_file_key: params.avatar_file_key,
            user_agent: params.user_agent.clone(),
            fingerprint: params.fingerprint.clone(),
            issuer: params.issuer.clone(),
        })
        .map_err(|err| {
            warn!(username = %params.username, error = %err, "failed to register");
            err
        })?;

        // First save assigns the user id; the session can only be created
        // after that.
        self.repo.save(&mut auth).await.map_err(|err| {
            error!(error = %err, "error saving user to storage");
            err
        })?;

        let tokens =
            auth.create_new_session(&params.issuer, &params.user_agent, &params.fingerprint)?;

        self.repo.save(&mut auth).await.map_err(|err| {
            error!(error = %err, "error saving session to storage");
            err
        })?;

        self.events
            .publish(auth.client_code(), auth.user())
            .await
            .map_err(|err| {
                error!(error = %err, "failed to publish registration event");
                err
            })?;

        info!(username = %params.username, "user registered successfully");

        Ok(tokens)
    }
}
