use tracing::{error, info, warn};

use crate::config::TokenSettings;
use crate::domain::{self, Auth, Tokens};
use crate::error::{Result, SsoError};
use crate::repo::AuthRepository;

#[derive(Debug, Clone)]
pub struct LoginParams {
    pub username: String,
    pub password: String,
    pub client_code: String,
    pub user_agent: String,
    pub fingerprint: String,
    pub issuer: String,
}

/// Checks user credentials and opens a session for the client.
#[derive(Clone)]
pub struct Login {
    tokens: TokenSettings,
    repo: AuthRepository,
}

impl Login {
    pub fn new(tokens: TokenSettings, repo: AuthRepository) -> Self {
        Self { tokens, repo }
    }

    pub async fn execute(&self, params: LoginParams) -> Result<Tokens> {
        info!(
            username = %params.username,
            client_code = %params.client_code,
            "attempting to login user"
        );

        let data = self
            .repo
            .data_for_login(&params.username, &params.client_code)
            .await
            .map_err(|err| match err {
                // An unknown username must look exactly like a wrong password.
                SsoError::EntityNotFound => {
                    warn!(username = %params.username, "user not found");
                    SsoError::InvalidCredentials
                }
                err => {
                    error!(error = %err, "failed to load login data");
                    err
                }
            })?;

        let mut auth = Auth::builder(self.tokens.access_token_ttl, self.tokens.refresh_token_ttl)
            .user(data.user)
            .client(data.client)
            .sessions(data.sessions)
            .build()?;

        let tokens = auth
            .login(&domain::LoginParams {
                password: params.password,
                user_agent: params.user_agent,
                fingerprint: params.fingerprint,
                issuer: params.issuer,
            })
            .map_err(|err| {
                warn!(username = %params.username, error = %err, "failed to login");
                err
            })?;

        self.repo.save(&mut auth).await.map_err(|err| {
            error!(error = %err, "error saving data to storage");
            err
        })?;

        info!(username = %params.username, "user logged in successfully");

        Ok(tokens)
    }
}
