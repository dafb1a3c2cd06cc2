use tracing::{error, info, warn};

use crate::config::TokenSettings;
use crate::domain::Auth;
use crate::error::{Result, SsoError};
use crate::repo::AuthRepository;

#[derive(Debug, Clone)]
pub struct LogoutParams {
    pub refresh_token: String,
    pub client_code: String,
}

/// Terminates the session behind the presented refresh token.
#[derive(Clone)]
pub struct Logout {
    tokens: TokenSettings,
    repo: AuthRepository,
}

impl Logout {
    pub fn new(tokens: TokenSettings, repo: AuthRepository) -> Self {
        Self { tokens, repo }
    }

    pub async fn execute(&self, params: LogoutParams) -> Result<()> {
        info!(client_code = %params.client_code, "attempting to logout user");

        let client = self
            .repo
            .client_by_code(&params.client_code)
            .await
            .map_err(|err| match err {
                SsoError::EntityNotFound => {
                    warn!(client_code = %params.client_code, "client not found");
                    SsoError::ClientNotFound
                }
                err => {
                    error!(error = %err, "failed to get client");
                    err
                }
            })?;

        let claims =
            jwt_core::parse_refresh_token(&params.refresh_token, client.secret_key.as_bytes())
                .map_err(|err| {
                    warn!(error = %err, "failed to parse refresh token");
                    SsoError::from(err)
                })?;

        let data = self
            .repo
            .data_for_logout(&claims.jti)
            .await
            .map_err(|err| match err {
                SsoError::EntityNotFound => {
                    warn!("session not found");
                    SsoError::SessionNotFound
                }
                err => {
                    error!(error = %err, "failed to load logout data");
                    err
                }
            })?;

        let mut auth = Auth::builder(self.tokens.access_token_ttl, self.tokens.refresh_token_ttl)
            .session(data.session)
            .build()?;

        auth.logout().map_err(|err| {
            warn!(error = %err, "failed to logout");
            err
        })?;

        self.repo.save(&mut auth).await.map_err(|err| {
            error!(error = %err, "error saving data to storage");
            err
        })?;

        info!("user logged out successfully");

        Ok(())
    }
}
