use tracing::{error, info, warn};

use crate::config::TokenSettings;
use crate::domain::{self, Auth, Tokens};
use crate::error::{Result, SsoError};
use crate::repo::AuthRepository;

#[derive(Debug, Clone)]
pub struct RefreshTokensParams {
    pub refresh_token: String,
    pub client_code: String,
    pub user_agent: String,
    pub fingerprint: String,
    pub issuer: String,
}

/// Rotates a session: consumes the presented refresh token and issues a new
/// token pair bound to a fresh session.
#[derive(Clone)]
pub struct RefreshTokens {
    tokens: TokenSettings,
    repo: AuthRepository,
}

impl RefreshTokens {
    pub fn new(tokens: TokenSettings, repo: AuthRepository) -> Self {
        Self { tokens, repo }
    }

    pub async fn execute(&self, params: RefreshTokensParams) -> Result<Tokens> {
        info!(client_code = %params.client_code, "attempting to refresh tokens");

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
            .data_for_refresh_tokens(&claims.jti)
            .await
            .map_err(|err| match err {
                SsoError::EntityNotFound => {
                    warn!("session not found");
                    SsoError::SessionNotFound
                }
                err => {
                    error!(error = %err, "failed to load refresh data");
                    err
                }
            })?;

        let mut auth = Auth::builder(self.tokens.access_token_ttl, self.tokens.refresh_token_ttl)
            .user(data.user)
            .client(client)
            .session(data.session)
            .build()?;

        let tokens = auth
            .refresh_tokens(&domain::RefreshTokensParams {
                user_agent: params.user_agent,
                fingerprint: params.fingerprint,
                issuer: params.issuer,
            })
            .map_err(|err| {
                warn!(error = %err, "failed to refresh tokens");
                err
            })?;

        self.repo.save(&mut auth).await.map_err(|err| {
            error!(error = %err, "error saving data to storage");
            err
        })?;

        info!("tokens refreshed successfully");

        Ok(tokens)
    }
}
