use chrono::Duration;
use serde_json::Map;

use crate::error::{Result, SsoError};

/// Token pair handed back to the caller. Only `refresh_token_id` is ever
/// persisted (as the session key); the token strings themselves are not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_token_id: String,
}

/// Data for creating a new session's token pair.
#[derive(Debug, Clone)]
pub struct CreateTokensParams {
    pub user_id: i64,
    pub permissions: Vec<String>,
    pub audiences: Vec<String>,
    pub secret_key: String,
    pub issuer: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl Tokens {
    /// Issues an access + refresh token pair signed with the client secret.
    pub fn issue(params: &CreateTokensParams) -> Result<Tokens> {
        let access_token = jwt_core::new_access_token(&jwt_core::AccessTokenParams {
            subject: params.user_id.to_string(),
            audiences: params.audiences.clone(),
            scopes: params.permissions.clone(),
            issuer: params.issuer.clone(),
            custom_claims: Map::new(),
            ttl: params.access_token_ttl,
            key: params.secret_key.as_bytes().to_vec(),
        })
        .map_err(SsoError::CreateTokens)?;

        let (refresh_token, refresh_token_id) =
            jwt_core::new_refresh_token(params.secret_key.as_bytes(), params.refresh_token_ttl)
                .map_err(SsoError::CreateTokens)?;

        Ok(Tokens { access_token, refresh_token, refresh_token_id })
    }
}
