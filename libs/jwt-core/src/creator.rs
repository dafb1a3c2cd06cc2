//! Token issuance.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::claims::{AccessTokenClaims, Audience, RefreshTokenClaims};
use crate::BoxError;

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("error creating signer: {0}")]
    CreateSigner(String),

    #[error("error serializing token")]
    TokenSerialize(#[source] BoxError),
}

/// Data for a new access token.
#[derive(Debug, Clone)]
pub struct AccessTokenParams {
    /// The `sub` claim (user id as a decimal string).
    pub subject: String,
    pub audiences: Vec<String>,
    /// Permission codes; space-joined into the `scope` claim.
    pub scopes: Vec<String>,
    pub issuer: String,
    /// Extra claims merged into the claim set at signing time. A custom claim
    /// with a registered name overrides the registered value.
    pub custom_claims: Map<String, Value>,
    pub ttl: Duration,
    /// Raw HS256 key material (the owning client's secret key).
    pub key: Vec<u8>,
}

/// Issues a signed access token carrying `jti`, `sub`, `iss`, `aud`, `exp`,
/// `iat`, `nbf`, `scope` and any custom claims.
pub fn new_access_token(params: &AccessTokenParams) -> Result<String, CreateError> {
    let signer = signer(&params.key)?;

    let now = Utc::now();
    let registered = AccessTokenClaims {
        jti: Uuid::new_v4().to_string(),
        sub: params.subject.clone(),
        iss: params.issuer.clone(),
        aud: Audience(params.audiences.clone()),
        exp: Some((now + params.ttl).timestamp()),
        iat: Some(now.timestamp()),
        nbf: Some(now.timestamp()),
        scope: params.scopes.join(" "),
    };

    let mut claims = claim_map(&registered)?;
    for (name, value) in &params.custom_claims {
        claims.insert(name.clone(), value.clone());
    }

    encode(&Header::new(Algorithm::HS256), &claims, &signer)
        .map_err(|err| CreateError::TokenSerialize(err.into()))
}

/// Issues a signed refresh token carrying only `jti` and `exp`; returns the
/// token string together with its `jti`, which is what storage indexes by.
pub fn new_refresh_token(key: &[u8], ttl: Duration) -> Result<(String, String), CreateError> {
    let signer = signer(key)?;

    let id = Uuid::new_v4().to_string();
    let claims = RefreshTokenClaims {
        jti: id.clone(),
        exp: Some((Utc::now() + ttl).timestamp()),
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, &signer)
        .map_err(|err| CreateError::TokenSerialize(err.into()))?;

    Ok((token, id))
}

fn signer(key: &[u8]) -> Result<EncodingKey, CreateError> {
    // HMAC itself would accept an empty key; an absent client secret must
    // fail issuance instead.
    if key.is_empty() {
        return Err(CreateError::CreateSigner("empty key material".to_string()));
    }

    Ok(EncodingKey::from_secret(key))
}

fn claim_map(claims: &AccessTokenClaims) -> Result<Map<String, Value>, CreateError> {
    match serde_json::to_value(claims) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CreateError::TokenSerialize(
            "registered claims did not serialize to an object".into(),
        )),
        Err(err) => Err(CreateError::TokenSerialize(err.into())),
    }
}
