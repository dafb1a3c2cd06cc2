//! Refresh token parsing.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::RefreshTokenClaims;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("error parsing token")]
    ParseToken(#[source] jsonwebtoken::errors::Error),

    #[error("error getting token claims")]
    ParseTokenClaims(#[source] jsonwebtoken::errors::Error),
}

/// Deserializes a refresh token and verifies its HS256 signature.
///
/// Expiry is not checked here: the session row is the authority on refresh
/// lifetime and the aggregate validates it against the clock.
pub fn parse_refresh_token(token: &str, key: &[u8]) -> Result<RefreshTokenClaims, ParseError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<RefreshTokenClaims>(token, &DecodingKey::from_secret(key), &validation)
        .map_err(|err| match err.kind() {
            ErrorKind::Json(_) => ParseError::ParseTokenClaims(err),
            _ => ParseError::ParseToken(err),
        })?;

    Ok(data.claims)
}
