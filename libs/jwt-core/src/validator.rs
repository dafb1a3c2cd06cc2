//! Access token validation for protected endpoints.
//!
//! A [`Validator`] is built from a key provider, the expected issuer and the
//! expected audience set, optionally extended with a custom claim type and an
//! allowed clock skew. Validation order: parse the header, pin the signing
//! algorithm, fetch the key, verify signature + deserialize claims, then check
//! issuer, audience and time bounds, and finally the custom claims.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::claims::AccessTokenClaims;
use crate::BoxError;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("issuer is required")]
    EmptyIssuer,

    #[error("audience is required")]
    EmptyAudience,

    #[error("error parsing token")]
    ParseToken(#[source] jsonwebtoken::errors::Error),

    #[error("unexpected signing method: {0}")]
    InvalidSigningMethod(String),

    #[error("error getting key")]
    GetKey(#[source] BoxError),

    #[error("error deserializing token claims")]
    DeserializeClaims(#[source] jsonwebtoken::errors::Error),

    #[error("token issuer is invalid")]
    InvalidIssuer,

    #[error("token audience is invalid")]
    InvalidAudience,

    #[error("token is expired")]
    TokenExpired,

    #[error("token is not valid yet")]
    TokenNotYetValid,

    #[error("token was issued in the future")]
    TokenIssuedInFuture,

    #[error("custom claims are invalid")]
    CustomClaims(#[source] BoxError),
}

/// Source of the HS256 key material, resolved per validation (the key may live
/// in storage and differ per client).
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn key(&self) -> Result<Vec<u8>, BoxError>;
}

/// [`KeyProvider`] backed by a fixed secret.
pub struct StaticKey(pub Vec<u8>);

#[async_trait]
impl KeyProvider for StaticKey {
    async fn key(&self) -> Result<Vec<u8>, BoxError> {
        Ok(self.0.clone())
    }
}

/// Custom claims deserialized alongside the registered set. Implementations
/// decide what "valid" means for their own claims.
#[async_trait]
pub trait CustomClaims: DeserializeOwned + Send + Sync {
    async fn validate(&self) -> Result<(), BoxError>;
}

/// Custom claim set of a validator that does not expect any.
#[derive(Debug, Default, Deserialize)]
pub struct NoCustomClaims {}

#[async_trait]
impl CustomClaims for NoCustomClaims {
    async fn validate(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Outcome of a successful validation.
#[derive(Debug)]
pub struct ValidatedClaims<C> {
    pub claims: AccessTokenClaims,
    pub custom: C,
}

pub struct Validator<K, C = NoCustomClaims> {
    key_provider: K,
    expected_issuer: String,
    expected_audiences: Vec<String>,
    clock_skew: Duration,
    _custom: PhantomData<C>,
}

impl<K: KeyProvider> Validator<K, NoCustomClaims> {
    pub fn new(
        key_provider: K,
        issuer: impl Into<String>,
        audiences: Vec<String>,
    ) -> Result<Self, ValidatorError> {
        let issuer = issuer.into();
        if issuer.is_empty() {
            return Err(ValidatorError::EmptyIssuer);
        }
        if audiences.is_empty() {
            return Err(ValidatorError::EmptyAudience);
        }

        Ok(Self {
            key_provider,
            expected_issuer: issuer,
            expected_audiences: audiences,
            clock_skew: Duration::zero(),
            _custom: PhantomData,
        })
    }
}

impl<K: KeyProvider, C: CustomClaims> Validator<K, C> {
    /// Swaps in a custom claim type deserialized and validated on every token.
    pub fn with_custom_claims<C2: CustomClaims>(self) -> Validator<K, C2> {
        Validator {
            key_provider: self.key_provider,
            expected_issuer: self.expected_issuer,
            expected_audiences: self.expected_audiences,
            clock_skew: self.clock_skew,
            _custom: PhantomData,
        }
    }

    /// Tolerance applied to `exp`, `nbf` and `iat` checks. Defaults to zero.
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    pub async fn validate_token(&self, token: &str) -> Result<ValidatedClaims<C>, ValidatorError> {
        let header = decode_header(token).map_err(ValidatorError::ParseToken)?;
        if header.alg != Algorithm::HS256 {
            return Err(ValidatorError::InvalidSigningMethod(format!("{:?}", header.alg)));
        }

        let key = self.key_provider.key().await.map_err(ValidatorError::GetKey)?;
        let decoding_key = DecodingKey::from_secret(&key);

        // Claim checks below carry the skew; the library only verifies the
        // signature and shape here.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let registered = decode::<AccessTokenClaims>(token, &decoding_key, &validation)
            .map_err(|err| match err.kind() {
                ErrorKind::Json(_) => ValidatorError::DeserializeClaims(err),
                _ => ValidatorError::ParseToken(err),
            })?
            .claims;

        self.check_registered(&registered)?;

        let custom = decode::<C>(token, &decoding_key, &validation)
            .map_err(|err| match err.kind() {
                ErrorKind::Json(_) => ValidatorError::DeserializeClaims(err),
                _ => ValidatorError::ParseToken(err),
            })?
            .claims;

        custom.validate().await.map_err(ValidatorError::CustomClaims)?;

        Ok(ValidatedClaims { claims: registered, custom })
    }

    fn check_registered(&self, claims: &AccessTokenClaims) -> Result<(), ValidatorError> {
        if claims.iss != self.expected_issuer {
            return Err(ValidatorError::InvalidIssuer);
        }

        if !self.expected_audiences.iter().any(|audience| claims.aud.contains(audience)) {
            return Err(ValidatorError::InvalidAudience);
        }

        let now = Utc::now().timestamp();
        let skew = self.clock_skew.num_seconds();

        if let Some(exp) = claims.exp {
            if exp + skew < now {
                return Err(ValidatorError::TokenExpired);
            }
        }
        if let Some(nbf) = claims.nbf {
            if nbf > now + skew {
                return Err(ValidatorError::TokenNotYetValid);
            }
        }
        if let Some(iat) = claims.iat {
            if iat > now + skew {
                return Err(ValidatorError::TokenIssuedInFuture);
            }
        }

        Ok(())
    }
}
