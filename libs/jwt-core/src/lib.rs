//! Shared JWT toolkit for the SSO platform.
//!
//! All tokens are HS256, signed with the owning client's secret key:
//! - [`creator`] issues access tokens (registered claims + `scope` + arbitrary
//!   custom claims) and refresh tokens (`jti` + `exp` only),
//! - [`parser`] deserializes and signature-checks refresh tokens,
//! - [`validator`] validates access tokens on protected endpoints against an
//!   expected issuer, audience set, time bounds and optional custom claims.
//!
//! HS256 is the only accepted algorithm end to end; tokens carrying any other
//! `alg` header are rejected before key material is touched.

pub mod claims;
pub mod creator;
pub mod parser;
pub mod validator;

pub use claims::{AccessTokenClaims, Audience, RefreshTokenClaims};
pub use creator::{new_access_token, new_refresh_token, AccessTokenParams, CreateError};
pub use parser::{parse_refresh_token, ParseError};
pub use validator::{
    CustomClaims, KeyProvider, NoCustomClaims, StaticKey, ValidatedClaims, Validator,
    ValidatorError,
};

/// Boxed error type carried by the async ports ([`KeyProvider`],
/// [`CustomClaims`]).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
