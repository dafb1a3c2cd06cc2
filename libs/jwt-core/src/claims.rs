//! Claim sets for the tokens this platform issues.

use serde::{Deserialize, Deserializer, Serialize};

/// Registered claims of an access token plus the `scope` claim every access
/// token of this platform carries.
///
/// All fields are optional on the wire; absent claims deserialize to their
/// empty value and are skipped on serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,
    #[serde(default, skip_serializing_if = "Audience::is_empty")]
    pub aud: Audience,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Space-separated permission codes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
}

/// Claims of a refresh token. The `jti` doubles as the persisted session
/// handle; nothing else is carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// The `aud` claim. RFC 7519 allows a single string or an array of strings;
/// this type accepts both and always serializes as an array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Audience(pub Vec<String>);

impl Audience {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, audience: &str) -> bool {
        self.0.iter().any(|a| a == audience)
    }
}

impl From<Vec<String>> for Audience {
    fn from(audiences: Vec<String>) -> Self {
        Self(audiences)
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::One(audience) => Audience(vec![audience]),
            Repr::Many(audiences) => Audience(audiences),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_deserializes_from_string_and_array() {
        let one: Audience = serde_json::from_str(r#""api""#).unwrap();
        assert_eq!(one, Audience(vec!["api".to_string()]));

        let many: Audience = serde_json::from_str(r#"["api", "web"]"#).unwrap();
        assert_eq!(many.0, vec!["api", "web"]);
    }

    #[test]
    fn audience_serializes_as_array() {
        let aud = Audience(vec!["api".to_string()]);
        assert_eq!(serde_json::to_string(&aud).unwrap(), r#"["api"]"#);
    }

    #[test]
    fn absent_claims_deserialize_to_empty_values() {
        let claims: AccessTokenClaims = serde_json::from_str("{}").unwrap();
        assert!(claims.jti.is_empty());
        assert!(claims.aud.is_empty());
        assert!(claims.exp.is_none());
    }
}
