use chrono::{DateTime, Utc};

use crate::domain::{CreateTokensParams, DataStatus, Tokens};
use crate::dto;
use crate::error::{Result, SsoError};

/// Refresh-token-backed login. `(user_id, refresh_token_id)` identifies the
/// session; the refresh token id equals the token's `jti`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub refresh_token_id: String,
    pub user_agent: String,
    pub fingerprint: String,
    pub expires_at: DateTime<Utc>,

    /// Token pair of a freshly created session; empty for loaded sessions.
    pub tokens: Tokens,

    status: DataStatus,
}

impl Session {
    pub(crate) fn from_dto(session: dto::Session) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            refresh_token_id: session.refresh_token_id,
            user_agent: session.user_agent,
            fingerprint: session.fingerprint,
            expires_at: session.expires_at,
            tokens: Tokens::default(),
            status: DataStatus::None,
        }
    }

    /// Builds a new session with a freshly issued token pair. The session
    /// inherits the refresh token's `jti` and expires with it.
    pub(crate) fn issue(
        user_agent: &str,
        fingerprint: &str,
        params: &CreateTokensParams,
    ) -> Result<Self> {
        let tokens = Tokens::issue(params)?;

        Ok(Self {
            id: 0,
            user_id: params.user_id,
            refresh_token_id: tokens.refresh_token_id.clone(),
            user_agent: user_agent.to_string(),
            fingerprint: fingerprint.to_string(),
            expires_at: Utc::now() + params.refresh_token_ttl,
            tokens,
            status: DataStatus::None,
        })
    }

    /// Checks that the session is alive and bound to the presenting device.
    pub fn validate(&self, user_agent: &str, fingerprint: &str) -> Result<()> {
        if self.expires_at < Utc::now() {
            return Err(SsoError::RefreshTokenExpired);
        }

        if self.user_agent != user_agent || self.fingerprint != fingerprint {
            return Err(SsoError::InvalidSession);
        }

        Ok(())
    }

    pub fn status(&self) -> DataStatus {
        self.status
    }

    pub fn set_to_create(&mut self) {
        self.status = DataStatus::ToCreate;
    }

    pub fn set_to_update(&mut self) {
        self.status = DataStatus::ToUpdate;
    }

    pub fn set_to_remove(&mut self) {
        self.status = DataStatus::ToRemove;
    }

    pub fn reset_status(&mut self) {
        self.status = DataStatus::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session() -> Session {
        Session::from_dto(dto::Session {
            id: 1,
            user_id: 1,
            refresh_token_id: "6424f67d-61c3-4251-b193-f2da172f9e01".to_string(),
            user_agent: "ua".to_string(),
            fingerprint: "fp".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        })
    }

    #[test]
    fn validate_accepts_the_binding_device() {
        assert!(session().validate("ua", "fp").is_ok());
    }

    #[test]
    fn validate_rejects_an_expired_session() {
        let mut session = session();
        session.expires_at = Utc::now() - Duration::hours(1);
        assert!(matches!(
            session.validate("ua", "fp"),
            Err(SsoError::RefreshTokenExpired)
        ));
    }

    #[test]
    fn validate_rejects_a_foreign_device() {
        assert!(matches!(
            session().validate("other", "fp"),
            Err(SsoError::InvalidSession)
        ));
        assert!(matches!(
            session().validate("ua", "other"),
            Err(SsoError::InvalidSession)
        ));
    }
}
