use chrono::{DateTime, Duration, Utc};

use crate::domain::user::dedup;
use crate::domain::{CreateTokensParams, Gender, Session, Tokens, User};
use crate::dto;
use crate::error::{Result, SsoError};

/// Hard cap on live sessions per user. A login finding the cap reached marks
/// every existing session for removal before creating the new one.
pub const MAX_ACTIVE_SESSIONS: usize = 5;

/// bcrypt cannot digest more than 72 bytes of password material.
const MAX_PASSWORD_BYTES: usize = 72;

/// Data for logging in a user.
#[derive(Debug, Clone)]
pub struct LoginParams {
    pub password: String,
    pub user_agent: String,
    pub fingerprint: String,
    pub issuer: String,
}

/// Data for registering a user.
#[derive(Debug, Clone)]
pub struct RegisterParams {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub avatar_file_key: Option<String>,
    pub user_agent: String,
    pub fingerprint: String,
    pub issuer: String,
}

/// Data for refreshing a user's tokens.
#[derive(Debug, Clone)]
pub struct RefreshTokensParams {
    pub user_agent: String,
    pub fingerprint: String,
    pub issuer: String,
}

/// The authentication aggregate: one user, one client, the user's sessions.
///
/// Rebuilt from storage snapshots per request via [`Auth::builder`]; never
/// persisted itself. Transitions are pure: they mutate in-memory entities and
/// tag them with a data status for the repository's save pass.
#[derive(Debug)]
pub struct Auth {
    pub(crate) user: User,
    pub(crate) client: dto::Client,
    pub(crate) sessions: Vec<Session>,

    default_roles: Vec<dto::Role>,
    default_permission_codes: Vec<String>,

    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl Auth {
    pub fn builder(access_token_ttl: Duration, refresh_token_ttl: Duration) -> AuthBuilder {
        AuthBuilder {
            access_token_ttl,
            refresh_token_ttl,
            user: User::default(),
            client: dto::Client::default(),
            sessions: Vec::new(),
            default_roles: Vec::new(),
            default_permission_codes: Vec::new(),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn client_code(&self) -> &str {
        &self.client.code
    }

    /// Checks the credentials and opens a new session.
    ///
    /// An absent user and a failed password check are indistinguishable to the
    /// caller; both are invalid credentials.
    pub fn login(&mut self, params: &LoginParams) -> Result<Tokens> {
        if self.user.id == 0 {
            return Err(SsoError::InvalidCredentials);
        }

        let password_matches = bcrypt::verify(&params.password, &self.user.password_hash)
            .map_err(|_| SsoError::InvalidCredentials)?;
        if !password_matches {
            return Err(SsoError::InvalidCredentials);
        }

        if self.sessions.len() >= MAX_ACTIVE_SESSIONS {
            for session in &mut self.sessions {
                session.set_to_remove();
            }
        }

        self.create_new_session(&params.issuer, &params.user_agent, &params.fingerprint)
    }

    /// Installs a new user tagged for creation.
    ///
    /// No session is opened here: storage has to assign the user id first, so
    /// the orchestrator calls [`Auth::create_new_session`] after the user is
    /// persisted.
    pub fn register(&mut self, params: &RegisterParams) -> Result<()> {
        if self.user.id > 0 {
            return Err(SsoError::UserExists);
        }

        if params.password.len() > MAX_PASSWORD_BYTES {
            return Err(SsoError::GeneratePasswordHash);
        }
        let password_hash = bcrypt::hash(&params.password, bcrypt::DEFAULT_COST)
            .map_err(|_| SsoError::GeneratePasswordHash)?;

        let mut user = User {
            id: 0,
            username: params.username.clone(),
            password_hash,
            full_name: params.full_name.clone(),
            date_of_birth: params.date_of_birth,
            gender: params.gender,
            avatar_file_key: params.avatar_file_key.clone(),
            roles: self.default_roles.clone(),
            permissions: dedup(self.default_permission_codes.clone()),
            ..User::default()
        };
        user.set_to_create();
        self.user = user;

        Ok(())
    }

    /// Rotates the user's sessions: every held session is validated against
    /// the presenting device, marked for removal, and replaced by a new one.
    pub fn refresh_tokens(&mut self, params: &RefreshTokensParams) -> Result<Tokens> {
        for session in &self.sessions {
            session.validate(&params.user_agent, &params.fingerprint)?;
        }

        for session in &mut self.sessions {
            session.set_to_remove();
        }

        self.create_new_session(&params.issuer, &params.user_agent, &params.fingerprint)
    }

    /// Marks every held session for removal.
    pub fn logout(&mut self) -> Result<()> {
        if self.sessions.is_empty() {
            return Err(SsoError::SessionNotFound);
        }

        for session in &mut self.sessions {
            session.set_to_remove();
        }

        Ok(())
    }

    /// Issues a token pair for the aggregate's user and appends a session
    /// tagged for creation. Tokens fall to the client's audiences, or to the
    /// client code when no audiences are configured.
    pub fn create_new_session(
        &mut self,
        issuer: &str,
        user_agent: &str,
        fingerprint: &str,
    ) -> Result<Tokens> {
        let audiences = if self.client.audiences.is_empty() {
            vec![self.client.code.clone()]
        } else {
            self.client.audiences.clone()
        };

        let create_tokens_params = CreateTokensParams {
            user_id: self.user.id,
            permissions: self.user.permissions.clone(),
            audiences,
            secret_key: self.client.secret_key.clone(),
            issuer: issuer.to_string(),
            access_token_ttl: self.access_token_ttl,
            refresh_token_ttl: self.refresh_token_ttl,
        };

        let mut session = Session::issue(user_agent, fingerprint, &create_tokens_params)
            .map_err(|err| SsoError::CreateSession(Box::new(err)))?;
        session.set_to_create();

        let tokens = session.tokens.clone();
        self.sessions.push(session);

        Ok(tokens)
    }
}

/// Step-wise construction of the aggregate from storage DTOs. Setters given a
/// zero-id record are no-ops (absence is a zero id, not a null).
#[derive(Debug)]
pub struct AuthBuilder {
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    user: User,
    client: dto::Client,
    sessions: Vec<Session>,
    default_roles: Vec<dto::Role>,
    default_permission_codes: Vec<String>,
}

impl AuthBuilder {
    pub fn user(mut self, user: dto::User) -> Self {
        if user.id != 0 {
            self.user = User::from_dto(user);
        }
        self
    }

    pub fn client(mut self, client: dto::Client) -> Self {
        if client.id != 0 {
            self.client = client;
        }
        self
    }

    pub fn session(mut self, session: dto::Session) -> Self {
        if session.id != 0 {
            self.sessions.push(Session::from_dto(session));
        }
        self
    }

    pub fn sessions(mut self, sessions: Vec<dto::Session>) -> Self {
        for session in sessions {
            self = self.session(session);
        }
        self
    }

    pub fn default_roles(mut self, roles: Vec<dto::Role>) -> Self {
        self.default_roles = roles;
        self
    }

    pub fn default_permission_codes(mut self, permissions: Vec<String>) -> Self {
        self.default_permission_codes = permissions;
        self
    }

    pub fn build(self) -> Result<Auth> {
        Ok(Auth {
            user: self.user,
            client: self.client,
            sessions: self.sessions,
            default_roles: self.default_roles,
            default_permission_codes: self.default_permission_codes,
            access_token_ttl: self.access_token_ttl,
            refresh_token_ttl: self.refresh_token_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataStatus, Gender};

    const USER_ID: i64 = 1;
    const SESSION_ID: i64 = 1;
    const CLIENT_ID: i64 = 1;
    const REFRESH_TOKEN_ID: &str = "6424f67d-61c3-4251-b193-f2da172f9e01";
    const USER_AGENT: &str = "test user agent";
    const FINGERPRINT: &str = "test fingerprint";
    const ISSUER: &str = "test issuer";
    const SECRET_KEY: &str = "98649a5c-2137-4a78-a63f-fbab416a7f9e";

    const VALID_PASSWORD: &str = "123456";
    // bcrypt hash of "123456" at cost 10.
    const PASSWORD_HASH: &str = "$2a$10$MzZyhvwQgTriuJ3pPH0z.exkmUxk2gwV1vFHlQvd9457n27gGR4NO";

    fn user() -> dto::User {
        dto::User {
            id: USER_ID,
            password_hash: PASSWORD_HASH.to_string(),
            permissions: vec!["profile.read".to_string()],
            ..Default::default()
        }
    }

    fn client() -> dto::Client {
        dto::Client {
            id: CLIENT_ID,
            code: "web".to_string(),
            secret_key: SECRET_KEY.to_string(),
            ..Default::default()
        }
    }

    fn stored_session(id: i64) -> dto::Session {
        dto::Session {
            id,
            user_id: USER_ID,
            refresh_token_id: REFRESH_TOKEN_ID.to_string(),
            user_agent: USER_AGENT.to_string(),
            fingerprint: FINGERPRINT.to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    fn login_params() -> LoginParams {
        LoginParams {
            password: VALID_PASSWORD.to_string(),
            user_agent: USER_AGENT.to_string(),
            fingerprint: FINGERPRINT.to_string(),
            issuer: ISSUER.to_string(),
        }
    }

    fn register_params() -> RegisterParams {
        RegisterParams {
            username: "test@mail.com".to_string(),
            password: VALID_PASSWORD.to_string(),
            full_name: "test user".to_string(),
            date_of_birth: Some(Utc::now() - Duration::days(10_000)),
            gender: Some(Gender::Male),
            avatar_file_key: Some("test avatar file key".to_string()),
            user_agent: USER_AGENT.to_string(),
            fingerprint: FINGERPRINT.to_string(),
            issuer: ISSUER.to_string(),
        }
    }

    fn builder() -> AuthBuilder {
        Auth::builder(Duration::minutes(1), Duration::minutes(1))
    }

    #[test]
    fn login_succeeds_and_tags_a_new_session() {
        let mut auth = builder().user(user()).client(client()).build().unwrap();

        let tokens = auth.login(&login_params()).unwrap();

        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());
        assert!(!tokens.refresh_token_id.is_empty());

        assert_eq!(auth.sessions().len(), 1);
        assert_eq!(auth.sessions()[0].status(), DataStatus::ToCreate);
        assert_eq!(auth.sessions()[0].refresh_token_id, tokens.refresh_token_id);
    }

    #[test]
    fn login_fails_when_the_user_is_absent() {
        let mut auth = builder().client(client()).build().unwrap();

        assert!(matches!(
            auth.login(&login_params()),
            Err(SsoError::InvalidCredentials)
        ));
        assert!(auth.sessions().is_empty());
    }

    #[test]
    fn login_fails_with_a_wrong_password() {
        let mut auth = builder().user(user()).client(client()).build().unwrap();

        let mut params = login_params();
        params.password = "1".to_string();

        assert!(matches!(auth.login(&params), Err(SsoError::InvalidCredentials)));
        assert!(auth.sessions().is_empty());
    }

    #[test]
    fn login_fails_when_the_client_is_absent() {
        let mut auth = builder().user(user()).build().unwrap();

        assert!(matches!(
            auth.login(&login_params()),
            Err(SsoError::CreateSession(_))
        ));
    }

    #[test]
    fn login_at_the_session_cap_purges_every_existing_session() {
        let sessions: Vec<_> = (1..=MAX_ACTIVE_SESSIONS as i64).map(stored_session).collect();
        let mut auth = builder()
            .user(user())
            .client(client())
            .sessions(sessions)
            .build()
            .unwrap();

        auth.login(&login_params()).unwrap();

        assert_eq!(auth.sessions().len(), MAX_ACTIVE_SESSIONS + 1);
        for session in &auth.sessions()[..MAX_ACTIVE_SESSIONS] {
            assert_eq!(session.status(), DataStatus::ToRemove);
        }
        assert_eq!(auth.sessions()[MAX_ACTIVE_SESSIONS].status(), DataStatus::ToCreate);
    }

    #[test]
    fn login_below_the_session_cap_keeps_existing_sessions() {
        let mut auth = builder()
            .user(user())
            .client(client())
            .session(stored_session(SESSION_ID))
            .build()
            .unwrap();

        auth.login(&login_params()).unwrap();

        assert_eq!(auth.sessions()[0].status(), DataStatus::None);
        assert_eq!(auth.sessions()[1].status(), DataStatus::ToCreate);
    }

    #[test]
    fn register_installs_a_user_tagged_for_creation() {
        let mut auth = builder()
            .client(client())
            .default_roles(vec![dto::Role { id: 7, code: "member".to_string() }])
            .default_permission_codes(vec![
                "profile.read".to_string(),
                "profile.read".to_string(),
                "profile.write".to_string(),
            ])
            .build()
            .unwrap();

        let params = register_params();
        auth.register(&params).unwrap();

        let user = auth.user();
        assert_eq!(user.id, 0);
        assert_eq!(user.username, params.username);
        assert_eq!(user.full_name, params.full_name);
        assert_eq!(user.date_of_birth, params.date_of_birth);
        assert_eq!(user.gender, params.gender);
        assert_eq!(user.avatar_file_key, params.avatar_file_key);
        assert_eq!(user.status(), DataStatus::ToCreate);

        assert_eq!(user.roles.len(), 1);
        assert_eq!(user.permissions, vec!["profile.read", "profile.write"]);

        assert!(bcrypt::verify(VALID_PASSWORD, &user.password_hash).unwrap());
        assert!(auth.sessions().is_empty());
    }

    #[test]
    fn register_fails_when_the_username_is_taken() {
        let mut auth = builder().user(user()).client(client()).build().unwrap();

        assert!(matches!(
            auth.register(&register_params()),
            Err(SsoError::UserExists)
        ));
    }

    #[test]
    fn register_rejects_an_oversize_password() {
        let mut auth = builder().client(client()).build().unwrap();

        let mut params = register_params();
        params.password = "x".repeat(73);

        assert!(matches!(
            auth.register(&params),
            Err(SsoError::GeneratePasswordHash)
        ));
    }

    #[test]
    fn refresh_rotates_the_session() {
        let mut auth = builder()
            .user(user())
            .client(client())
            .session(stored_session(SESSION_ID))
            .build()
            .unwrap();

        let tokens = auth
            .refresh_tokens(&RefreshTokensParams {
                user_agent: USER_AGENT.to_string(),
                fingerprint: FINGERPRINT.to_string(),
                issuer: ISSUER.to_string(),
            })
            .unwrap();

        assert!(!tokens.refresh_token.is_empty());
        assert_eq!(auth.sessions().len(), 2);

        let old = auth.sessions().iter().find(|s| s.id == SESSION_ID).unwrap();
        let new = auth.sessions().iter().find(|s| s.id != SESSION_ID).unwrap();
        assert_eq!(old.status(), DataStatus::ToRemove);
        assert_eq!(new.status(), DataStatus::ToCreate);
        assert_ne!(new.refresh_token_id, old.refresh_token_id);
    }

    #[test]
    fn refresh_fails_on_an_expired_session() {
        let mut session = stored_session(SESSION_ID);
        session.expires_at = Utc::now() - Duration::hours(1);

        let mut auth = builder()
            .user(user())
            .client(client())
            .session(session)
            .build()
            .unwrap();

        assert!(matches!(
            auth.refresh_tokens(&RefreshTokensParams {
                user_agent: USER_AGENT.to_string(),
                fingerprint: FINGERPRINT.to_string(),
                issuer: ISSUER.to_string(),
            }),
            Err(SsoError::RefreshTokenExpired)
        ));
    }

    #[test]
    fn refresh_fails_on_a_foreign_fingerprint() {
        let mut auth = builder()
            .user(user())
            .client(client())
            .session(stored_session(SESSION_ID))
            .build()
            .unwrap();

        assert!(matches!(
            auth.refresh_tokens(&RefreshTokensParams {
                user_agent: USER_AGENT.to_string(),
                fingerprint: "other".to_string(),
                issuer: ISSUER.to_string(),
            }),
            Err(SsoError::InvalidSession)
        ));
    }

    #[test]
    fn logout_marks_every_session_for_removal() {
        let mut auth = builder()
            .session(stored_session(1))
            .session(stored_session(2))
            .build()
            .unwrap();

        auth.logout().unwrap();

        for session in auth.sessions() {
            assert_eq!(session.status(), DataStatus::ToRemove);
        }
    }

    #[test]
    fn logout_fails_without_a_session() {
        let mut auth = builder().build().unwrap();
        assert!(matches!(auth.logout(), Err(SsoError::SessionNotFound)));
    }

    #[test]
    fn builder_ignores_zero_id_records() {
        let auth = builder()
            .user(dto::User::default())
            .client(dto::Client::default())
            .session(dto::Session::default())
            .build()
            .unwrap();

        assert_eq!(auth.user().id, 0);
        assert!(auth.sessions().is_empty());
        assert!(auth.client_code().is_empty());
    }
}
