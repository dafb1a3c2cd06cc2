use thiserror::Error;
use tonic::Status;

pub type Result<T> = std::result::Result<T, SsoError>;

#[derive(Debug, Error)]
pub enum SsoError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("client not found")]
    ClientNotFound,

    #[error("session not found")]
    SessionNotFound,

    #[error("invalid session")]
    InvalidSession,

    #[error("refresh token expired")]
    RefreshTokenExpired,

    #[error("error generating password hash")]
    GeneratePasswordHash,

    #[error("error creating tokens")]
    CreateTokens(#[source] jwt_core::CreateError),

    #[error("error creating session")]
    CreateSession(#[source] Box<SsoError>),

    #[error("error parsing refresh token")]
    ParseRefreshToken(#[from] jwt_core::ParseError),

    #[error("entity not found")]
    EntityNotFound,

    #[error("entity already exists")]
    EntityExists,

    #[error("a non-zero identifier is required to update an entity")]
    RequireIdToUpdate,

    #[error("a non-zero identifier is required to remove an entity")]
    RequireIdToRemove,

    #[error("error publishing event: {0}")]
    PublishEvent(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SsoError {
    /// Convert to a gRPC status for the wire.
    ///
    /// Unknown user and wrong password are both reported as "invalid username
    /// or password" to prevent username enumeration. Everything outside the
    /// caller-addressable kinds collapses into `Internal` with the given
    /// per-operation message; internal detail never leaks.
    pub fn to_status(&self, internal_message: &str) -> Status {
        match self {
            SsoError::InvalidCredentials => {
                Status::invalid_argument("invalid username or password")
            }
            SsoError::UserExists => {
                Status::invalid_argument("user with this username already exists")
            }
            SsoError::UserNotFound => Status::not_found("user not found"),
            _ => Status::internal(internal_message.to_string()),
        }
    }
}
