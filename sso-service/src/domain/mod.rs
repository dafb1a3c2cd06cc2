//! The authentication domain.
//!
//! The [`Auth`] aggregate is rebuilt per request from storage snapshots,
//! applies its transition in memory, and leaves behind status-tagged entities
//! for the repository's save pass. Transitions never touch storage.

mod auth;
mod session;
mod tokens;
mod user;

pub use auth::{Auth, AuthBuilder, LoginParams, RefreshTokensParams, RegisterParams,
    MAX_ACTIVE_SESSIONS};
pub use session::Session;
pub use tokens::{CreateTokensParams, Tokens};
pub use user::User;

/// Transient persistence marker. The aggregate tags entities; the repository
/// dispatches on the tag when saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataStatus {
    #[default]
    None,
    ToCreate,
    ToUpdate,
    ToRemove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male = 1,
    Female = 2,
}

impl Gender {
    pub fn from_i16(value: i16) -> Option<Gender> {
        match value {
            1 => Some(Gender::Male),
            2 => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_i16(self) -> i16 {
        self as i16
    }
}
