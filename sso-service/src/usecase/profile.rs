use tracing::{error, warn};

use crate::dto;
use crate::error::{Result, SsoError};
use crate::repo::ProfileRepository;

/// Reads a user's profile card.
#[derive(Clone)]
pub struct Profile {
    repo: ProfileRepository,
}

impl Profile {
    pub fn new(repo: ProfileRepository) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: i64) -> Result<dto::UserProfile> {
        self.repo.user_profile(user_id).await.map_err(|err| match err {
            SsoError::EntityNotFound => {
                warn!(user_id, "user not found");
                SsoError::UserNotFound
            }
            err => {
                error!(error = %err, "error getting user profile data");
                err
            }
        })
    }
}
