use std::sync::Arc;

use crate::db::Storage;
use crate::domain::Gender;
use crate::dto;
use crate::error::Result;

/// Read-only profile projections.
#[derive(Clone)]
pub struct ProfileRepository {
    storage: Arc<dyn Storage>,
}

impl ProfileRepository {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn user_profile(&self, id: i64) -> Result<dto::UserProfile> {
        let user = self.storage.user(id).await?;

        Ok(dto::UserProfile {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            date_of_birth: user.date_of_birth,
            gender: user.gender.and_then(Gender::from_i16),
            avatar_file_key: user.avatar_file_key,
        })
    }
}
