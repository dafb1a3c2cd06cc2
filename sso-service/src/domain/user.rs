use chrono::{DateTime, Utc};

use crate::domain::{DataStatus, Gender};
use crate::dto;

/// Identity record held by the aggregate.
#[derive(Debug, Clone, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub avatar_file_key: Option<String>,
    pub roles: Vec<dto::Role>,
    pub permissions: Vec<String>,

    pub(crate) status: DataStatus,
}

impl User {
    pub(crate) fn from_dto(user: dto::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password_hash: user.password_hash,
            full_name: user.full_name,
            date_of_birth: user.date_of_birth,
            gender: user.gender,
            avatar_file_key: user.avatar_file_key,
            roles: user.roles,
            permissions: dedup(user.permissions),
            status: DataStatus::None,
        }
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

/// Removes duplicate permission codes, keeping first occurrences in order.
pub(crate) fn dedup(mut permissions: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    permissions.retain(|code| seen.insert(code.clone()));
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_are_deduplicated_in_order() {
        let user = User::from_dto(dto::User {
            id: 1,
            permissions: vec![
                "a.read".to_string(),
                "b.read".to_string(),
                "a.read".to_string(),
            ],
            ..Default::default()
        });
        assert_eq!(user.permissions, vec!["a.read", "b.read"]);
    }

    #[test]
    fn status_transitions() {
        let mut user = User::default();
        assert_eq!(user.status(), DataStatus::None);

        user.set_to_create();
        assert_eq!(user.status(), DataStatus::ToCreate);

        user.reset_status();
        assert_eq!(user.status(), DataStatus::None);
    }
}
