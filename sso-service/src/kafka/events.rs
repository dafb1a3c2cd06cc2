use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{Gender, User};
use crate::error::{Result, SsoError};
use crate::kafka::EventMessage;

pub const REGISTER_EVENT: &str = "register";

const TOPIC_SEPARATOR: char = '-';

/// Events are published per client: `{client_code}-{event_name}`.
pub fn topic_name(client_code: &str, event: &str) -> String {
    format!("{client_code}{TOPIC_SEPARATOR}{event}")
}

/// Registration event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub full_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<i16>,
    pub avatar_file_key: Option<String>,
}

impl From<&User> for RegisteredUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            date_of_birth: user.date_of_birth,
            gender: user.gender.map(Gender::as_i16),
            avatar_file_key: user.avatar_file_key.clone(),
        }
    }
}

/// Publisher of registration events onto the fan-out input channel.
///
/// Enqueueing is all that is awaited; broker delivery happens asynchronously
/// and registration success does not imply the event was delivered.
#[derive(Clone)]
pub struct RegistrationEvents {
    input: mpsc::Sender<EventMessage>,
}

impl RegistrationEvents {
    pub fn new(input: mpsc::Sender<EventMessage>) -> Self {
        Self { input }
    }

    pub async fn publish(&self, client_code: &str, user: &User) -> Result<()> {
        let payload = serde_json::to_vec(&RegisteredUser::from(user))
            .map_err(|err| SsoError::PublishEvent(err.to_string()))?;

        let message = EventMessage {
            topic: topic_name(client_code, REGISTER_EVENT),
            key: None,
            value: payload,
        };

        self.input
            .send(message)
            .await
            .map_err(|_| SsoError::PublishEvent("event channel is closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_name_joins_client_code_and_event() {
        assert_eq!(topic_name("web", REGISTER_EVENT), "web-register");
    }

    #[test]
    fn payload_keeps_absent_fields_as_nulls() {
        let user = User {
            id: 7,
            full_name: "test user".to_string(),
            ..User::default()
        };

        let payload = serde_json::to_value(RegisteredUser::from(&user)).unwrap();
        assert_eq!(payload["id"], 7);
        assert_eq!(payload["full_name"], "test user");
        assert!(payload["date_of_birth"].is_null());
        assert!(payload["gender"].is_null());
        assert!(payload["avatar_file_key"].is_null());
    }

    #[tokio::test]
    async fn publish_enqueues_onto_the_right_topic() {
        let (tx, mut rx) = mpsc::channel(1);
        let events = RegistrationEvents::new(tx);

        let user = User { id: 1, full_name: "n".to_string(), ..User::default() };
        events.publish("web", &user).await.unwrap();

        let message = rx.recv().await.unwrap();
        assert_eq!(message.topic, "web-register");

        let decoded: RegisteredUser = serde_json::from_slice(&message.value).unwrap();
        assert_eq!(decoded.id, 1);
    }

    #[tokio::test]
    async fn publish_fails_once_the_channel_is_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let events = RegistrationEvents::new(tx);
        let user = User::default();

        assert!(matches!(
            events.publish("web", &user).await,
            Err(SsoError::PublishEvent(_))
        ));
    }
}
