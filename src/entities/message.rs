use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_input_error, Error};

const MAX_CONTENT_LENGTH: usize = 4000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Message {
    pub fn new(
        ride_id: Uuid,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: String,
    ) -> Result<Self, Error> {
        let content = content.trim().to_string();

        if content.is_empty() || content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(invalid_input_error());
        }

        if sender_id == recipient_id {
            return Err(invalid_input_error());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            ride_id,
            sender_id,
            recipient_id,
            content,
            created_at: Utc::now(),
            read: false,
        })
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.recipient_id == user_id
    }
}

#[test]
fn message_validation_test() {
    let ride_id = Uuid::new_v4();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let message = Message::new(ride_id, a, b, " Bonjour ".into()).unwrap();
    assert_eq!(message.content, "Bonjour");
    assert!(!message.read);
    assert!(message.involves(a));
    assert!(message.involves(b));
    assert!(!message.involves(Uuid::new_v4()));

    assert!(Message::new(ride_id, a, b, "   ".into()).is_err());
    assert!(Message::new(ride_id, a, a, "hello".into()).is_err());
    assert!(Message::new(ride_id, a, b, "x".repeat(MAX_CONTENT_LENGTH + 1)).is_err());
}
