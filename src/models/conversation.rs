use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Message;
use super::UserSummary;

/// A durable two-party channel. Exactly two distinct participants are bound
/// at creation; this service never deletes conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub participants: Vec<UserSummary>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }
}

/// One entry in a user's conversation list: the counterpart, the most recent
/// message (if any), and the unread tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationPreview {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub other_user: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
    pub unread: i64,
}
