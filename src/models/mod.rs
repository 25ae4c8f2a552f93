pub mod conversation;
pub mod message;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row from the user directory. Only the public profile fields this
/// service needs; account data (password hash etc.) stays with the auth side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Public sender profile attached to enriched messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}
