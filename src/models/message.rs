use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserSummary;

/// A persisted, immutable message. `is_read` is the only mutable attribute
/// and moves false -> true only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    /// Derived: sender profile, populated by joins or enrichment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserSummary>,
}
