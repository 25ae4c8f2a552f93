use sqlx::{Pool, Postgres, Row};

use crate::error::{AppError, AppResult};
use crate::models::message::Message;
use crate::models::UserSummary;

use super::with_timeout;

pub struct MessageService;

impl MessageService {
    /// Persist one message. The sender must be a participant of the
    /// conversation at write time; the insert and the conversation's
    /// activity bump commit together.
    pub async fn create(
        db: &Pool<Postgres>,
        conversation_id: i64,
        sender_id: i64,
        content: &str,
    ) -> AppResult<Message> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("content is required".into()));
        }
        with_timeout(async {
            let mut tx = db.begin().await?;
            let member: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM conversation_participants \
                 WHERE conversation_id = $1 AND user_id = $2",
            )
            .bind(conversation_id)
            .bind(sender_id)
            .fetch_one(&mut *tx)
            .await?;
            if member == 0 {
                return Err(AppError::Forbidden(
                    "sender is not a participant of this conversation".into(),
                ));
            }

            let row = sqlx::query(
                "INSERT INTO messages (conversation_id, sender_id, content) \
                 VALUES ($1, $2, $3) \
                 RETURNING id, created_at",
            )
            .bind(conversation_id)
            .bind(sender_id)
            .bind(content)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("UPDATE conversations SET updated_at = now() WHERE id = $1")
                .bind(conversation_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            Ok(Message {
                id: row.get("id"),
                conversation_id,
                sender_id,
                content: content.to_string(),
                created_at: row.get("created_at"),
                is_read: false,
                sender: None,
            })
        })
        .await
    }

    /// Messages for a conversation, newest first, with sender profiles.
    pub async fn list(
        db: &Pool<Postgres>,
        conversation_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Message>> {
        let limit = if limit <= 0 { 50 } else { limit };
        let offset = offset.max(0);
        with_timeout(async {
            let rows = sqlx::query(
                "SELECT m.id, m.sender_id, m.content, m.created_at, m.is_read, \
                        u.username, u.email \
                 FROM messages m \
                 JOIN users u ON u.id = m.sender_id \
                 WHERE m.conversation_id = $1 \
                 ORDER BY m.created_at DESC \
                 LIMIT $2 OFFSET $3",
            )
            .bind(conversation_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?;

            let messages = rows
                .into_iter()
                .map(|r| {
                    let sender_id: i64 = r.get("sender_id");
                    Message {
                        id: r.get("id"),
                        conversation_id,
                        sender_id,
                        content: r.get("content"),
                        created_at: r.get("created_at"),
                        is_read: r.get("is_read"),
                        sender: Some(UserSummary {
                            id: sender_id,
                            username: r.get("username"),
                            email: r.get("email"),
                        }),
                    }
                })
                .collect();
            Ok(messages)
        })
        .await
    }

    /// Flip every message the counterpart sent to read. false -> true only.
    pub async fn mark_conversation_read(
        db: &Pool<Postgres>,
        conversation_id: i64,
        user_id: i64,
    ) -> AppResult<()> {
        with_timeout(async {
            sqlx::query(
                "UPDATE messages SET is_read = true \
                 WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = false",
            )
            .bind(conversation_id)
            .bind(user_id)
            .execute(db)
            .await?;
            Ok(())
        })
        .await
    }

    /// Total unread messages across all of a user's conversations.
    pub async fn unread_count(db: &Pool<Postgres>, user_id: i64) -> AppResult<i64> {
        with_timeout(async {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) \
                 FROM messages m \
                 JOIN conversation_participants cp \
                   ON cp.conversation_id = m.conversation_id \
                 WHERE cp.user_id = $1 AND m.sender_id <> $1 AND m.is_read = false",
            )
            .bind(user_id)
            .fetch_one(db)
            .await?;
            Ok(count)
        })
        .await
    }
}
