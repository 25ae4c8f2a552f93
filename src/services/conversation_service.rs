use sqlx::{Pool, Postgres, Row};

use crate::error::{AppError, AppResult};
use crate::models::conversation::{Conversation, ConversationPreview};
use crate::models::message::Message;
use crate::models::UserSummary;

use super::with_timeout;

pub struct ConversationService;

impl ConversationService {
    /// Look up the conversation between two users, creating it if none
    /// exists. The pair is unordered; repeated calls return the same row.
    /// Concurrent callers are resolved by the unique canonical-pair index:
    /// the loser of the insert race re-reads the winner's row.
    pub async fn get_or_create(
        db: &Pool<Postgres>,
        user_a: i64,
        user_b: i64,
    ) -> AppResult<Conversation> {
        if user_a == user_b {
            return Err(AppError::BadRequest(
                "cannot create conversation with yourself".into(),
            ));
        }
        let (low, high) = if user_a < user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };
        with_timeout(async {
            let existing: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM conversations WHERE user_low = $1 AND user_high = $2",
            )
            .bind(low)
            .bind(high)
            .fetch_optional(db)
            .await?;

            match existing {
                Some(id) => Self::fetch(db, id).await,
                None => Self::create(db, low, high).await,
            }
        })
        .await
    }

    async fn create(db: &Pool<Postgres>, low: i64, high: i64) -> AppResult<Conversation> {
        let mut tx = db.begin().await?;
        let inserted: Option<i64> = sqlx::query_scalar(
            "INSERT INTO conversations (user_low, user_high) VALUES ($1, $2) \
             ON CONFLICT (user_low, user_high) DO NOTHING \
             RETURNING id",
        )
        .bind(low)
        .bind(high)
        .fetch_optional(&mut *tx)
        .await?;

        let id = match inserted {
            Some(id) => {
                sqlx::query(
                    "INSERT INTO conversation_participants (conversation_id, user_id) \
                     VALUES ($1, $2), ($1, $3)",
                )
                .bind(id)
                .bind(low)
                .bind(high)
                .execute(&mut *tx)
                .await?;
                id
            }
            // Lost the race: another caller created the pair first.
            None => sqlx::query_scalar(
                "SELECT id FROM conversations WHERE user_low = $1 AND user_high = $2",
            )
            .bind(low)
            .bind(high)
            .fetch_one(&mut *tx)
            .await?,
        };
        tx.commit().await?;
        Self::fetch(db, id).await
    }

    /// Conversation by id with its participants. `NotFound` when absent.
    pub async fn get(db: &Pool<Postgres>, id: i64) -> AppResult<Conversation> {
        with_timeout(Self::fetch(db, id)).await
    }

    async fn fetch(db: &Pool<Postgres>, id: i64) -> AppResult<Conversation> {
        let row = sqlx::query(
            "SELECT id, created_at, updated_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("conversation"))?;

        let participants = sqlx::query(
            "SELECT u.id, u.username, u.email \
             FROM users u \
             JOIN conversation_participants cp ON cp.user_id = u.id \
             WHERE cp.conversation_id = $1 AND u.is_active = true \
             ORDER BY u.id",
        )
        .bind(id)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|r| UserSummary {
            id: r.get("id"),
            username: r.get("username"),
            email: r.get("email"),
        })
        .collect();

        Ok(Conversation {
            id: row.get("id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            participants,
        })
    }

    pub async fn is_member(
        db: &Pool<Postgres>,
        conversation_id: i64,
        user_id: i64,
    ) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM conversation_participants \
             WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(count > 0)
    }

    /// All conversations for a user, newest activity first, each with the
    /// counterpart profile, the latest message, and the unread tally.
    pub async fn list_for_user(
        db: &Pool<Postgres>,
        user_id: i64,
    ) -> AppResult<Vec<ConversationPreview>> {
        with_timeout(async {
            let rows = sqlx::query(
                "SELECT c.id, c.created_at, c.updated_at, \
                        u.id AS other_id, u.username AS other_username, u.email AS other_email, \
                        (SELECT COUNT(*) FROM messages m \
                          WHERE m.conversation_id = c.id \
                            AND m.sender_id <> $1 AND m.is_read = false) AS unread, \
                        lm.id AS last_id, lm.sender_id AS last_sender_id, \
                        lm.content AS last_content, lm.created_at AS last_created_at, \
                        lm.is_read AS last_is_read \
                 FROM conversations c \
                 JOIN conversation_participants cp \
                   ON cp.conversation_id = c.id AND cp.user_id = $1 \
                 JOIN conversation_participants cp2 \
                   ON cp2.conversation_id = c.id AND cp2.user_id <> $1 \
                 JOIN users u ON u.id = cp2.user_id AND u.is_active = true \
                 LEFT JOIN LATERAL ( \
                     SELECT id, sender_id, content, created_at, is_read \
                     FROM messages WHERE conversation_id = c.id \
                     ORDER BY created_at DESC LIMIT 1 \
                 ) lm ON true \
                 ORDER BY c.updated_at DESC",
            )
            .bind(user_id)
            .fetch_all(db)
            .await?;

            let previews = rows
                .into_iter()
                .map(|r| {
                    let conversation_id: i64 = r.get("id");
                    let last_message = r
                        .try_get::<Option<i64>, _>("last_id")
                        .ok()
                        .flatten()
                        .map(|last_id| Message {
                            id: last_id,
                            conversation_id,
                            sender_id: r.get("last_sender_id"),
                            content: r.get("last_content"),
                            created_at: r.get("last_created_at"),
                            is_read: r.get("last_is_read"),
                            sender: None,
                        });
                    ConversationPreview {
                        id: conversation_id,
                        created_at: r.get("created_at"),
                        updated_at: r.get("updated_at"),
                        other_user: UserSummary {
                            id: r.get("other_id"),
                            username: r.get("other_username"),
                            email: r.get("other_email"),
                        },
                        last_message,
                        unread: r.get("unread"),
                    }
                })
                .collect();
            Ok(previews)
        })
        .await
    }
}
