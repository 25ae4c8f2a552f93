use sqlx::{Pool, Postgres, Row};

use crate::error::{AppError, AppResult};
use crate::models::User;

use super::with_timeout;

pub struct UserService;

impl UserService {
    /// Active user by id, for sender enrichment and participant validation.
    pub async fn get_by_id(db: &Pool<Postgres>, id: i64) -> AppResult<User> {
        with_timeout(async {
            let row = sqlx::query(
                "SELECT id, username, email, created_at \
                 FROM users WHERE id = $1 AND is_active = true",
            )
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("user"))?;

            Ok(User {
                id: row.get("id"),
                username: row.get("username"),
                email: row.get("email"),
                created_at: row.get("created_at"),
            })
        })
        .await
    }
}
