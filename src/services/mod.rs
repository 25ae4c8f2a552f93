pub mod conversation_service;
pub mod message_service;
pub mod user_service;

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Every store operation is bounded by this request-scoped deadline.
/// Exceeding it fails the single operation, never the connection.
pub const STORE_OP_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) async fn with_timeout<T, F>(fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(STORE_OP_TIMEOUT, fut)
        .await
        .map_err(|_| AppError::PersistenceTimeout)?
}
