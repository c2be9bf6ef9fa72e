use std::{future::Future, time::Duration};

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::{
    error::{AppError, AppResult},
    migration::Migrator,
};

/// Create a SeaORM connection.
///
/// In-memory SQLite keeps one database per connection, so the pool is capped
/// at a single connection there.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);
    if database_url.starts_with("sqlite") && database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Apply every pending schema migration.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    Migrator::up(conn, None).await?;
    Ok(())
}

/// Re-run a whole transactional unit while the database keeps reporting
/// conflicts. Any other outcome, success or failure, is returned as is.
pub async fn retry_on_conflict<T, F, Fut>(
    max_attempts: u32,
    operation: &'static str,
    mut unit: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match unit().await {
            Err(AppError::ConcurrencyConflict) if attempt < max_attempts => {
                tracing::warn!(operation, attempt, "transaction conflict, retrying");
                tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                attempt += 1;
            }
            Err(AppError::ConcurrencyConflict) => {
                tracing::warn!(operation, attempt, "transaction conflict, giving up");
                return Err(AppError::ConcurrencyConflict);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn retries_until_success() {
        let calls = &AtomicU32::new(0);
        let result = retry_on_conflict(3, "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AppError::ConcurrencyConflict)
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_conflict_after_last_attempt() {
        let calls = &AtomicU32::new(0);
        let result: AppResult<()> = retry_on_conflict(2, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::ConcurrencyConflict)
        })
        .await;
        assert!(matches!(result, Err(AppError::ConcurrencyConflict)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: AppResult<()> = retry_on_conflict(5, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::NotFound)
        })
        .await;
        assert!(matches!(result, Err(AppError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
