use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

pub async fn applied_count(pool: &DbPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::{applied_count, run_pending, MIGRATOR};
    use crate::connect_with_settings;

    async fn kv_table_count(pool: &sqlx::SqlitePool) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'kv_store'",
        )
        .fetch_one(pool)
        .await
        .expect("inspect schema")
    }

    #[tokio::test]
    async fn migrations_create_kv_store_table() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        assert_eq!(kv_table_count(&pool).await, 1);
        assert_eq!(applied_count(&pool).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn migrations_are_idempotent_and_reversible() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("first run");
        run_pending(&pool).await.expect("second run");
        assert_eq!(applied_count(&pool).await.expect("count"), 1);

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");
        assert_eq!(kv_table_count(&pool).await, 0);

        run_pending(&pool).await.expect("re-run migrations");
        assert_eq!(kv_table_count(&pool).await, 1);
    }
}
