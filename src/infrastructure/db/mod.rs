use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::application::ports::store_health::StoreHealth;

pub type PgPool = Pool<Postgres>;

pub fn connect_pool(database_url: &str) -> anyhow::Result<PgPool> {
    // Lazy so the server still starts (and serves public routes) while the
    // database is down; session lookups fail and degrade to anonymous.
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    // Uses compile-time embedded migrations under ./migrations
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub struct PgStoreHealth {
    pool: PgPool,
}

impl PgStoreHealth {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreHealth for PgStoreHealth {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

pub mod repositories;
