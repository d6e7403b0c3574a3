use crate::config::parameter;
use async_trait::async_trait;
use sqlx::{Error, Pool, Postgres, pool::PoolOptions};
use std::time::Duration;
use tracing::info;

pub struct Database {
    pool: Pool<Postgres>,
}

#[async_trait]
pub trait DatabaseTrait {
    async fn init() -> Result<Self, Error>
        where
            Self: Sized;
    async fn migrate(&self) -> Result<(), Error>;
    fn get_pool(&self) -> &Pool<Postgres>;
}

fn pool_setting<T: std::str::FromStr>(key: &str, default: T) -> T {
    parameter::get_optional(key)
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

#[async_trait]
impl DatabaseTrait for Database {
    async fn init() -> Result<Self, Error> {
        let database_url = parameter::require("DATABASE_URL")
            .map_err(|e| Error::Configuration(Box::new(e)))?;

        let max_connections = pool_setting("DB_MAX_CONNECTIONS", 20u32);
        let min_connections = pool_setting("DB_MIN_CONNECTIONS", 2u32);
        let acquire_timeout_seconds = pool_setting("DB_ACQUIRE_TIMEOUT_SECONDS", 30u64);
        let idle_timeout_seconds = pool_setting("DB_IDLE_TIMEOUT_SECONDS", 600u64);
        let max_lifetime_seconds = pool_setting("DB_MAX_LIFETIME_SECONDS", 1800u64);

        let pool = PoolOptions::<Postgres>::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(max_lifetime_seconds))
            .connect(&database_url)
            .await?;

        if cfg!(debug_assertions) {
            info!(
                "Database pool configured: max={}, min={}, acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
                max_connections, min_connections, acquire_timeout_seconds, idle_timeout_seconds, max_lifetime_seconds
            );
        } else {
            info!("Database pool configured successfully");
        }

        Ok(Self { pool })
    }

    async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    fn get_pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}
