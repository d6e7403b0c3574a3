use crate::config::logging::secure_log;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::response::app_response::SuccessResponse;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::info;

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub storage: StorageHealth,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct StorageHealth {
    pub status: String,
    pub response_time_ms: Option<u128>,
}

static START_TIME: OnceLock<Instant> = OnceLock::new();

pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

pub fn get_uptime_seconds() -> u64 {
    START_TIME.get().map(|start| start.elapsed().as_secs()).unwrap_or(0)
}

pub async fn health_check(
    State(user_repo): State<Arc<dyn UserRepositoryTrait>>,
) -> SuccessResponse<HealthStatus> {
    let storage = check_storage_health(user_repo.as_ref()).await;
    let status = if storage.status == "healthy" { "healthy" } else { "unhealthy" };

    SuccessResponse::send(
        HealthStatus {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: get_uptime_seconds(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage,
        },
        "Service health",
    )
}

async fn check_storage_health(user_repo: &dyn UserRepositoryTrait) -> StorageHealth {
    let start = Instant::now();
    match user_repo.ping().await {
        Ok(()) => {
            let response_time = start.elapsed().as_millis();
            info!("Storage health check passed in {}ms", response_time);
            StorageHealth {
                status: "healthy".to_string(),
                response_time_ms: Some(response_time),
            }
        }
        Err(e) => {
            secure_log::secure_error!("Storage health check failed", e);
            StorageHealth {
                status: "unhealthy".to_string(),
                response_time_ms: None,
            }
        }
    }
}
