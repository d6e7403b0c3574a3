use account_service::config::database::{Database, DatabaseTrait};
use account_service::config::{logging, parameter};
use account_service::repository::memory_user_repository::InMemoryUserRepository;
use account_service::repository::user_repository::{UserRepository, UserRepositoryTrait};
use account_service::routes;
use account_service::service::media_service;
use account_service::service::token_service::TokenService;
use account_service::state::app_state::AppDependencies;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

async fn user_repository() -> Result<Arc<dyn UserRepositoryTrait>, Box<dyn std::error::Error>> {
    match parameter::get("STORAGE_BACKEND").to_lowercase().as_str() {
        "memory" => {
            warn!("Using in-memory user store; data is lost on restart");
            let repo: Arc<dyn UserRepositoryTrait> = InMemoryUserRepository::new_shared();
            Ok(repo)
        }
        _ => {
            let connection = Database::init().await.map_err(|e| {
                error!("Failed to initialize database: {}", e);
                e
            })?;
            connection.migrate().await.map_err(|e| {
                error!("Failed to run database migrations: {}", e);
                e
            })?;
            info!("Database connection established and migrated");
            let repo: Arc<dyn UserRepositoryTrait> = Arc::new(UserRepository::new(&Arc::new(connection)));
            Ok(repo)
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, initiating graceful shutdown..."),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    parameter::init();
    logging::init();
    info!("Starting account service...");

    let token_service = TokenService::from_parameters().map_err(|e| {
        error!("Failed to initialize token service: {}", e);
        e
    })?;

    let user_repo = user_repository().await?;

    let staging_dir = PathBuf::from(parameter::get("UPLOAD_TEMP_DIR"));
    media_service::ensure_staging_dir(&staging_dir).await?;
    let (media, media_mount) = media_service::storage_from_parameters();

    let deps = AppDependencies::from_parameters(user_repo, token_service, media, media_mount).map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    let app = routes::root::routes(deps);

    let host = format!("{}:{}", parameter::get("SERVER_ADDRESS"), parameter::get("SERVER_PORT"));
    let listener = tokio::net::TcpListener::bind(&host).await.map_err(|e| {
        error!("Failed to bind to {}: {}", host, e);
        e
    })?;
    info!("Server listening on {}", host);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown gracefully");
    Ok(())
}
