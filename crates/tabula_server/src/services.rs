//! Service wiring from configuration.

use crate::AppState;
use std::sync::Arc;
use tabula_core::{DatabaseConfig, TabulaConfig};
use tabula_database::{ExecutionRepository, ImageRepository, InMemoryRepository};
use tabula_error::{ConfigError, TabulaResult};
use tabula_models::StructuredGenerator;
use tabula_prompts::{ImageUploadHandler, PromptRunner};
use tabula_storage::{ImageValidator, build_storage};
use tracing::{info, instrument};

type Repositories = (Arc<dyn ImageRepository>, Arc<dyn ExecutionRepository>);

/// Build every service the handlers need.
///
/// # Errors
///
/// Returns configuration errors for a missing API key, storage errors if the
/// media root cannot be created, and database errors if the pool or
/// migrations fail.
#[instrument(skip(config))]
pub fn build_state(config: &TabulaConfig) -> TabulaResult<AppState> {
    let storage = build_storage(&config.storage)?;
    let (images, executions) = repositories(&config.database)?;
    let uploads = Arc::new(ImageUploadHandler::new(
        ImageValidator::new(config.upload.clone()),
        storage,
        images.clone(),
    ));
    let generator = StructuredGenerator::from_config(&config.llm)?;

    let runner = PromptRunner::builder()
        .uploads(uploads)
        .generator(generator)
        .executions(executions)
        .images(images)
        .media_url(config.storage.media_url.clone())
        .history_limit(config.server.history_limit)
        .build()
        .map_err(|e| ConfigError::new(format!("Failed to build prompt runner: {}", e)))?;

    let max_upload_bytes = usize::try_from(config.upload.max_size_bytes()).unwrap_or(usize::MAX);
    info!(backend = %config.storage.backend, model = %config.llm.model, "Services ready");
    Ok(AppState::new(
        Arc::new(runner),
        config.storage.clone(),
        max_upload_bytes,
    ))
}

fn in_memory() -> Repositories {
    let repo = Arc::new(InMemoryRepository::new());
    let images: Arc<dyn ImageRepository> = repo.clone();
    let executions: Arc<dyn ExecutionRepository> = repo;
    (images, executions)
}

#[cfg(feature = "database")]
fn repositories(config: &DatabaseConfig) -> TabulaResult<Repositories> {
    use tabula_database::PgRepository;

    match config.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let repo = Arc::new(PgRepository::new(url, 10)?);
            repo.run_migrations()?;
            info!("Using PostgreSQL repositories");
            let images: Arc<dyn ImageRepository> = repo.clone();
            let executions: Arc<dyn ExecutionRepository> = repo;
            Ok((images, executions))
        }
        None => {
            info!("No database configured, using in-memory repositories");
            Ok(in_memory())
        }
    }
}

#[cfg(not(feature = "database"))]
fn repositories(config: &DatabaseConfig) -> TabulaResult<Repositories> {
    if config.url.is_some() {
        tracing::warn!("database.url is set but the `database` feature is disabled, using in-memory repositories");
    } else {
        info!("No database configured, using in-memory repositories");
    }
    Ok(in_memory())
}
