//! Geographic Data Gateway
//!
//! An API-key gated front for upstream geographic data APIs:
//! - Key lifecycle: issue, rotate, disable, enable, delete, retrieve,
//!   each gated by the owner's password
//! - Fixed-window rate limiting backed by a TTL counter store
//! - Best-effort per-key, per-day, per-endpoint usage metering

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::StorageBackend;
use api::state::AppState;
use domain::{Cache, CredentialRepository, UsageLedger};
use infrastructure::api_key::{
    AdmissionController, Argon2Hasher, FixedWindowLimiter, InMemoryCredentialRepository,
    KeyManager, PasswordHasher, PostgresCredentialRepository, RateLimitConfig,
};
use infrastructure::cache::{InMemoryCache, RedisCache};
use infrastructure::usage::{InMemoryUsageLedger, PostgresUsageLedger, UsageRecorder};

/// Create the application state with all services initialized.
///
/// Store clients are constructed once here and passed down by handle; no
/// component reaches for ambient globals.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let limiter = create_limiter(config).await?;
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());

    match config.storage.backend {
        StorageBackend::Postgres => {
            let database_url = config
                .storage
                .database_url
                .clone()
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL is required for the postgres storage backend")
                })?;

            info!("Connecting to PostgreSQL...");
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
            info!("PostgreSQL connection established");

            let repository = Arc::new(PostgresCredentialRepository::new(pool.clone()));
            repository.ensure_table().await?;

            let ledger = Arc::new(PostgresUsageLedger::new(pool));
            ledger.ensure_table().await?;

            Ok(assemble_state(repository, ledger, limiter, hasher))
        }
        StorageBackend::Memory => {
            info!("Using in-memory credential store and usage ledger");

            Ok(assemble_state(
                Arc::new(InMemoryCredentialRepository::new()),
                Arc::new(InMemoryUsageLedger::new()),
                limiter,
                hasher,
            ))
        }
    }
}

async fn create_limiter(config: &AppConfig) -> anyhow::Result<Arc<FixedWindowLimiter>> {
    let redis_url = config
        .redis
        .url
        .clone()
        .or_else(|| std::env::var("REDIS_URL").ok());

    let cache: Arc<dyn Cache> = match redis_url {
        Some(url) => {
            info!("Using Redis rate counter store");
            Arc::new(RedisCache::with_url(url).await?)
        }
        None => {
            info!("Using in-memory rate counter store");
            Arc::new(InMemoryCache::new())
        }
    };

    let rate_config = RateLimitConfig {
        limit: config.rate_limit.limit,
        window: Duration::from_secs(config.rate_limit.window_secs),
        fail_open: config.rate_limit.fail_open,
    };

    if rate_config.fail_open {
        info!("Rate limiter will fail open on counter store outage");
    } else {
        info!("Rate limiter will fail closed on counter store outage");
    }

    Ok(Arc::new(FixedWindowLimiter::new(cache, rate_config)))
}

/// Wire the three core services around one credential repository
pub fn assemble_state<R, L>(
    repository: Arc<R>,
    ledger: Arc<L>,
    limiter: Arc<FixedWindowLimiter>,
    hasher: Arc<dyn PasswordHasher>,
) -> AppState
where
    R: CredentialRepository + 'static,
    L: UsageLedger + 'static,
{
    AppState::new(
        Arc::new(KeyManager::new(repository.clone(), hasher)),
        Arc::new(AdmissionController::new(repository, limiter)),
        Arc::new(UsageRecorder::new(ledger)),
    )
}
