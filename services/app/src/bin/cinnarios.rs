//! services/app/src/bin/cinnarios.rs

use app_lib::{
    adapters::{InMemoryStore, JsonFileStore, MockIdentityService, SystemClock, TerminalToastSink},
    config::Config,
    error::AppError,
    shell,
    state::{App, AppServices},
};
use chrono::{Local, Utc};
use cinnarios_core::ports::KeyValueStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Starting client...");

    // --- 2. Initialize Service Adapters ---
    let store: Arc<dyn KeyValueStore> = match &config.storage_path {
        Some(path) => {
            info!("Persisting state to {}", path.display());
            Arc::new(JsonFileStore::new(path.clone()))
        }
        None => {
            info!("Keeping state in memory only");
            Arc::new(InMemoryStore::new())
        }
    };
    let identity = Arc::new(MockIdentityService::new(
        config.auth_latency,
        config.auth_failure_rate,
    ));

    let (sink, timed_out) = TerminalToastSink::new();

    let services = AppServices {
        store,
        identity,
        clock: Arc::new(SystemClock),
        sink: Arc::new(sink),
    };

    // --- 3. Boot the App & Run the Shell ---
    if config.use_local_time {
        let mut app = App::boot(services, Local).await;
        shell::run(&mut app, timed_out).await?;
    } else {
        let mut app = App::boot(services, Utc).await;
        shell::run(&mut app, timed_out).await?;
    }

    info!("Goodbye.");
    Ok(())
}
