use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod error;
pub mod net;
pub mod protocol;
pub mod types;

pub use error::DroneNetError;

/// Initialize logging for the application
pub fn init_logging() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Common result type used across the workspace
pub type DroneNetResult<T> = Result<T, DroneNetError>;
