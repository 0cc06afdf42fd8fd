mod command;
mod settings;
mod shell;
mod transcript;

use settings::SettingsStore;
use shell::{AppError, Shell};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Logs go to stderr so they never interleave with the transcript.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = SettingsStore::load();
    tracing::info!(config_path = %store.config_path().display(), "settings loaded");

    Shell::new(store)?.run().await
}
