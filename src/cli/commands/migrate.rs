use anyhow::bail;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, StoreBackend};
use crate::database::DatabaseManager;

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.database.backend != StoreBackend::Postgres {
        bail!("migrate needs STORE_BACKEND=postgres");
    }

    let manager = DatabaseManager::connect(config).await?;
    manager.migrate().await?;
    manager.close().await;

    output_success(
        output_format,
        "Database schema is up to date",
        Some(json!({ "tables": ["users", "weather", "logs"] })),
    )
}
