// Bulk reading maintenance: the CLI counterpart of the dev-data import script
//
// Imports go through WeatherService one reading at a time, so implausible
// readings are diverted to the audit log exactly as they are over HTTP.

use anyhow::Context;
use serde_json::json;
use tracing::debug;

use crate::app::AppState;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::WeatherInput;
use crate::services::WeatherError;
use crate::store::Stores;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub rejected: usize,
    pub invalid: usize,
}

async fn open(config: &AppConfig) -> anyhow::Result<AppState> {
    let stores = Stores::open(config).await?;
    Ok(AppState::new(config.clone(), stores)?)
}

pub async fn import(config: &AppConfig, file: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file))?;
    let inputs: Vec<WeatherInput> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of readings", file))?;

    let state = open(config).await?;
    let summary = import_readings(&state, inputs).await?;

    output_success(
        output_format,
        &format!(
            "Imported {} readings ({} rejected as implausible, {} invalid)",
            summary.inserted, summary.rejected, summary.invalid
        ),
        Some(json!({
            "inserted": summary.inserted,
            "rejected": summary.rejected,
            "invalid": summary.invalid,
        })),
    )
}

pub async fn import_readings(state: &AppState, inputs: Vec<WeatherInput>) -> anyhow::Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for (index, input) in inputs.into_iter().enumerate() {
        match state.weather.create(input).await {
            Ok(_) => summary.inserted += 1,
            Err(WeatherError::Rejected) => summary.rejected += 1,
            Err(WeatherError::Validation(e)) => {
                debug!("Reading {} skipped: {}", index, e);
                summary.invalid += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(summary)
}

pub async fn delete_all(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = open(config).await?;
    let deleted = state.weather.delete_all().await?;
    output_success(
        output_format,
        &format!("Deleted {} readings", deleted),
        Some(json!({ "deleted": deleted })),
    )
}
