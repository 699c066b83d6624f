use std::fs::File;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use syncmark_connector_rest::{RestConfig, RestConnector};
use syncmark_pipeline::settings::SYNC_BASE_URL;
use syncmark_pipeline::{
    BatchOrchestrator, DirectoryDiagnostics, DirectoryStore, InboundBatch, RecordPipeline,
    SyncContext, SyncSettings,
};

/// Transport settings for the REST connector, taken from the batch context only.
fn rest_config(ctx: &SyncContext) -> RestConfig {
    RestConfig::new(&ctx.base_url)
        .with_auth(ctx.credentials.clone())
        .with_connection(ctx.connection.clone())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,syncmark_pipeline=debug")),
        )
        .init();

    // Load configuration
    let settings = SyncSettings::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    if !settings.missing.is_empty() {
        tracing::warn!(missing = ?settings.missing, "configuration incomplete, using placeholders");
    }
    if settings.is_missing(SYNC_BASE_URL) {
        bail!("{SYNC_BASE_URL} is not set, refusing to run");
    }

    let ctx = Arc::new(settings.build_context()?);

    tracing::info!(
        base_url = %ctx.base_url,
        entity_type = %ctx.entity.name,
        max_concurrency = settings.max_concurrency,
        continue_on_record_error = settings.continue_on_record_error,
        "starting syncmark runner"
    );

    let connector =
        RestConnector::new(rest_config(&ctx)).context("failed to build REST connector")?;

    let mut pipeline = RecordPipeline::new(Arc::new(connector));
    if let Some(dir) = &settings.diagnostics_dir {
        pipeline = pipeline.with_diagnostics(Arc::new(DirectoryDiagnostics::new(dir)));
    }
    if let Some(dir) = &settings.store_dir {
        pipeline = pipeline.with_persistence(Arc::new(DirectoryStore::new(dir)));
    }

    let batch_file = settings
        .batch_file
        .as_deref()
        .context("SYNC_BATCH_FILE is not set")?;
    let batch = InboundBatch::from_path(batch_file, &ctx.entity.xml_record_element)
        .with_context(|| format!("failed to read batch {}", batch_file.display()))?;
    tracing::info!(records = batch.len(), file = %batch_file.display(), "batch loaded");

    let result = BatchOrchestrator::new(pipeline)
        .run(batch, Arc::clone(&ctx), &settings.policy())
        .await;

    let summary = result.summary();
    tracing::info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        rejected = summary.rejected,
        skipped = summary.skipped,
        aborted = result.aborted,
        "batch summary"
    );

    if let Some(path) = &settings.report_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create report {}", path.display()))?;
        result
            .write_csv_report(file)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        tracing::info!(report = %path.display(), "report written");
    }

    if result.aborted {
        std::process::exit(2);
    }
    Ok(())
}
