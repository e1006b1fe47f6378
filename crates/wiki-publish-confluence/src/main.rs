use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wiki_publish_confluence::{
    run_until, shutdown_signal, Config, ConfluenceClient, ConfluenceDirectory, MarkdownConverter,
};
use wiki_publish_core::{SyncEngine, SyncOutcome, TreeLayout};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    let ancestor_path = config.ancestor_path();
    if !ancestor_path.exists() {
        info!("No {}, nothing to publish", ancestor_path.display());
        return Ok(());
    }
    let ancestor = tokio::fs::read_to_string(&ancestor_path)
        .await
        .with_context(|| format!("failed to read {}", ancestor_path.display()))?;

    let client = ConfluenceClient::new(&config.url, &config.login, &config.password);
    let directory = Arc::new(ConfluenceDirectory::new(client, config.space.clone()));
    let engine = SyncEngine::new(
        directory,
        Arc::new(MarkdownConverter),
        TreeLayout::in_dir(&config.root_dir),
    );

    info!("Publishing {} to space {}", config.root_dir.display(), config.space);

    let outcome = run_until(&engine, &ancestor, config.timeout(), shutdown_signal()).await?;

    match outcome {
        SyncOutcome::Skipped => {}
        SyncOutcome::Completed(report) => {
            info!(
                "Published {:?}: {} updated, {} created, {} remote pages without a local file",
                report.root_title,
                report.updated.len(),
                report.created.len(),
                report.orphaned.len()
            );
        }
    }
    Ok(())
}
