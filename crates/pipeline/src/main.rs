//! Citation graph pipeline binary
//!
//! Usage: `citegraph <export.json> <out-dir>`
//!
//! Reads a bibliographic export, enriches it from the configured
//! metadata and tally services, classifies citation edges, and writes
//! graph tables plus stage artifacts under the output directory.
//! Ctrl-C requests a graceful stop: in-flight work finishes, remaining
//! items are served from cache only.

use anyhow::Context;
use citegraph_common::AppConfig;
use citegraph_pipeline::cancel::CancelFlag;
use citegraph_pipeline::run::{run_pipeline, Services};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (export_path, out_dir) = match (args.next(), args.next()) {
        (Some(export), Some(out)) => (PathBuf::from(export), PathBuf::from(out)),
        _ => {
            eprintln!("Usage: citegraph <export.json> <out-dir>");
            std::process::exit(2);
        }
    };

    let config = AppConfig::load().context("Failed to load configuration")?;
    let services = Services::from_config(&config).context("Failed to build service clients")?;

    let cancel = CancelFlag::new();
    let ctrl_c_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing in-flight work");
            ctrl_c_flag.cancel();
        }
    });

    info!(version = citegraph_common::VERSION, "Starting citegraph");
    match run_pipeline(&config, &services, &export_path, &out_dir, &cancel).await {
        Ok(report) => {
            info!(stages = report.stages.len(), "Run finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            Err(e.into())
        }
    }
}
