use anyhow::{Context, Result};
use clap::Parser;

use kyobo_scraper::{
    DEFAULT_LOG_FILTER,
    cli::CollectorCli,
    commands,
    config::Settings,
    kyobo_api::{self, KyoboClient},
    logging,
};

// Pages are fetched one after another, a single thread is enough
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = CollectorCli::parse();
    logging::init_tracing(DEFAULT_LOG_FILTER)?;

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.max_pages.is_some() {
        settings.api.max_pages = cli.max_pages;
    }
    let output_dir = cli.output_dir.clone().unwrap_or_else(|| settings.output.data_dir.clone());
    let raw = cli.raw || settings.output.raw;

    let identifier = cli.identifier.trim();
    if identifier.is_empty() {
        println!("Enter a code. e.g. collector book 118 / collector review S000061818273");
        return Ok(());
    }

    let http = kyobo_api::build_client(&settings.api).context("Failed to build HTTP client")?;
    let source = KyoboClient::new(http, settings.api.clone(), cli.mode);
    tracing::info!(mode = %cli.mode, identifier, "Collector starting");

    match commands::collect_to_csv(&source, cli.mode, identifier, &settings, &output_dir, raw).await {
        Ok(summary) => println!("{}", summary.message(cli.mode)),
        Err(e) => {
            tracing::error!("Failed to write collected records: {}", e);
            println!("Failed to save results: {}", e);
        }
    }
    Ok(())
}
