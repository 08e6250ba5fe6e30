use anyhow::{Context, Result};
use clap::Parser;

use kyobo_scraper::{
    DEFAULT_LOG_FILTER,
    cli::ReporterCli,
    commands,
    config::Settings,
    logging,
    report::ReportPaths,
    sentiment::ExemplarIndex,
    wordcloud::WordCloudOptions,
};

fn main() -> Result<()> {
    let cli = ReporterCli::parse();
    logging::init_tracing(DEFAULT_LOG_FILTER)?;

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let paths = ReportPaths::resolve(&cli.title, cli.output.as_deref(), &settings.report);
    let labeler = ExemplarIndex::new();

    match commands::build_report(&cli.title, &cli.file, paths, &labeler, &WordCloudOptions::default()) {
        Ok(artifacts) => {
            tracing::info!(reviews = artifacts.reviews, "Analysis complete");
            println!("\nAnalysis complete! Output:");
            println!("- Word cloud: {}", artifacts.paths.wordcloud_path.display());
            println!("- HTML report: {}", artifacts.paths.report_path.display());
        }
        Err(e) => {
            tracing::error!(stage = %e.stage, "Reporter stopped: {}", e.source);
            println!("{}", e);
        }
    }
    Ok(())
}
