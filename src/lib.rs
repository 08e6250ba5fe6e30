pub mod analysis;
pub mod cli;
pub mod collector;
pub mod commands;
pub mod config;
pub mod csv_export;
pub mod error;
pub mod kyobo_api;
pub mod logging;
pub mod models;
pub mod report;
pub mod sentiment;
pub mod wordcloud;

pub const DEFAULT_LOG_FILTER: &str = "kyobo_scraper=info,collector=info,reporter=info";
