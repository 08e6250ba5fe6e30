// Loading configuration
// Uses the 'config' crate and 'dotenv', same layering for both binaries

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::AppResult;

pub const DEFAULT_CATALOG_URL: &str = "https://product.kyobobook.co.kr/api/gw/pdt/category/all";
pub const DEFAULT_REVIEW_URL: &str = "https://product.kyobobook.co.kr/api/review/list";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub output: OutputSettings,
    pub report: ReportSettings,
}

// Remote endpoints and paging
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub catalog_url: String,
    pub review_url: String,
    pub user_agent: String,
    pub page_size: u32,
    // Transport default when unset
    pub timeout_secs: Option<u64>,
    // Unbounded when unset; the review endpoint never declares a total
    pub max_pages: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputSettings {
    pub data_dir: PathBuf,
    pub raw: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportSettings {
    pub output_dir: PathBuf,
    pub font_path: PathBuf,
}

impl Settings {
    /// Defaults, then `config.toml` (or the explicit file), then `KYOBO__*` env vars.
    pub fn load(config_path: Option<&str>) -> AppResult<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let file_source = match config_path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("config").required(false),
        };

        let builder = Config::builder()
            .set_default("api.catalog_url", DEFAULT_CATALOG_URL)?
            .set_default("api.review_url", DEFAULT_REVIEW_URL)?
            .set_default("api.user_agent", DEFAULT_USER_AGENT)?
            .set_default("api.page_size", 100)?
            .set_default("output.data_dir", "data")?
            .set_default("output.raw", false)?
            .set_default("report.output_dir", "output")?
            .set_default("report.font_path", "data/NanumGothic.ttf")?
            .add_source(file_source)
            // e.g. KYOBO__API__PAGE_SIZE=50
            .add_source(Environment::with_prefix("KYOBO").prefix_separator("__").separator("__").try_parsing(true));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api: ApiSettings {
                catalog_url: DEFAULT_CATALOG_URL.to_string(),
                review_url: DEFAULT_REVIEW_URL.to_string(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
                page_size: 100,
                timeout_secs: None,
                max_pages: None,
            },
            output: OutputSettings {
                data_dir: PathBuf::from("data"),
                raw: false,
            },
            report: ReportSettings {
                output_dir: PathBuf::from("output"),
                font_path: PathBuf::from("data/NanumGothic.ttf"),
            },
        }
    }
}
