use clap::Parser;
use std::path::PathBuf;

use crate::models::CollectionKind;

/// Collect Kyobo catalog or review pages into a CSV file
#[derive(Parser, Debug, Clone)]
#[command(name = "collector", version, about)]
pub struct CollectorCli {
    /// What to collect: a category's book list or a book's reviews
    #[arg(value_enum)]
    pub mode: CollectionKind,

    /// Category code (book) or product code (review), e.g. 118 or S000061818273
    pub identifier: String,

    /// Directory for the CSV (default: output.data_dir)
    #[arg(long, short = 'd')]
    pub output_dir: Option<PathBuf>,

    /// Write every field the API returned instead of the fixed columns
    #[arg(long)]
    pub raw: bool,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Path to config file
    #[arg(long)]
    pub config: Option<String>,
}

/// Sentiment analysis and HTML report for a review CSV
#[derive(Parser, Debug, Clone)]
#[command(name = "reporter", version, about)]
pub struct ReporterCli {
    /// Book title shown in the report, e.g. "세이노의 가르침"
    #[arg(short = 't', long)]
    pub title: String,

    /// Review CSV (columns: 리뷰번호,회원ID,작성일시,리뷰내용,감정키워드,평점)
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Report path (default: output/<title>_report.html)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Path to config file
    #[arg(long)]
    pub config: Option<String>,
}
