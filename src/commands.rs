// End-to-end flows behind the two binaries

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{
    analysis::{self, ReportContext},
    collector::{CollectOptions, PageSource, collect_all},
    config::Settings,
    csv_export,
    error::{AppError, AppResult},
    kyobo_api,
    models::{CollectionKind, CollectionOutcome},
    report::{self, ReportPaths},
    sentiment::SentimentLabeler,
    wordcloud::{self, WordCloudOptions},
};

/// Result of one collector run.
#[derive(Debug, Clone)]
pub enum CollectSummary {
    /// Nothing came back; no file was written.
    NoData { outcome: CollectionOutcome },
    Saved { path: PathBuf, count: usize, outcome: CollectionOutcome },
}

impl CollectSummary {
    /// Line printed for the user.
    pub fn message(&self, kind: CollectionKind) -> String {
        let noun = match kind {
            CollectionKind::Book => "books",
            CollectionKind::Review => "reviews",
        };
        match self {
            CollectSummary::NoData { outcome: CollectionOutcome::Failed { reason } } => {
                format!("No data collected: {}", reason)
            }
            CollectSummary::NoData { .. } => format!("No {} collected.", noun),
            CollectSummary::Saved { path, count, outcome } => {
                let mut line = format!("Saved {} {} to '{}'.", count, noun, path.display());
                if let CollectionOutcome::Partial { page, reason } = outcome {
                    line.push_str(&format!(" Stopped early at page {}: {}", page, reason));
                }
                line
            }
        }
    }
}

/// Walks every page of `identifier` and writes what was gathered.
pub async fn collect_to_csv<S>(
    source: &S,
    kind: CollectionKind,
    identifier: &str,
    settings: &Settings,
    output_dir: &Path,
    raw: bool,
) -> AppResult<CollectSummary>
where
    S: PageSource + ?Sized,
{
    let options = CollectOptions {
        identifier: identifier.to_string(),
        page_size: settings.api.page_size,
        sort: kyobo_api::default_sort(kind).to_string(),
        max_pages: settings.api.max_pages,
    };
    let collection = collect_all(source, &options).await;

    if collection.is_empty() {
        tracing::info!(%kind, identifier, "No records collected, skipping CSV output");
        return Ok(CollectSummary::NoData { outcome: collection.outcome });
    }

    let path = csv_export::save_collection(output_dir, kind, identifier, &collection.records, raw)?;
    tracing::info!(%kind, identifier, count = collection.records.len(), path = %path.display(), "Saved collection");
    Ok(CollectSummary::Saved { path, count: collection.records.len(), outcome: collection.outcome })
}

/// Which reporter step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStage {
    ReadInput,
    WordCloud,
    Report,
}

impl fmt::Display for ReportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStage::ReadInput => write!(f, "CSV read error"),
            ReportStage::WordCloud => write!(f, "word cloud generation error"),
            ReportStage::Report => write!(f, "report generation error"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{stage}: {source}")]
pub struct StageError {
    pub stage: ReportStage,
    #[source]
    pub source: AppError,
}

fn at(stage: ReportStage) -> impl FnOnce(AppError) -> StageError {
    move |source| StageError { stage, source }
}

#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub paths: ReportPaths,
    pub context: ReportContext,
    pub reviews: usize,
}

/// CSV → labels → aggregates → word cloud → HTML. Each stage stops the run on failure.
pub fn build_report<L>(
    title: &str,
    input: &Path,
    paths: ReportPaths,
    labeler: &L,
    cloud: &WordCloudOptions,
) -> Result<ReportArtifacts, StageError>
where
    L: SentimentLabeler + ?Sized,
{
    let table = csv_export::read_rows(input).map_err(at(ReportStage::ReadInput))?;
    let rows = analysis::parse_reviews(&table).map_err(at(ReportStage::ReadInput))?;
    tracing::info!(rows = rows.len(), input = %input.display(), "Loaded reviews");

    let reviews = analysis::label_and_sort(rows, labeler);
    let context = ReportContext::build(&reviews);

    wordcloud::generate(
        reviews.iter().map(|r| r.row.content.as_str()),
        &paths.font_path,
        &paths.wordcloud_path,
        cloud,
    )
    .map_err(at(ReportStage::WordCloud))?;

    report::write_report(&context, title, &paths.wordcloud_path, &paths.report_path)
        .map_err(at(ReportStage::Report))?;

    Ok(ReportArtifacts { paths, context, reviews: reviews.len() })
}
