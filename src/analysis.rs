// Review table parsing and report aggregates

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{
    csv_export::{CONTENT, CsvTable, KEYWORDS, MEMBER_ID, RATING, REVIEW_NUMBER, WRITTEN_AT},
    error::{AppError, AppResult},
    models::{LabeledReview, ReviewRow, Sentiment},
    sentiment::SentimentLabeler,
};

pub const REQUIRED_COLUMNS: [&str; 6] = [REVIEW_NUMBER, MEMBER_ID, WRITTEN_AT, CONTENT, KEYWORDS, RATING];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y%m%d%H%M%S",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%Y%m%d"];

/// Parses the timestamp shapes the review API and spreadsheets produce.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Turns the loaded CSV into typed rows. Fails before any output is produced.
pub fn parse_reviews(table: &CsvTable) -> AppResult<Vec<ReviewRow>> {
    let missing = table.missing_columns(&REQUIRED_COLUMNS);
    if !missing.is_empty() {
        return Err(AppError::MissingColumns(missing));
    }

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let line = i + 2; // header is line 1
            let cell = |name: &str| row.get(name).map(|s| s.trim().to_string()).unwrap_or_default();

            let raw_ts = cell(WRITTEN_AT);
            let written_at = parse_timestamp(&raw_ts)
                .ok_or_else(|| AppError::InvalidTimestamp { row: line, value: raw_ts.clone() })?;

            let raw_rating = cell(RATING);
            let rating = if raw_rating.is_empty() {
                None
            } else {
                Some(
                    raw_rating
                        .parse::<f64>()
                        .ok()
                        .filter(|r| r.is_finite())
                        .ok_or_else(|| AppError::InvalidRating { row: line, value: raw_rating.clone() })?,
                )
            };

            Ok(ReviewRow {
                review_number: cell(REVIEW_NUMBER),
                member_id: cell(MEMBER_ID),
                written_at,
                // Free text keeps its inner whitespace
                content: row.get(CONTENT).cloned().unwrap_or_default(),
                keywords: cell(KEYWORDS),
                rating,
            })
        })
        .collect()
}

/// Labels every row and sorts ascending by timestamp (stable).
pub fn label_and_sort<L>(rows: Vec<ReviewRow>, labeler: &L) -> Vec<LabeledReview>
where
    L: SentimentLabeler + ?Sized,
{
    let mut labeled: Vec<LabeledReview> = rows
        .into_iter()
        .map(|row| {
            let sentiment = labeler.label(&row.content);
            LabeledReview { row, sentiment }
        })
        .collect();
    labeled.sort_by_key(|r| r.row.written_at);
    labeled
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Comma-split keyword counts, trimmed, empties dropped, first-seen order.
pub fn keyword_frequencies<'a, I>(cells: I) -> IndexMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for cell in cells {
        for keyword in cell.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            *counts.entry(keyword.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyRating {
    pub mean: f64,
    pub count: usize,
}

/// `YYYY-MM` → mean rating (2 dp) and rated-row count; unrated months are absent.
pub fn monthly_ratings(reviews: &[LabeledReview]) -> BTreeMap<String, MonthlyRating> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for review in reviews {
        if let Some(rating) = review.row.rating {
            let month = review.row.written_at.format("%Y-%m").to_string();
            let entry = sums.entry(month).or_insert((0.0, 0));
            entry.0 += rating;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(month, (sum, count))| (month, MonthlyRating { mean: round2(sum / count as f64), count }))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Overall rating statistics; None when no row carries a rating.
pub fn rating_stats(reviews: &[LabeledReview]) -> Option<RatingStats> {
    let ratings: Vec<f64> = reviews.iter().filter_map(|r| r.row.rating).collect();
    if ratings.is_empty() {
        return None;
    }
    let sum: f64 = ratings.iter().sum();
    let min = ratings.iter().copied().fold(f64::INFINITY, f64::min);
    let max = ratings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(RatingStats {
        mean: round2(sum / ratings.len() as f64),
        min: round2(min),
        max: round2(max),
        count: ratings.len(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    // Mean of 1.0 / 0.0 / 0.5 scores
    pub mean_score: f64,
}

pub fn sentiment_summary(reviews: &[LabeledReview]) -> SentimentSummary {
    let mut summary = SentimentSummary::default();
    for review in reviews {
        match review.sentiment {
            Sentiment::Positive => summary.positive += 1,
            Sentiment::Negative => summary.negative += 1,
            Sentiment::Neutral => summary.neutral += 1,
        }
    }
    if !reviews.is_empty() {
        let total: f64 = reviews.iter().map(|r| r.sentiment.score()).sum();
        summary.mean_score = round2(total / reviews.len() as f64);
    }
    summary
}

/// Highest counts first; equal counts keep first-seen order.
pub fn top_keywords(frequencies: &IndexMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = frequencies.iter().map(|(k, v)| (k.clone(), *v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Everything the report shows, derived from the labeled rows.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub keyword_frequencies: IndexMap<String, usize>,
    pub monthly: BTreeMap<String, MonthlyRating>,
    pub rating: Option<RatingStats>,
    pub sentiment: SentimentSummary,
    pub top_keywords: Vec<(String, usize)>,
    pub summary: String,
    pub insights: Vec<String>,
}

impl ReportContext {
    pub fn build(reviews: &[LabeledReview]) -> Self {
        let keyword_frequencies = keyword_frequencies(reviews.iter().map(|r| r.row.keywords.as_str()));
        let monthly = monthly_ratings(reviews);
        let rating = rating_stats(reviews);
        let sentiment = sentiment_summary(reviews);
        let top_keywords = top_keywords(&keyword_frequencies, 5);

        let mean = rating.map(|r| r.mean).unwrap_or(0.0);
        let summary = if mean > 4.0 {
            "전반적으로 높은 평점입니다.".to_string()
        } else {
            "개선이 필요한 부분이 있습니다.".to_string()
        };

        let lead = if sentiment.positive >= sentiment.negative {
            "긍정적 리뷰가 많이 포함되어 있습니다."
        } else {
            "부정적 리뷰의 비중이 높습니다."
        };
        let keyword_line = if top_keywords.is_empty() {
            "감정키워드가 수집되지 않았습니다.".to_string()
        } else {
            let names: Vec<&str> = top_keywords.iter().take(3).map(|(k, _)| k.as_str()).collect();
            format!("주요 감정키워드는 {} 등이 포함됩니다.", names.join(", "))
        };
        let insights = vec![
            lead.to_string(),
            format!("전체 평균 평점은 {:.1}점 입니다.", mean),
            keyword_line,
            format!(
                "감성 분류 결과 긍정 {}건, 부정 {}건, 중립 {}건입니다.",
                sentiment.positive, sentiment.negative, sentiment.neutral
            ),
            "감성 키워드는 마케팅 인사이트로 활용 가능합니다.".to_string(),
        ];

        tracing::debug!(
            keywords = keyword_frequencies.len(),
            months = monthly.len(),
            positive = sentiment.positive,
            negative = sentiment.negative,
            "Built report context"
        );

        ReportContext { keyword_frequencies, monthly, rating, sentiment, top_keywords, summary, insights }
    }
}
