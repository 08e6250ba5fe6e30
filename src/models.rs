// Data structures shared by the collector and the reporter

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One catalog item or review as returned by the API, kept untyped.
pub type Record = Map<String, Value>;

/// Which listing the collector walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Book list of a category (`saleCmdtClstCode`)
    Book,
    /// Reviews of a single book (`saleCmdtid`)
    Review,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Book => write!(f, "book"),
            CollectionKind::Review => write!(f, "review"),
        }
    }
}

/// Parameters of a single page call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32, // 1-based
    pub page_size: u32,
    pub identifier: String,
    pub sort: String,
}

/// One decoded response page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<Record>,
    // Only the catalog endpoint reports one
    pub declared_total: Option<u64>,
}

/// How a collection run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// Ended on an empty page or on reaching the declared total.
    Complete,
    /// Stopped early on `page`; records gathered before it are kept.
    Partial { page: u32, reason: String },
    /// Nothing could be collected at all.
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct Collection {
    pub records: Vec<Record>,
    pub outcome: CollectionOutcome,
    pub pages_requested: u32,
}

impl Collection {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Coarse sentiment label attached to a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Negative => 0.0,
            Sentiment::Neutral => 0.5,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the review CSV after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub review_number: String,
    pub member_id: String,
    pub written_at: chrono::NaiveDateTime,
    pub content: String,
    pub keywords: String,
    pub rating: Option<f64>,
}

/// A review row with its predicted label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledReview {
    pub row: ReviewRow,
    pub sentiment: Sentiment,
}
