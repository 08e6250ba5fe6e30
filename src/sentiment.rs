//! Coarse review sentiment via nearest-exemplar lookup.
//!
//! Six hand-labeled sentences form the whole reference set. Each text is
//! embedded as a character uni/bi-gram frequency vector and matched to the
//! exemplar with the highest cosine similarity. Ids 0..=2 are positive,
//! 3..=5 negative.

use std::collections::BTreeMap;

use crate::models::Sentiment;

/// Text → label. Swap in a real classifier by implementing this.
pub trait SentimentLabeler {
    fn label(&self, text: &str) -> Sentiment;
}

pub const EXEMPLARS: [(Sentiment, &str); 6] = [
    (Sentiment::Positive, "이 책은 정말 유익하고 감동적이었어요."),
    (Sentiment::Positive, "내용이 흥미롭고 유용했어요."),
    (Sentiment::Positive, "재미있고 다시 읽고 싶어요."),
    (Sentiment::Negative, "별로 도움이 안 됐어요."),
    (Sentiment::Negative, "실망스럽고 지루했어요."),
    (Sentiment::Negative, "읽기 힘들고 후회돼요."),
];

const LAST_POSITIVE_ID: usize = 2;

// Ordered so float sums come out identical on every call
type SparseVector = BTreeMap<String, f64>;

// Lowercased alphanumeric characters, single and adjacent pairs within a word
fn embed(text: &str) -> SparseVector {
    let mut vector = SparseVector::new();
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let chars: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
        for c in &chars {
            *vector.entry(c.to_string()).or_insert(0.0) += 1.0;
        }
        for pair in chars.windows(2) {
            *vector.entry(pair.iter().collect()).or_insert(0.0) += 1.0;
        }
    }
    vector
}

fn norm(vector: &SparseVector) -> f64 {
    vector.values().map(|v| v * v).sum::<f64>().sqrt()
}

fn cosine(a: &SparseVector, a_norm: f64, b: &SparseVector, b_norm: f64) -> f64 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(k, v)| large.get(k).map(|w| v * w))
        .sum();
    dot / (a_norm * b_norm)
}

struct Entry {
    vector: SparseVector,
    norm: f64,
}

/// Nearest-neighbor index over the fixed exemplar set. Build once per run.
pub struct ExemplarIndex {
    entries: Vec<Entry>,
}

impl ExemplarIndex {
    pub fn new() -> Self {
        let entries = EXEMPLARS
            .iter()
            .map(|(_, text)| {
                let vector = embed(text);
                let norm = norm(&vector);
                Entry { vector, norm }
            })
            .collect();
        tracing::debug!(exemplars = EXEMPLARS.len(), "Built sentiment exemplar index");
        ExemplarIndex { entries }
    }

    /// Best `(id, similarity)`, lowest id on ties. None when nothing overlaps.
    pub fn search(&self, text: &str) -> Option<(usize, f64)> {
        let query = embed(text);
        let query_norm = norm(&query);
        if query_norm == 0.0 {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (id, entry) in self.entries.iter().enumerate() {
            let score = cosine(&query, query_norm, &entry.vector, entry.norm);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((id, score));
            }
        }
        best.filter(|(_, score)| *score > 0.0)
    }
}

impl Default for ExemplarIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentLabeler for ExemplarIndex {
    fn label(&self, text: &str) -> Sentiment {
        match self.search(text) {
            Some((id, _)) if id <= LAST_POSITIVE_ID => Sentiment::Positive,
            Some(_) => Sentiment::Negative,
            None => Sentiment::Neutral,
        }
    }
}
