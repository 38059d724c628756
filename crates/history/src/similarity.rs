//! Similarity ranking over history records.

use crate::record::HistoryRecord;
use crate::vector::cosine_similarity;
use serde::Serialize;

/// Threshold and size limit for a ranking pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    /// Matches must score strictly above this
    pub min_score: f32,

    /// Maximum number of matches returned
    pub limit: usize,
}

impl RankOptions {
    pub fn new(min_score: f32, limit: usize) -> Self {
        Self { min_score, limit }
    }
}

/// A record paired with its similarity to the query vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityMatch {
    pub record: HistoryRecord,
    pub score: f32,
}

/// Rank `records` against `query_vector`.
///
/// Records without an embedding are skipped. Output is sorted by descending
/// score; equal scores keep their input order, so newest-first input stays
/// newest-first among ties.
pub fn rank(
    query_vector: &[f32],
    records: &[HistoryRecord],
    options: RankOptions,
) -> Vec<SimilarityMatch> {
    let mut matches: Vec<SimilarityMatch> = records
        .iter()
        .filter_map(|record| {
            let vector = record.vector()?;
            let score = cosine_similarity(query_vector, vector);
            (score > options.min_score).then(|| SimilarityMatch {
                record: record.clone(),
                score,
            })
        })
        .collect();

    // Vec::sort_by is stable
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(options.limit);

    tracing::trace!(
        "Ranked {} records, {} above {:.2}",
        records.len(),
        matches.len(),
        options.min_score
    );

    matches
}
