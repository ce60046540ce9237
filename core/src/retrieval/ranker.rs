use serde::{Deserialize, Serialize};

use crate::{corpus::CorpusEntry, embedding::{Embedding, SimilarityError}};

/// A corpus passage with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// Scores every entry against `query` and returns the `k` most similar, best first.
///
/// This is a linear scan over the whole corpus. Entries with equal scores keep their fetch
/// order. Fails on the first entry whose embedding dimension differs from the query's.
pub fn rank_top_k(query: &Embedding, entries: &[CorpusEntry], k: usize) -> Result<Vec<ScoredEntry>, SimilarityError> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut scored = entries.iter()
        .map(|entry| {
            let score = query.similarity(&entry.embedding)?;
            Ok(ScoredEntry {
                id: entry.id.clone(),
                text: entry.text.clone(),
                score,
            })
        })
        .collect::<Result<Vec<_>, SimilarityError>>()?;

    // `sort_by` is stable, so ties stay in fetch order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    Ok(scored)
}
