mod ranker;

pub use ranker::{rank_top_k, ScoredEntry};
