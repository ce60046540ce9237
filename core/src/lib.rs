//! Core library for Askplot.
//!
//! Holds the collaborator traits ([`embedding::Embedder`], [`corpus::CorpusReader`],
//! [`chat::ChatModel`]), the similarity scoring and top-k ranking over a fetched corpus, prompt
//! assembly, and the [`pipeline::AskPipeline`] that sequences them for a single question.

pub mod chat;
pub mod corpus;
pub mod embedding;
pub mod pipeline;
pub mod retrieval;
