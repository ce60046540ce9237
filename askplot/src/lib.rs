//! HTTP front end for question answering over a plot-summary corpus.
//!
//! The binary wires the Gemini embedder and generative model and a Firestore (or file backed)
//! corpus into an [`askplot_core::pipeline::AskPipeline`] and serves it on `POST /api/ask`.

pub mod cli;
pub mod deps;
pub mod error;
pub mod logging;
pub mod routes;
pub mod server;
pub mod state;

pub use state::AppState;
