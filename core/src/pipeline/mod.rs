mod ask;
mod error;

pub use ask::{AskOutcome, AskPipeline, AskStage, PipelineOptions, DEFAULT_TOP_K};
pub use error::AskError;
