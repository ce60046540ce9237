use std::sync::Arc;

use askplot_core::pipeline::AskPipeline;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AskPipeline>,
}

impl AppState {
    pub fn new(pipeline: AskPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
