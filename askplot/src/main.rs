use anyhow::Result;
use askplot::cli::Cli;
use askplot::deps::Dependencies;
use askplot::{logging, server, AppState};
use askplot_core::chat::PromptTemplate;
use askplot_core::pipeline::PipelineOptions;
use async_once_cell::OnceCell;
use clap::Parser;

static DEPENDENCIES: OnceCell<Dependencies> = OnceCell::new();

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env file if present

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.log_json)?;

    let deps = DEPENDENCIES.get_or_init(Dependencies::init(&cli)).await;

    let template = match &cli.persona {
        Some(persona) => PromptTemplate::with_persona(persona.as_str()),
        None => PromptTemplate::default(),
    };
    let options = PipelineOptions { top_k: cli.top_k };
    let state = AppState::new(deps.pipeline(template, options));

    server::serve(cli.bind, state).await
}
