use anyhow::Context;
use ev_config::EvConfig;
use ev_embeddings::EmbeddingEngine;
use ev_llm::OpenAiChat;
use tokio_util::sync::CancellationToken;

use crate::bootstrap;
use crate::cli::{Commands, GlobalFlags};

pub mod checklist;
pub mod evaluate;
pub mod index;
pub mod programs;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Programs => programs::handle(&bootstrap::load_catalog(flags)?, flags),
        Commands::Evaluate(args) => evaluate::handle(&args, bootstrap::load_config(flags)?, flags).await,
        Commands::Checklist(args) => {
            checklist::handle(&args, &bootstrap::load_config(flags)?, flags).await
        }
        Commands::Index(args) => index::handle(&args, &bootstrap::load_config(flags)?, flags).await,
    }
}

fn chat_model(config: &EvConfig) -> anyhow::Result<OpenAiChat> {
    let llm = config
        .require_llm()
        .context("set EVIDENTIA_LLM__API_KEY or llm.api_key in .evidentia/config.toml")?;
    Ok(OpenAiChat::from_config(llm)?)
}

/// Build the configured embedding engine off the async runtime; the local
/// model may be downloaded on first use.
async fn embedding_engine(config: &EvConfig) -> anyhow::Result<EmbeddingEngine> {
    let embedding = config.embedding.clone();
    let llm = config.llm.clone();
    let engine = tokio::task::spawn_blocking(move || EmbeddingEngine::from_config(&embedding, &llm))
        .await
        .context("embedding engine initialization panicked")??;
    Ok(engine)
}

/// A token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            trigger.cancel();
        }
    });
    token
}
