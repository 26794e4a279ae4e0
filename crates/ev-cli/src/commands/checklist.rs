use std::sync::Arc;

use ev_config::EvConfig;
use ev_llm::StructuredInference;
use ev_pipeline::{ChecklistBuilder, PipelineError};

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::ChecklistArgs;
use crate::output::output;
use crate::progress::Progress;
use crate::sources;

/// Handle `evd checklist`: extract and print the structured checklist.
pub async fn handle(args: &ChecklistArgs, config: &EvConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let catalog = bootstrap::load_catalog(flags)?;
    let raw_text = sources::checklist_text(&args.source, &catalog).await?;

    let model = super::chat_model(config)?;
    let builder = ChecklistBuilder::new(Arc::new(StructuredInference::configured(model, config)));
    let cancel = super::cancel_on_ctrl_c();

    let progress = Progress::spinner("extracting checklist");
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(PipelineError::Cancelled),
        result = builder.build(&raw_text) => result,
    };
    let checklist = match result {
        Ok(checklist) => {
            progress.finish_ok(&format!("extracted {} items", checklist.len()));
            checklist
        }
        Err(error) => {
            progress.finish_err("checklist extraction failed");
            return Err(error.into());
        }
    };

    output(&checklist, flags.format)
}
