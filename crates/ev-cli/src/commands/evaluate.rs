use ev_config::EvConfig;
use ev_pipeline::{Pipeline, RunRequest};

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::EvaluateArgs;
use crate::output::output;
use crate::progress::RunProgress;
use crate::sources;

/// Handle `evd evaluate`.
pub async fn handle(
    args: &EvaluateArgs,
    mut config: EvConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    if let Some(concurrency) = args.concurrency {
        config.evaluation.concurrency = concurrency;
    }
    if let Some(top_k) = args.top_k {
        config.indexing.top_k = top_k;
    }
    config.validate()?;

    let catalog = bootstrap::load_catalog(flags)?;
    let checklist_text = sources::checklist_text(&args.source, &catalog).await?;
    let evidence = sources::evidence_paths(
        &args.evidence,
        args.source.manifest.as_deref(),
        args.source.owner.as_deref(),
    )?;

    let model = super::chat_model(&config)?;
    let embedder = super::embedding_engine(&config).await?;
    let pipeline = Pipeline::new(config, model, embedder);

    let request = RunRequest {
        checklist_text,
        evidence,
        index_cache: args.index_cache.clone(),
    };
    tracing::info!(
        documents = request.evidence.len(),
        cache = ?request.index_cache,
        "starting evaluation"
    );

    let cancel = super::cancel_on_ctrl_c();
    let progress = RunProgress::new();
    let report = match pipeline.run(request, &cancel, &progress).await {
        Ok(report) => {
            progress.finish_ok(&format!("evaluated {} items", report.summary.total));
            report
        }
        Err(error) => {
            progress.finish_err("evaluation failed");
            return Err(error.into());
        }
    };

    output(&report, flags.format)
}
