use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Evaluate evidence documents against a compliance checklist.
    Evaluate(EvaluateArgs),
    /// Extract a structured checklist without evaluating it.
    Checklist(ChecklistArgs),
    /// Build an evidence index snapshot for later runs.
    Index(IndexArgs),
    /// List compliance programs with a starter checklist.
    Programs,
}

/// Where the raw checklist text comes from.
///
/// `--manifest` also contributes the owner's evidence documents to
/// `evaluate` and `index`.
#[derive(Clone, Debug, Default, Args)]
pub struct SourceArgs {
    /// Checklist document (.txt, .md or .pdf).
    #[arg(long, conflicts_with = "program")]
    pub checklist: Option<PathBuf>,

    /// Compliance program whose starter checklist to use (name or short code).
    #[arg(long)]
    pub program: Option<String>,

    /// JSON document manifest of uploaded checklists and evidence.
    #[arg(long, requires = "owner")]
    pub manifest: Option<PathBuf>,

    /// Owner whose manifest documents to use.
    #[arg(long, requires = "manifest")]
    pub owner: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Evidence documents to evaluate against.
    #[arg(short, long, num_args = 1..)]
    pub evidence: Vec<PathBuf>,

    /// Evidence index snapshot to reuse when fresh and refresh otherwise.
    #[arg(long)]
    pub index_cache: Option<PathBuf>,

    /// Override `evaluation.concurrency`.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Override `indexing.top_k`.
    #[arg(long)]
    pub top_k: Option<usize>,
}

#[derive(Clone, Debug, Args)]
pub struct ChecklistArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Clone, Debug, Args)]
pub struct IndexArgs {
    /// Evidence documents to index.
    #[arg(short, long, num_args = 1..)]
    pub evidence: Vec<PathBuf>,

    /// JSON document manifest to take evidence from.
    #[arg(long, requires = "owner")]
    pub manifest: Option<PathBuf>,

    /// Owner whose manifest evidence to index.
    #[arg(long, requires = "manifest")]
    pub owner: Option<String>,

    /// Snapshot file to write.
    #[arg(short, long)]
    pub out: PathBuf,
}
