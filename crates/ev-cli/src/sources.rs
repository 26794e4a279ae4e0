//! Resolve checklist text and evidence paths from command-line sources.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ev_core::{DocumentKind, DocumentManifest};
use ev_pipeline::ProgramCatalog;

use crate::cli::root_commands::SourceArgs;

/// Raw checklist text from `--checklist`, `--program`, or the owner's most
/// recent checklist upload in `--manifest`, in that order.
pub async fn checklist_text(source: &SourceArgs, catalog: &ProgramCatalog) -> anyhow::Result<String> {
    if let Some(path) = &source.checklist {
        return read_document(path).await;
    }
    if let Some(name) = &source.program {
        return Ok(catalog.get(name)?.checklist.clone());
    }
    if let (Some(manifest), Some(owner)) = (&source.manifest, &source.owner) {
        let latest = load_manifest(manifest)?
            .paths_for(owner, DocumentKind::Checklist)
            .pop()
            .with_context(|| format!("manifest has no checklist document for owner '{owner}'"))?;
        return read_document(&latest).await;
    }
    anyhow::bail!("no checklist given: pass --checklist, --program, or --manifest with --owner")
}

/// `explicit` paths followed by the owner's manifest evidence, without
/// duplicates.
pub fn evidence_paths(
    explicit: &[PathBuf],
    manifest: Option<&Path>,
    owner: Option<&str>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = explicit.to_vec();
    if let (Some(manifest), Some(owner)) = (manifest, owner) {
        for path in load_manifest(manifest)?.paths_for(owner, DocumentKind::Evidence) {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    if paths.is_empty() {
        anyhow::bail!("no evidence documents given: pass --evidence or --manifest with --owner");
    }
    Ok(paths)
}

fn load_manifest(path: &Path) -> anyhow::Result<DocumentManifest> {
    DocumentManifest::from_path(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))
}

async fn read_document(path: &Path) -> anyhow::Result<String> {
    let document = ev_index::loader::load_document_blocking(path.to_path_buf())
        .await
        .with_context(|| format!("failed to read checklist {}", path.display()))?;
    Ok(document.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn manifest(dir: &Path) -> PathBuf {
        let old = write(dir, "old.txt", "1. Old requirement.");
        let new = write(dir, "new.txt", "1. Encrypt backups.");
        let evidence = write(dir, "report.txt", "Backups are encrypted.");
        let other = write(dir, "other.txt", "Someone else's upload.");
        let records = serde_json::json!([
            { "path": old, "type": "checklist", "owner": "alice" },
            { "path": evidence, "type": "evidence", "owner": "alice" },
            { "path": new, "type": "checklist", "owner": "alice" },
            { "path": other, "type": "evidence", "owner": "bob" },
        ]);
        write(dir, "manifest.json", &records.to_string())
    }

    #[tokio::test]
    async fn program_source_uses_catalog_template() {
        let source = SourceArgs {
            program: Some("hipaa".into()),
            ..SourceArgs::default()
        };
        let catalog = ProgramCatalog::builtin();
        let text = checklist_text(&source, &catalog).await.unwrap();
        assert_eq!(text, catalog.get("HIPAA").unwrap().checklist);
    }

    #[tokio::test]
    async fn file_source_reads_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "list.md", "1. Log access.\n2. Review logs.");
        let source = SourceArgs {
            checklist: Some(path),
            ..SourceArgs::default()
        };
        let text = checklist_text(&source, &ProgramCatalog::builtin()).await.unwrap();
        assert_eq!(text, "1. Log access.\n2. Review logs.");
    }

    #[tokio::test]
    async fn manifest_source_takes_latest_checklist_for_owner() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceArgs {
            manifest: Some(manifest(dir.path())),
            owner: Some("alice".into()),
            ..SourceArgs::default()
        };
        let text = checklist_text(&source, &ProgramCatalog::builtin()).await.unwrap();
        assert_eq!(text, "1. Encrypt backups.");
    }

    #[tokio::test]
    async fn missing_source_is_an_error() {
        let result = checklist_text(&SourceArgs::default(), &ProgramCatalog::builtin()).await;
        assert!(result.is_err());
    }

    #[test]
    fn evidence_merges_explicit_and_manifest_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = manifest(dir.path());
        let report = dir.path().join("report.txt");
        let extra = write(dir.path(), "extra.txt", "More evidence.");

        let paths =
            evidence_paths(&[extra.clone(), report.clone()], Some(&manifest), Some("alice")).unwrap();
        assert_eq!(paths, vec![extra, report]);
    }

    #[test]
    fn no_evidence_is_an_error() {
        assert!(evidence_paths(&[], None, None).is_err());
    }
}
