//! Output directory writer.
//!
//! Every file is written create-or-overwrite through a temp file and a
//! rename, so a reader never sees a half-written document.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use assigngen_shared::{AssignGenError, Query, RenderedDocument, Result, RunId, SearchResult};

use crate::render::DocumentRenderer;

/// Newline-delimited list of resolved URLs.
pub const URL_INDEX_FILE: &str = "urls.txt";

/// Per-run manifest written after every other file.
pub const MANIFEST_FILE: &str = "run.json";

/// A file written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedFile {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

impl PersistedFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Write `content` to `dir/filename`, creating `dir` if needed.
pub fn write_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PersistedFile> {
    std::fs::create_dir_all(dir).map_err(|e| AssignGenError::persist(dir, e))?;

    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, content).map_err(|e| AssignGenError::persist(&temp, e))?;
    if let Err(e) = std::fs::rename(&temp, &target) {
        let _ = std::fs::remove_file(&temp);
        return Err(AssignGenError::persist(&target, e));
    }

    debug!(path = %target.display(), bytes = content.len(), "wrote output file");

    Ok(PersistedFile {
        path: target,
        sha256: compute_hash(content),
        size_bytes: content.len(),
    })
}

/// Render `doc` and save it as `<topic>_<marker>.<ext>`.
#[instrument(skip_all, fields(topic = %topic, marker = marker))]
pub fn write_document(
    dir: &Path,
    topic: &Query,
    marker: &str,
    renderer: &dyn DocumentRenderer,
    doc: &RenderedDocument,
) -> Result<PersistedFile> {
    let bytes = renderer.render(doc)?;
    let name = document_file_name(topic, marker, renderer.extension());
    write_file(dir, &name, &bytes)
}

/// Save the resolved URLs, one per line, in resolution order.
pub fn write_url_index(dir: &Path, urls: &[SearchResult]) -> Result<PersistedFile> {
    let content: String = urls.iter().map(|u| format!("{u}\n")).collect();
    write_file(dir, URL_INDEX_FILE, content.as_bytes())
}

// ---------------------------------------------------------------------------
// Run manifest
// ---------------------------------------------------------------------------

/// Contents of `run.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub topic: String,
    pub urls: Vec<String>,
    pub files: Vec<ManifestFile>,
    pub scrape_failures: usize,
    pub translation_fallbacks: usize,
    pub corpus_chars: usize,
    pub completed_at: DateTime<Utc>,
}

/// Checksum entry for one output file.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestFile {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

impl From<&PersistedFile> for ManifestFile {
    fn from(file: &PersistedFile) -> Self {
        Self {
            filename: file.file_name(),
            sha256: file.sha256.clone(),
            size_bytes: file.size_bytes,
        }
    }
}

pub fn write_manifest(dir: &Path, manifest: &RunManifest) -> Result<PersistedFile> {
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| AssignGenError::Render(format!("failed to serialize run manifest: {e}")))?;
    write_file(dir, MANIFEST_FILE, json.as_bytes())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `<topic>_<marker>.<ext>` with file-system-hostile characters replaced.
pub fn document_file_name(topic: &Query, marker: &str, extension: &str) -> String {
    format!(
        "{}_{}.{extension}",
        sanitize_file_stem(topic.as_str()),
        sanitize_file_stem(marker)
    )
}

/// Replace path separators, reserved and control characters with `_`.
pub fn sanitize_file_stem(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // A stem of only dots would name the directory itself or its parent.
    if cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}

/// Compute SHA-256 hash of content.
fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
