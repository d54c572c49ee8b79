use crate::util::normalize_ext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Files `<stem>.<ext>` present in `output_dir`, keyed by extension (no dot).
///
/// A missing file is not an error: the engine may emit a subset of what was
/// asked for.
pub fn inspect_outputs<S: AsRef<str>>(
    output_dir: &Path,
    stem: &str,
    extensions: &[S],
) -> BTreeMap<String, GeneratedFile> {
    let mut files = BTreeMap::new();
    for ext in extensions {
        let ext = normalize_ext(ext.as_ref());
        if ext.is_empty() || files.contains_key(&ext) {
            continue;
        }
        let path = output_dir.join(format!("{stem}.{ext}"));
        let Ok(meta) = std::fs::metadata(&path) else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let path = path
            .canonicalize()
            .or_else(|_| std::path::absolute(&path))
            .unwrap_or(path);
        debug!("output {} ({} bytes)", path.display(), meta.len());
        files.insert(
            ext,
            GeneratedFile {
                path,
                size: meta.len(),
            },
        );
    }
    files
}

/// Fixed candidates, optionally followed by requested formats not already
/// in the list.
pub fn candidate_set(fixed: &[String], requested: &[String], include_requested: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let extra: &[String] = if include_requested { requested } else { &[] };
    for ext in fixed.iter().chain(extra) {
        let ext = normalize_ext(ext);
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}
