// src/paths.rs

use std::fs;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::Result;

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid regex"));

/// Directories the pipeline expects under the working directory.
const SUBDIRECTORIES: [&str; 4] = ["data", "final_output", "input", "output"];

/// Creates the working subdirectories, warning about unwritable ones.
pub fn ensure_directories() -> Result<()> {
    for directory in SUBDIRECTORIES {
        fs::create_dir_all(directory)?;
        let metadata = fs::metadata(directory)?;
        if metadata.permissions().readonly() {
            warn!(directory = directory, "directory is not writable");
        }
    }
    Ok(())
}

/// Filesystem-safe slug for output file names: topic and item URL joined,
/// every non-word run replaced by a dash.
pub fn topic_slug(topic: &str, item_url: &str) -> String {
    NON_WORD_RE
        .replace_all(&format!("{topic}-{item_url}"), "-")
        .into_owned()
}

/// Where the flattened thread XML lands.
pub fn intermediate_path(slug: &str, model: &str) -> PathBuf {
    PathBuf::from("output").join(format!("{slug}-{model}.xml"))
}

/// Where the final Markdown artifact lands.
pub fn artifact_path(slug: &str, model: &str) -> PathBuf {
    PathBuf::from("final_output").join(format!("{slug}-{model}.md"))
}

/// The per-run system instruction file.
pub fn instruction_path() -> PathBuf {
    PathBuf::from("input").join("instruction.txt")
}
