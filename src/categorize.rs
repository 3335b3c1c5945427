// src/categorize.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::openai::{GenerationClient, GenerationRequest};

/// Marker line the category block is anchored to.
const HEADER_MARKER: &str = "## Date:";

const CATEGORIZATION_PROMPT: &str = "\
Group the arguments from the table into meaningful categories. Invent your own categories. Output only those proposed new categories.

Format your response as:

Here are proposed categories for organizing the arguments:

1. Category Name
- Sub-point about what this category covers
- Another sub-point

2. Another Category Name
- Sub-point
- Another sub-point

(continue for all categories)";

/// Second pass: reads the assembled artifact, asks the model for category
/// groupings over the whole table, and splices the result in right after
/// the date/model header line, bracketed by blank lines.
///
/// A failed or empty generation leaves the artifact untouched; this pass is
/// never fatal to the run. Re-running it against an already-categorized
/// artifact inserts a second block after the same marker.
pub async fn categorize_arguments(
    client: &GenerationClient,
    model: &str,
    artifact: &Path,
    max_output_tokens: u32,
) -> Result<PathBuf> {
    info!(artifact = %artifact.display(), "starting second pass: categorizing arguments");

    let content = fs::read_to_string(artifact)?;
    let request = GenerationRequest {
        model,
        system_instruction: CATEGORIZATION_PROMPT,
        user_content: &content,
        max_output_tokens,
    };

    let categories = match client.generate_text(&request).await {
        Ok(text) => text,
        Err(error) => {
            warn!(error = %error, "categorization produced no result, artifact left unmodified");
            return Ok(artifact.to_path_buf());
        }
    };

    let updated = insert_after_marker(&content, &categories);
    match updated {
        Some(updated) => {
            fs::write(artifact, updated)?;
            info!(artifact = %artifact.display(), "categories inserted");
        }
        None => {
            warn!(marker = HEADER_MARKER, "no header marker line found, categories not inserted");
        }
    }

    Ok(artifact.to_path_buf())
}

/// Inserts `block` after the first line starting with the header marker,
/// surrounded by blank lines. Returns `None` when no line matches.
fn insert_after_marker(content: &str, block: &str) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut inserted = false;

    for line in content.split('\n') {
        lines.push(line.to_string());
        if !inserted && line.starts_with(HEADER_MARKER) {
            lines.push(String::new());
            lines.push(block.to_string());
            lines.push(String::new());
            inserted = true;
        }
    }

    inserted.then(|| lines.join("\n"))
}
