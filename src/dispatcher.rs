// src/dispatcher.rs

use std::io::Write;

use chrono::Local;
use tracing::{info, warn};

use crate::chunker::Chunk;
use crate::error::Result;
use crate::openai::{GenerationClient, GenerationRequest};

const TABLE_HEADER: &str = "| Participant/User name | Argument | Argument objections(keyword-style)/URLs |";
const TABLE_SEPARATOR: &str = "| --- | --- | --- |";

/// Drives the chunk sequence through the generation client, strictly in
/// order, and assembles the Markdown artifact into `out`.
///
/// Per chunk: structured call first; on success the rows are appended (the
/// table header/separator pair is written exactly once, before the first
/// row produced across the whole run). On failure the free-text fallback
/// is tried and appended verbatim below the table. If both fail the chunk
/// contributes nothing and the run continues; one chunk never aborts the
/// rest.
pub async fn run<W: Write>(
    client: &GenerationClient,
    model: &str,
    topic: &str,
    chunks: &[Chunk],
    instruction: &str,
    max_output_tokens: u32,
    out: &mut W,
) -> Result<()> {
    let date = Local::now().format("%Y-%m-%d");
    writeln!(out, "{topic}\n")?;
    writeln!(out, "## Date: {date}. LLM: {model}\n")?;

    let total = chunks.len();
    let mut header_written = false;

    for (index, chunk) in chunks.iter().enumerate() {
        let number = index + 1;
        info!(
            chunk.index = number,
            chunk.total = total,
            chunk.tokens = chunk.token_count,
            chunk.chars = chunk.char_count,
            model = %model,
            "processing chunk"
        );

        let request = GenerationRequest {
            model,
            system_instruction: instruction,
            user_content: &chunk.text,
            max_output_tokens,
        };

        match client.generate_structured(&request).await {
            Ok(summary) => {
                if !header_written {
                    writeln!(out, "{TABLE_HEADER}")?;
                    writeln!(out, "{TABLE_SEPARATOR}")?;
                    header_written = true;
                }
                for entry in &summary.summaries {
                    writeln!(
                        out,
                        "| {} | {} | {} |",
                        escape_pipes(&entry.participant),
                        escape_pipes(&entry.argument),
                        escape_pipes(&entry.urls),
                    )?;
                }
            }
            Err(error) => {
                warn!(
                    chunk.index = number,
                    error = %error,
                    "structured generation failed, trying text fallback"
                );
                match client.generate_text(&request).await {
                    Ok(text) => writeln!(out, "{text}")?,
                    Err(fallback_error) => warn!(
                        chunk.index = number,
                        error = %fallback_error,
                        "fallback generation also failed, chunk skipped"
                    ),
                }
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// Escapes literal pipes so field values cannot break the table columns.
fn escape_pipes(field: &str) -> String {
    field.replace('|', "\\|")
}
