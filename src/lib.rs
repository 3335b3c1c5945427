// src/lib.rs

pub mod categorize;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod openai;
pub mod paths;
pub mod thread;
pub mod tokenizer;

use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;

use tracing::info;

use crate::openai::GenerationClient;

// Re-export key types for convenience.
pub use config::{ApiFlavor, AppConfig};
pub use error::{AppError, GenerationError, Result};

/// Runs the whole pipeline: download and flatten the thread, chunk it,
/// summarize chunk by chunk into the Markdown artifact, then categorize
/// the assembled arguments in a second pass. Returns the artifact path.
pub async fn run(config: AppConfig) -> Result<PathBuf> {
    config.validate()?;
    // Fatal before any chunk is touched: a provider without structured
    // output must not produce a silently degraded artifact.
    GenerationClient::ensure_structured_output_support(&config)?;

    paths::ensure_directories()?;

    let thread_ref = thread::normalize_item(&config.hnitem)?;
    let topic_line = format!(
        "# HN Topic: [{}]({}), (hnitem id {}), and discussion",
        config.topic, thread_ref.url, thread_ref.id
    );
    let slug = paths::topic_slug(&config.topic, &thread_ref.url);
    let intermediate = paths::intermediate_path(&slug, &config.model);
    let artifact = paths::artifact_path(&slug, &config.model);

    let client = GenerationClient::new(&config)?;

    if intermediate.exists() {
        info!(file = %intermediate.display(), "intermediate file already exists, skipping download");
    } else {
        thread::download_thread(client.http(), &config.hn_api_base, &thread_ref.id, &intermediate)
            .await?;
    }

    let text = fs::read_to_string(&intermediate)?;
    info!(
        file = %intermediate.display(),
        chars = text.chars().count(),
        "read flattened thread"
    );

    let instruction_file = paths::instruction_path();
    let instruction = fs::read_to_string(&instruction_file).map_err(|e| {
        AppError::Config(format!(
            "cannot read instruction file '{}': {e}",
            instruction_file.display()
        ))
    })?;

    let counter = tokenizer::resolve(&config.model)?;
    let chunks = chunker::chunk(&text, config.chunk_token_limit, &counter)?;
    info!(
        chunk.count = chunks.len(),
        chunk.limit = config.chunk_token_limit,
        "input chunked"
    );

    {
        let file = fs::File::create(&artifact)?;
        let mut out = BufWriter::new(file);
        dispatcher::run(
            &client,
            &config.model,
            &topic_line,
            &chunks,
            &instruction,
            config.max_output_tokens,
            &mut out,
        )
        .await?;
    }

    if config.skip_categorize {
        info!(artifact = %artifact.display(), "skipping categorization pass");
        return Ok(artifact);
    }

    categorize::categorize_arguments(&client, &config.model, &artifact, config.max_output_tokens)
        .await
}
