// src/chunker.rs

use tracing::info;

use crate::error::{AppError, Result};
use crate::tokenizer::TokenCounter;

/// A bounded contiguous slice of the source text. Immutable once created;
/// the produced sequence preserves source order and is never merged or
/// reordered afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub token_count: usize,
    pub char_count: usize,
}

/// Splits `text` into chunks that fit within `token_limit` tokens.
///
/// Greedy line-wise bin packing in a single left-to-right pass: lines keep
/// their terminators, the current buffer is flushed before a line that
/// would overflow it, and a line that alone exceeds the limit is emitted
/// as its own single-line chunk rather than dropped. Concatenating the
/// returned chunk texts reproduces `text` exactly.
pub fn chunk(text: &str, token_limit: usize, counter: &dyn TokenCounter) -> Result<Vec<Chunk>> {
    if token_limit == 0 {
        return Err(AppError::Config(
            "chunk token limit must be greater than zero".to_string(),
        ));
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = String::new();
    let mut current_tokens = 0usize;

    for line in text.split_inclusive('\n') {
        let line_tokens = counter.count(line);

        if !current.is_empty() && current_tokens + line_tokens > token_limit {
            flush(&mut chunks, &mut current, &mut current_tokens, token_limit);
        }

        if line_tokens > token_limit {
            // Unsplittable oversized line: emit immediately, bypassing the
            // buffer. The budget is knowingly exceeded for this one chunk.
            let chunk = Chunk {
                token_count: line_tokens,
                char_count: line.chars().count(),
                text: line.to_string(),
            };
            info!(
                chunk.index = chunks.len() + 1,
                chunk.tokens = chunk.token_count,
                chunk.chars = chunk.char_count,
                chunk.limit = token_limit,
                "chunk finalized (single-line overflow)"
            );
            chunks.push(chunk);
            continue;
        }

        current.push_str(line);
        current_tokens += line_tokens;
    }

    flush(&mut chunks, &mut current, &mut current_tokens, token_limit);
    Ok(chunks)
}

fn flush(chunks: &mut Vec<Chunk>, buffer: &mut String, tokens: &mut usize, token_limit: usize) {
    if buffer.is_empty() {
        return;
    }
    let text = std::mem::take(buffer);
    let chunk = Chunk {
        token_count: *tokens,
        char_count: text.chars().count(),
        text,
    };
    *tokens = 0;
    info!(
        chunk.index = chunks.len() + 1,
        chunk.tokens = chunk.token_count,
        chunk.chars = chunk.char_count,
        chunk.limit = token_limit,
        "chunk finalized"
    );
    chunks.push(chunk);
}
