// src/tokenizer.rs

use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Deterministic token counting for a single model. Implementations carry
/// no mutable state after construction.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Tiktoken-backed counter for OpenAI models.
pub struct TiktokenCounter {
    bpe: CoreBPE,
    encoding: &'static str,
}

impl TiktokenCounter {
    /// Name of the encoding actually in use, for diagnostics.
    pub fn encoding(&self) -> &'static str {
        self.encoding
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Resolves the counting strategy for `model`. Unknown models never fail
/// resolution: any lookup miss falls back to the `cl100k_base` encoding.
/// Only a broken fallback load is an error.
pub fn resolve(model: &str) -> Result<TiktokenCounter> {
    match tiktoken_rs::get_bpe_from_model(model) {
        Ok(bpe) => {
            debug!(model = %model, "resolved model-specific tokenizer");
            Ok(TiktokenCounter {
                bpe,
                encoding: "model-specific",
            })
        }
        Err(e) => {
            warn!(model = %model, error = %e, "no tokenizer mapping for model, falling back to cl100k_base");
            let bpe = tiktoken_rs::cl100k_base()
                .map_err(|e| AppError::TokenizerInitialization(e.to_string()))?;
            Ok(TiktokenCounter {
                bpe,
                encoding: "cl100k_base",
            })
        }
    }
}
