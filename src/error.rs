// src/error.rs

use thiserror::Error;

/// Fatal errors. Anything of this kind aborts the run; per-chunk trouble
/// talking to the generation API is `GenerationError` instead.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reqwest HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid Hacker News item: {0}")]
    InvalidItem(String),

    #[error("Structured output not supported: {0}")]
    StructuredOutputUnsupported(String),

    #[error("Tokenizer initialization failed: {0}")]
    TokenizerInitialization(String),
}

/// One failed call against the generation API. Recoverable: the dispatcher
/// falls back to free text and, failing that, skips the chunk; the
/// categorization pass leaves the artifact untouched.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("transport error talking to the generation API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation API returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("generation API response carried no usable payload")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, AppError>;
