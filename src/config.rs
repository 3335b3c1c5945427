// src/config.rs

use clap::ValueEnum;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::cli::Cli;
use crate::error::{AppError, Result};

/// API surface of the configured provider. Only the responses surface
/// carries the structured-output capability this pipeline depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ApiFlavor {
    #[default]
    Responses,
    ChatCompletions,
}

impl std::fmt::Display for ApiFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Responses => f.write_str("responses"),
            Self::ChatCompletions => f.write_str("chat-completions"),
        }
    }
}

/// Everything the pipeline needs, resolved once at startup and passed by
/// value into `run`. Core modules never read the environment or config
/// files themselves.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub hnitem: String,
    pub topic: String,
    pub api_key: SecretString,
    pub model: String,
    pub api_base: Url,
    pub hn_api_base: Url,
    pub api_flavor: ApiFlavor,
    pub max_output_tokens: u32,
    pub chunk_token_limit: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub skip_categorize: bool,
}

impl AppConfig {
    /// Builds the runtime configuration from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let max_output_tokens = cli.max_output_tokens;
        // Same heuristic as the input budget the summaries are derived from:
        // leave the model roughly 2.5 source tokens per output token.
        let chunk_token_limit = cli
            .chunk_token_limit
            .unwrap_or(max_output_tokens as usize * 5 / 2);

        let config = Self {
            hnitem: cli.hnitem.clone(),
            topic: cli.topic.clone(),
            api_key: SecretString::new(cli.api_key.clone()),
            model: cli.model.clone(),
            api_base: cli.api_base.clone(),
            hn_api_base: cli.hn_api_base.clone(),
            api_flavor: cli.api_flavor,
            max_output_tokens,
            chunk_token_limit,
            connect_timeout_secs: cli.connect_timeout_secs,
            request_timeout_secs: cli.request_timeout_secs,
            skip_categorize: cli.skip_categorize,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the caller-supplied parameters before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(AppError::Config(
                "API key is empty; set OPENAI_API_KEY or pass --key".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::Config("model name is empty".to_string()));
        }
        if self.max_output_tokens == 0 {
            return Err(AppError::Config(
                "max output tokens must be greater than zero".to_string(),
            ));
        }
        if self.chunk_token_limit == 0 {
            return Err(AppError::Config(
                "chunk token limit must be greater than zero".to_string(),
            ));
        }
        if self.hnitem.trim().is_empty() {
            return Err(AppError::Config("hnitem is empty".to_string()));
        }
        Ok(())
    }
}
