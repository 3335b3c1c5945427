// src/cli.rs

use clap::Parser;
use url::Url;

use crate::config::ApiFlavor;

#[derive(Parser, Debug)]
#[command(
    name = "hn-digest",
    version,
    about = "Summarize Hacker News discussion threads with OpenAI structured outputs",
    long_about = "Downloads a Hacker News discussion thread, flattens the comment tree, \
splits it into token-bounded chunks, summarizes each chunk into a Markdown argument \
table via the OpenAI Responses API, and runs a second pass that groups the extracted \
arguments into categories."
)]
pub struct Cli {
    /// Hacker News item URL, or bare item id, e.g. 39577113
    #[arg(long)]
    pub hnitem: String,

    /// Topic of the discussion
    #[arg(long, default_value = "Hacker news thread")]
    pub topic: String,

    /// OpenAI API key. Put it in .env or pass it on the command line
    #[arg(long = "key", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Model to use, e.g. "gpt-4o", "gpt-4o-mini"
    #[arg(long, default_value = "gpt-4o-mini")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, default_value = "https://api.openai.com/", env = "OPENAI_BASE_URL")]
    pub api_base: Url,

    /// Base URL of the Hacker News (Algolia) API
    #[arg(long, default_value = "https://hn.algolia.com/", env = "HN_API_BASE_URL")]
    pub hn_api_base: Url,

    /// API surface to talk to; only "responses" supports structured output
    #[arg(long, value_enum, default_value_t = ApiFlavor::Responses)]
    pub api_flavor: ApiFlavor,

    /// Maximum tokens per model response
    #[arg(long, default_value_t = 5000)]
    pub max_output_tokens: u32,

    /// Token budget per input chunk; defaults to 2.5x max-output-tokens
    #[arg(long)]
    pub chunk_token_limit: Option<usize>,

    /// HTTP connect timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Skip the second pass that groups arguments into categories
    #[arg(long)]
    pub skip_categorize: bool,

    /// Log level
    #[arg(short, long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
