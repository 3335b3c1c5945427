// src/main.rs

use hn_digest::cli::Cli;
use hn_digest::{run, AppConfig, AppError};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // .env is optional; real environment variables win.
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.json_logs {
        let json_layer = fmt::layer().json().with_current_span(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }

    let config = AppConfig::from_cli(&cli)?;
    info!(
        model = %config.model,
        hnitem = %config.hnitem,
        chunk.limit = config.chunk_token_limit,
        "starting hn-digest"
    );

    let artifact = run(config).await.map_err(|e| {
        error!(error = %e, "run failed");
        e
    })?;

    info!(artifact = %artifact.display(), "digest complete");
    Ok(())
}
