use anyhow::{anyhow, Result};
use clap::arg;
use clap::command;
use clap::Parser;
use sasl_token_provider::config::proc_validator::validate_signer_available;
use sasl_token_provider::observability::metrics::gather_text;
use sasl_token_provider::provider::global_provider;
use sasl_token_provider::sources::linked_signer;
use sasl_token_provider::utils::config_loader;
use sasl_token_provider::utils::logging;
use sasl_token_provider::utils::logging::LogLevel;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "SASL_TOKEN_CONFIG", default_value = "sasl-token.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// number of tokens to request from the provider
    #[arg(long, default_value_t = 1)]
    count: u32,
    /// dump provider metrics to stderr before exiting
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config)?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Build the provider, first fetch included
    // -------------------------------

    let signer = linked_signer();
    validate_signer_available(&service_config, signer.is_some())
        .map_err(|e| anyhow!("Invalid config format: {}", e))?;
    let provider = global_provider(&service_config, signer)
        .await
        .map_err(|e| anyhow!("could not build token provider: {}", e))?;
    info!(source = provider.source_name(), is_static = provider.is_static(), "provider ready");

    // -------------------------------
    // 3. Hand out tokens
    // -------------------------------

    for _ in 0..args.count {
        let token = provider.get_token().await?;
        println!("{}", serde_json::to_string(&token)?);
    }

    if args.metrics {
        eprint!("{}", gather_text().await);
    }

    Ok(())
}
