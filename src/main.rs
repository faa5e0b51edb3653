use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hrserve::cli::{Cli, Commands};
use hrserve::config::{AppConfig, LogFormat, LoggingConfig};

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter().into());
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve {
            port,
            host,
            model_uri,
        } => {
            hrserve::cli::serve(config, port, host, model_uri).await?;
        }
        Commands::Predict { input, model_uri } => {
            hrserve::cli::predict(config, input, model_uri).await?;
        }
        Commands::Fit {
            input,
            state_out,
            output,
            drop_ignored,
            reset_index,
        } => {
            hrserve::cli::fit(config, input, state_out, output, drop_ignored, reset_index).await?;
        }
        Commands::Transform {
            input,
            state,
            output,
            drop_ignored,
            reset_index,
            with_target,
        } => {
            hrserve::cli::transform(
                config,
                input,
                state,
                output,
                drop_ignored,
                reset_index,
                with_target,
            )
            .await?;
        }
        Commands::Info { model_uri } => {
            hrserve::cli::info(config, model_uri).await?;
        }
        Commands::Publish {
            artifact,
            name,
            alias,
        } => {
            hrserve::cli::publish(config, artifact, name, alias).await?;
        }
    }

    Ok(())
}
