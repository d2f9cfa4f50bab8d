//! `satip-finder` binary entrypoint: parse arguments, fetch the device
//! descriptor, start every requested tuner, and block until a termination
//! signal arrives.

use clap::Parser;
use satip_finder::cli::{Args, parse_tune_spec};
use satip_finder::config::RuntimeConfig;
use satip_finder::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let channels = match args
        .tune
        .iter()
        .enumerate()
        .map(|(index, spec)| parse_tune_spec(spec, index))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(channels) => channels,
        Err(err) => {
            tracing::error!(error = %err, "invalid --tune spec");
            return std::process::ExitCode::FAILURE;
        }
    };

    let orchestrator =
        match Orchestrator::start(&args.server_descriptor_url, channels, RuntimeConfig::default())
            .await
        {
            Ok(orchestrator) => orchestrator,
            Err(err) => {
                tracing::error!(error = %err, "failed to start tuners");
                return std::process::ExitCode::FAILURE;
            }
        };

    match orchestrator.run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "fatal error while running");
            std::process::ExitCode::FAILURE
        }
    }
}
