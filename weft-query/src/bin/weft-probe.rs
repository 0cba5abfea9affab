//! weft-probe: run one operation against the demo fixtures.
//!
//! Usage: `weft-probe [--config <path>] <operation> [json-args]`

use serde_json::Value;
use std::process::ExitCode;
use weft_fixtures::FixtureSet;
use weft_query::{init_tracing, select_transport, ClientConfig, ConfigError, QueryClient, TelemetryError};

#[derive(Debug, thiserror::Error)]
enum ProbeError {
    #[error("usage: weft-probe [--config <path>] <operation> [json-args]")]
    Usage,
    #[error("Invalid JSON arguments: {0}")]
    Args(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Weft(#[from] weft_core::WeftError),
}

/// Positional arguments, skipping `--config <path>`.
fn positional_args() -> Vec<String> {
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            args.next();
            continue;
        }
        positional.push(arg);
    }
    positional
}

async fn run() -> Result<String, ProbeError> {
    let positional = positional_args();
    let name = positional.first().ok_or(ProbeError::Usage)?;
    let args: Value = match positional.get(1) {
        Some(raw) => serde_json::from_str(raw)?,
        None => Value::Object(Default::default()),
    };

    let config = ClientConfig::load()?;
    init_tracing(&config.logging.filter)?;

    // A command-line process never has the privileged host attached.
    let transport = select_transport(None, FixtureSet::demo(), &config.demo);
    let client = QueryClient::with_config(transport, config.cache_config());

    let result = client.call(name, args).await?;
    Ok(serde_json::to_string_pretty(&result)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
