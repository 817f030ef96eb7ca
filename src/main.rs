//! # Provisioner Main Entry Point
//!
//! Runs either the HTTP function surface (`serve`) or a single
//! function invocation from the command line (`invoke`).

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use provisioner::config::ConfigLoader;
use provisioner::handlers::FunctionHandler;
use provisioner::platform::RestPlatform;
use provisioner::provisioner::Provisioner;
use provisioner::retry::RetryPolicy;
use provisioner::server::run_server;
use provisioner::telemetry;

#[derive(Parser)]
#[command(name = "provisioner", version, about = "Tenant provisioning functions for a BI platform")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP function surface
    Serve,
    /// Invoke one function locally and print the JSON response
    Invoke {
        /// Function name, e.g. `provision` or `connections/create`
        #[arg(default_value = "provision")]
        function: String,
        /// JSON-encoded event payload
        #[arg(default_value = "{}")]
        event: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    telemetry::init_tracing(&config);
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!(profile = %config.profile, config = %redacted_json, "configuration loaded");
    }

    // A missing or broken remote client is not fatal; the handler
    // answers sdk_unavailable until the configuration is fixed.
    let provisioner = match RestPlatform::from_config(&config) {
        Ok(Some(platform)) => {
            let retry = RetryPolicy::from(&config.retry);
            Some(Arc::new(Provisioner::new(Arc::new(platform), retry)))
        }
        Ok(None) => {
            tracing::warn!("platform credentials not configured; remote client disabled");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "remote client initialization failed");
            None
        }
    };
    let handler = FunctionHandler::new(provisioner, &config);

    match cli.command {
        Command::Serve => run_server(config, handler).await,
        Command::Invoke { function, event } => {
            let response = match serde_json::from_str(&event) {
                Ok(event) => handler.dispatch(&function, &event).await,
                Err(e) => json!({
                    "status": "invalid_input",
                    "projectId": "",
                    "groupEmail": "",
                    "error": format!("event is not valid JSON: {e}"),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}
