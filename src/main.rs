//! # App Secrets Controller
//!
//! A Kubernetes controller that resolves the secrets each `Application`
//! declares, generating whatever does not exist yet, and projects them into
//! the application's target namespace.
//!
//! ## Usage
//!
//! ```bash
//! # Run the controller (default)
//! app-secrets-controller
//!
//! # Print the Application CRD
//! app-secrets-controller crd | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use app_secrets_controller::config::ControllerConfig;
use app_secrets_controller::crd::Application;
use app_secrets_controller::runtime::{initialize, run_watch_loop};
use clap::{Parser, Subcommand};
use kube::core::CustomResourceExt;

/// App Secrets Controller
#[derive(Parser)]
#[command(name = "app-secrets-controller", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller
    Run,
    /// Print the Application CustomResourceDefinition as YAML
    Crd,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let init = initialize(ControllerConfig::from_env()).await?;
            run_watch_loop(init).await
        }
        Commands::Crd => {
            let yaml = serde_yaml::to_string(&Application::crd())
                .context("Failed to serialize CRD")?;
            print!("{yaml}");
            Ok(())
        }
    }
}
