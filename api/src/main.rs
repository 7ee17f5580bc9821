use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use librarian_api::{app, config::ServerConfig, observability::Observability, state::AppState};
use librarian_core::{ActorKind, CrossValidatorKind, InputMode, Librarian, LibrarianConfig, ValidatorKind};

#[derive(Parser)]
#[command(name = "librarian")]
#[command(about = "Configurable intake service: validate labels and data, then store them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Launch {
        /// Load environment variables from this file before reading the config
        #[arg(long)]
        dotenv: Option<PathBuf>,

        /// Read the configuration from a JSON file instead of the environment
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use the debug defaults: no validation, print-only actors
        #[arg(long)]
        test: bool,

        /// Override LIBRARIAN_HOST
        #[arg(long)]
        host: Option<String>,

        /// Override PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// List the available input types, validators and actors
    Describe {
        #[arg(long)]
        inputs: bool,

        #[arg(long)]
        validators: bool,

        #[arg(long)]
        xvalidators: bool,

        #[arg(long)]
        actors: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Launch {
            dotenv,
            config,
            test,
            host,
            port,
        } => launch(dotenv, config, test, host, port).await,
        Commands::Describe {
            inputs,
            validators,
            xvalidators,
            actors,
        } => {
            describe(inputs, validators, xvalidators, actors);
            Ok(())
        }
    }
}

async fn launch(
    dotenv_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    test: bool,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    // Load environment variables
    match &dotenv_file {
        Some(path) => {
            dotenv::from_path(path).with_context(|| format!("Failed to load {}", path.display()))?;
        }
        None => {
            dotenv::dotenv().ok();
        }
    }

    let obs = Observability::init()?;

    let config = if test {
        tracing::info!("Using debug defaults");
        LibrarianConfig::debug_defaults()
    } else if let Some(path) = &config_file {
        LibrarianConfig::from_json_file(path)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?
    } else {
        LibrarianConfig::from_env().context("Invalid configuration in environment")?
    };

    let librarian = Librarian::from_config(&config)
        .await
        .context("Failed to set up validators and actors")?;

    let mut server = ServerConfig::from_env()?;
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }

    let state = AppState::new(librarian, obs.registry, server.homepage.clone());
    let app = app(state, &server);

    let addr = server.socket_addr()?;
    tracing::info!("Librarian listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn describe(inputs: bool, validators: bool, xvalidators: bool, actors: bool) {
    if !(inputs || validators || xvalidators || actors) {
        println!("Choose what to describe:");
        println!("  --inputs       input types");
        println!("  --validators   label and data validators");
        println!("  --xvalidators  cross validators");
        println!("  --actors       actors");
        return;
    }
    if inputs {
        for mode in InputMode::SUPPORTED {
            println!("'{}': {}", mode, mode.describe());
        }
    }
    if validators {
        for kind in ValidatorKind::ALL {
            println!("'{}': {}", kind.tag(), kind.describe());
        }
    }
    if xvalidators {
        for kind in CrossValidatorKind::ALL {
            println!("'{}': {}", kind.tag(), kind.describe());
        }
    }
    if actors {
        for kind in ActorKind::ALL {
            println!("'{}': {}", kind.tag(), kind.describe());
        }
    }
}
