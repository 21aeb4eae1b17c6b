use anyhow::Result;
use clap::{Parser, Subcommand};
use conductor_cli::{transport, Config, OrchestratorService};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "conductor")]
#[command(
    author,
    version = conductor_cli::VERSION,
    about = "Conductor - supervisor agent over tool-backed worker agents",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one query and print the response
    Ask {
        /// The query (remaining words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Use the offline keyword reasoner instead of the language model
        #[arg(long)]
        offline: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP form and query API
    Serve {
        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Use the offline keyword reasoner instead of the language model
        #[arg(long)]
        offline: bool,
    },

    /// Serve a built-in catalog as an MCP server on stdio
    Provider {
        /// Catalog name (engagement, team_management, it_staff, service_desk)
        catalog: String,
    },

    /// List the tools a configured provider offers
    Tools {
        /// Provider name from the config
        provider: String,

        /// Print the tool descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs always go to stderr; stdout carries replies and the MCP channel
    let filter = if cli.verbose {
        "conductor_cli=debug,conductor=debug"
    } else {
        "conductor_cli=info,conductor=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Provider { catalog } => {
            tracing::info!("Serving catalog '{}' on stdio", catalog);
            transport::cli::run_provider_server(&catalog).await?;
        }
        Commands::Ask {
            query,
            offline,
            json,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            transport::cli::run_ask(&config, &query.join(" "), offline, json).await?;
        }
        Commands::Serve {
            port,
            host,
            offline,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let service = OrchestratorService::from_config(&config, offline)?;
            tracing::info!("Starting HTTP server on {}:{}", host, port);
            transport::run_http_server(service, &host, port).await?;
        }
        Commands::Tools { provider, json } => {
            let config = Config::load(cli.config.as_deref())?;
            transport::cli::run_list_tools(&config, &provider, json).await?;
        }
        Commands::Config => {
            let source = cli
                .config
                .clone()
                .or_else(|| Config::config_path().filter(|p| p.exists()));
            let config = Config::load(cli.config.as_deref())?;
            transport::cli::run_show_config(&config, source.as_deref())?;
        }
    }

    Ok(())
}
