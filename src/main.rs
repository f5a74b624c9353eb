use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use webclient::config::Config;
use webclient::{ServerDirectoryService, WebclientError};

/// Query the game server directory and print listings as JSON
#[derive(Parser, Debug)]
#[command(name = "webclient")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory API URL (overrides the configuration file)
    #[arg(long, env = "WEBCLIENT_API_URL", value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List servers, newest version first
    Listing {
        /// Only servers whose version starts with this prefix ("all" for every server)
        filter: Option<String>,
    },
    /// Show a single server
    Server {
        /// Server id as used by the directory API
        server_id: String,
    },
    /// Validate the configuration and exit
    CheckConfig,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

async fn run(command: &Command, config: &Config) -> anyhow::Result<()> {
    if let Command::CheckConfig = command {
        config.validate().map_err(WebclientError::Config)?;
        println!("Configuration OK");
        return Ok(());
    }

    let service = ServerDirectoryService::from_config(config)?;

    match command {
        Command::Listing { filter } => print_json(&service.list_servers(filter.as_deref()).await?),
        Command::Server { server_id } => print_json(&service.get_server(server_id).await?),
        Command::CheckConfig => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }),
        None => Config::default(),
    }
    .with_api_url(args.api_url.clone());

    if let Err(e) = webclient::logging::init_subscriber(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    tracing::debug!(
        api_url = %config.api.url,
        expiry = ?config.cache.expiry,
        ranking = ?config.listing.ranking,
        "Configuration loaded"
    );

    let exit_code = match run(&args.command, &config).await {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<WebclientError>() {
            Some(err) => {
                tracing::error!(error = %err, "Request failed");
                if let WebclientError::Config(_) = err {
                    eprintln!("{}", err);
                } else {
                    eprintln!("{}", err.user_message());
                }
                if err.is_not_found() {
                    2
                } else {
                    1
                }
            }
            None => {
                tracing::error!(error = %e, "Command failed");
                eprintln!("{:#}", e);
                1
            }
        },
    };

    std::process::exit(exit_code);
}
