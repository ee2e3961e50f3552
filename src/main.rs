use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitestream::config::LoggingConfig;

mod commands;

use commands::{CrawlParams, ServeParams};

#[derive(Parser)]
#[command(
    name = "sitestream",
    version,
    about = "Depth-bounded web scraper that streams pages as they are fetched",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scrape server
    Serve {
        /// TOML configuration file (environment variables are used otherwise)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen port, overrides PORT and the config file
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Request a crawl from a scrape server and save the pages
    Crawl {
        /// Server host
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Server port
        #[arg(long, default_value = "443")]
        port: u16,

        /// Use plain http instead of https
        #[arg(long, default_value = "false")]
        with_insecure: bool,

        /// Bearer token
        #[arg(long)]
        token: Option<String>,

        /// Maximum link depth from the seed
        #[arg(long, default_value = "1")]
        max_depth: i32,

        /// Whole-request deadline in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Output file, one JSON page per line
        #[arg(short, long, default_value = "output.json")]
        output: PathBuf,

        /// Seed URL
        #[arg(short, long, default_value = "https://en.wikipedia.org/wiki/Main_Page")]
        url: String,

        /// Allowed host name (repeatable)
        #[arg(long = "allowed-domain", default_value = "en.wikipedia.org")]
        allowed_domains: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port } => {
            let params = ServeParams { config, port };
            let config = params.load_config()?;

            setup_tracing(&config.logging, cli.log_format.as_deref(), cli.verbose)?;
            tracing::info!(
                config = ?params.config,
                port = config.server.port,
                "Starting serve command"
            );
            commands::serve(params, config).await?;
        }

        Commands::Crawl {
            host,
            port,
            with_insecure,
            token,
            max_depth,
            timeout,
            output,
            url,
            allowed_domains,
        } => {
            setup_tracing(&LoggingConfig::default(), cli.log_format.as_deref(), cli.verbose)?;
            tracing::info!(
                url = %url,
                max_depth = %max_depth,
                allowed_domains = ?allowed_domains,
                timeout_secs = %timeout,
                "Starting crawl command"
            );
            commands::crawl(CrawlParams {
                host,
                port,
                insecure: with_insecure,
                token,
                max_depth,
                timeout: Duration::from_secs(timeout),
                output,
                url,
                allowed_domains,
            })
            .await?;
        }
    }

    Ok(())
}

fn setup_tracing(logging: &LoggingConfig, format: Option<&str>, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("sitestream=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!(
                "sitestream={},tower_http={},warn",
                logging.level, logging.level
            ))
        })
    };

    match format.unwrap_or(logging.format.as_str()) {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
    }

    Ok(())
}
