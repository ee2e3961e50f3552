use anyhow::{Context, Result};
use std::path::PathBuf;

use sitestream::config::{Config, DEFAULT_PORT};
use sitestream::server::CrawlServer;

/// Parameters for the scrape server
pub struct ServeParams {
    pub config: Option<PathBuf>,
    pub port: Option<u16>,
}

impl ServeParams {
    /// Load configuration from the file if given, else from the environment
    ///
    /// Runs before logging is set up, since the log settings come from here.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env().context("Failed to read configuration from environment")?,
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn port_defaulted(&self) -> bool {
        self.port.is_none() && self.config.is_none() && std::env::var("PORT").is_err()
    }
}

/// Start the scrape server
pub async fn serve(params: ServeParams, config: Config) -> Result<()> {
    if params.port_defaulted() {
        tracing::info!(port = DEFAULT_PORT, "defaulting to port");
    }

    let server = CrawlServer::new(config).context("Failed to create scrape server")?;

    println!("{}", server.info().display());
    println!();
    println!("API Endpoints:");
    println!("  GET  /api/health     - Health check");
    println!("  POST /api/v1/scrape  - Stream a crawl as NDJSON");
    println!();
    println!("Press Ctrl+C to stop.\n");

    server.start().await?;

    println!("Scrape server stopped.");
    Ok(())
}
