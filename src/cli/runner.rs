//! CLI runner - executes commands

use crate::catalog::Catalog;
use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::discover::SchemaDiscoverer;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::output::StdoutWriter;
use crate::state::StateManager;
use crate::streams::SyncContext;
use crate::sync::SyncOrchestrator;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        match &self.cli.command {
            Commands::Discover => self.discover(&config).await,
            Commands::Sync { catalog } => self.sync(&config, catalog).await,
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<TapConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use --config)"))?;
        TapConfig::from_file(path)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
                .with_context(|| format!("Loading state from {}", path.display()))
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Discover streams and print the catalog
    async fn discover(&self, config: &TapConfig) -> Result<()> {
        let client = HttpClient::from_tap_config(config)?;

        info!("Starting discover");
        let catalog = SchemaDiscoverer::default().discover(&client).await?;
        info!("Finished discover: {} streams", catalog.streams.len());

        println!("{}", catalog.to_json_pretty()?);
        Ok(())
    }

    /// Sync the selected streams
    async fn sync(&self, config: &TapConfig, catalog_path: &Path) -> Result<()> {
        let catalog = Catalog::from_file(catalog_path)
            .with_context(|| format!("Loading catalog from {}", catalog_path.display()))?;
        let state = self.load_state()?;
        let client = HttpClient::from_tap_config(config)?;
        let mut writer = StdoutWriter::stdout();

        let start = Instant::now();
        info!("Starting sync");
        let summary = {
            let mut ctx = SyncContext::new(&client, config, &state, &mut writer);
            SyncOrchestrator::default().run(&mut ctx, catalog).await?
        };
        info!(
            streams = summary.streams.len(),
            records = summary.total_records(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Finished sync"
        );
        Ok(())
    }
}
