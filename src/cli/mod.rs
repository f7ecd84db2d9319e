//! Command-line interface for export-download
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Rendering download links and the download menu for a configured view
//! - Running an export against a JSON record file

pub mod completion;

use clap::{Parser, Subcommand};
use http::Method;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::info;

use crate::config::{Config, LogLevel};
use crate::dispatch::{DownloadDispatcher, DownloadRequest, DownloadResponse};
use crate::error::{ConfigError, Result};
use crate::links::{ResourceLinks, build_links, build_page_links, route_for};
use crate::menu::DownloadMenu;
use crate::page::DEFAULT_EXPORT_ROUTE;
use crate::query::QueryParams;
use crate::records::StaticRecords;
use crate::view::ViewConfiguration;

/// Export-download - download links and exports for list views
#[derive(Parser, Debug)]
#[command(
    name = "export-download",
    version,
    about = "Download links and export dispatch for list views",
    long_about = "Builds per-format download links for a configured list view and serves
exports of JSON records as CSV, XLS, JSON, YAML or TSV files."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the download links of the configured view
    Links {
        /// Query string of the current request
        #[arg(short = 'q', long, value_name = "QS", default_value = "")]
        query: String,

        /// Link back to the list page instead of the export route
        #[arg(long)]
        page: bool,
    },

    /// Print the HTML download menu
    Menu {
        /// Query string of the current request
        #[arg(short = 'q', long, value_name = "QS", default_value = "")]
        query: String,

        /// CSS class of the menu button
        #[arg(long, value_name = "CLASS")]
        button_class: Option<String>,
    },

    /// Export a JSON record file
    Export {
        /// JSON file holding an array of records
        #[arg(short = 'r', long, value_name = "FILE")]
        records: PathBuf,

        /// Query string selecting the resource and format
        #[arg(short = 'q', long, value_name = "QS", default_value = "")]
        query: String,

        /// Request method
        #[arg(short = 'm', long, value_name = "METHOD", default_value = "GET")]
        method: String,

        /// Output file (defaults to the suggested filename)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show or validate the configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show version information
    Version,
}

/// Row of the links table
#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Resource")]
    label: String,
    #[tabled(rename = "URL")]
    url: String,
}

/// CLI interface manager
pub struct CliInterface {
    args: CliArgs,
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from command-line arguments
    ///
    /// # Returns
    /// * `Result<Self>` - CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Get parsed arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Get loaded configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load configuration from file and apply CLI overrides
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;
        Self::apply_logging_args(&mut config, args);
        Ok(config)
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else {
            config.logging.level
        };
    }

    /// Run the selected subcommand
    pub async fn handle_subcommand(&self) -> Result<()> {
        match &self.args.command {
            Commands::Links { query, page } => {
                println!("{}", self.links_table(query, *page)?);
            }
            Commands::Menu {
                query,
                button_class,
            } => {
                println!("{}", self.menu_html(query, button_class.as_deref())?);
            }
            Commands::Export {
                records,
                query,
                method,
                output,
            } => {
                let written = self
                    .export(records, query, method, output.as_deref())
                    .await?;
                println!("{}", written);
            }
            Commands::Config { show, validate } => {
                self.handle_config_command(*show, *validate)?;
            }
            Commands::Completion { shell } => {
                completion::generate_completion(shell, &mut std::io::stdout())?;
            }
            Commands::Version => self.show_version(),
        }
        Ok(())
    }

    /// Validated view configuration
    fn view(&self) -> Result<ViewConfiguration> {
        Ok(self.config.view.build()?)
    }

    /// Build the download links for a query string
    ///
    /// With `page` set, links point back at the list page with the download
    /// marker; otherwise they use the configured export route.
    pub fn links(&self, query: &str, page: bool) -> Result<ResourceLinks> {
        let view = self.view()?;
        let params = QueryParams::parse(query);

        if page {
            return Ok(build_page_links(&view, &params));
        }

        let pattern = self
            .config
            .view
            .export_url
            .as_deref()
            .unwrap_or(DEFAULT_EXPORT_ROUTE);
        Ok(build_links(&view, &params, route_for(pattern)))
    }

    /// Render the links as a table
    pub fn links_table(&self, query: &str, page: bool) -> Result<String> {
        let links = self.links(query, page)?;
        let rows: Vec<LinkRow> = links
            .iter()
            .flat_map(|group| {
                group.links.iter().map(move |link| LinkRow {
                    format: group.format.code().to_uppercase(),
                    label: link.label.clone(),
                    url: link.url.clone(),
                })
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::modern());
        Ok(table.to_string())
    }

    /// Render the HTML download menu
    pub fn menu_html(&self, query: &str, button_class: Option<&str>) -> Result<String> {
        let page = self.config.view.export_url.is_none();
        let links = self.links(query, page)?;
        let class = button_class.unwrap_or(&self.config.view.button_class);
        Ok(DownloadMenu::from_links(links, class).render())
    }

    /// Run an export and write the file
    ///
    /// # Returns
    /// * `Result<String>` - Summary of what was written
    pub async fn export(
        &self,
        records: &Path,
        query: &str,
        method: &str,
        output: Option<&Path>,
    ) -> Result<String> {
        let response = self.dispatch_file(records, query, method).await?;
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&response.filename));

        tokio::fs::write(&path, &response.body).await?;
        info!("Export written to {}", path.display());

        Ok(format!(
            "Exported {} bytes ({}) to {}",
            response.body.len(),
            response.content_type,
            path.display()
        ))
    }

    /// Dispatch a request against the records stored in a JSON file
    async fn dispatch_file(
        &self,
        records: &Path,
        query: &str,
        method: &str,
    ) -> Result<DownloadResponse> {
        let text = tokio::fs::read_to_string(records).await?;
        let source = StaticRecords::from_json_str(&text)?;

        let mut dispatcher = DownloadDispatcher::new(Arc::new(self.view()?), Arc::new(source));
        if let Some(filter) = self.config.view.record_filter() {
            dispatcher = dispatcher.with_filter(Arc::new(filter));
        }

        let method = Method::from_bytes(method.to_uppercase().as_bytes()).map_err(|_| {
            ConfigError::InvalidValue {
                field: "method".to_string(),
                value: method.to_string(),
            }
        })?;

        dispatcher.dispatch(&DownloadRequest::new(method, QueryParams::parse(query)))
    }

    /// Show version information
    fn show_version(&self) {
        println!("export-download version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `validate` - Whether to validate configuration
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("❌ Configuration file does not exist");
            return;
        }

        match Config::load_from_file(Some(path.as_path())) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("✅ Configuration is valid"),
                Err(e) => println!("❌ Configuration validation failed: {}", e),
            },
            Err(e) => println!("❌ Failed to load configuration: {}", e),
        }
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Configuration file: {}", path.display());
        println!();
        println!("=== Effective Configuration ===");
        println!();
        println!("{}", self.config.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }
}
