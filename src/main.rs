//! Export Download - command-line front end
//!
//! Prints the download links and menu of a configured list view and runs
//! exports against JSON record files.
//!
//! # Usage
//!
//! ```bash
//! # Show the links of the configured view
//! export-download links --query "q=dune"
//!
//! # Export the first resource as CSV
//! export-download export --records books.json --query "resource_class=0&resource_format=csv"
//! ```

use tracing::Level;

use export_download::Result;
use export_download::cli::CliInterface;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Run the selected subcommand
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.handle_subcommand().await
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    // Logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
