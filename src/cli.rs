use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheet-sentry")]
#[command(about = "Watches a Google Sheets export and alerts on trigger matches", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the remote spreadsheet and alert on matching rows
    Watch {
        /// Delay between polls in milliseconds (overrides config)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Rules file (default: config, then the built-in rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Give up after this many consecutive throttled fetches
        /// (default: retry forever)
        #[arg(long)]
        max_retries: Option<u32>,
    },

    /// Run one pass over a local xlsx export
    Scan {
        /// Path to the downloaded .xlsx file
        #[arg(required = true)]
        file: PathBuf,

        /// Rules file (default: config, then the built-in rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Play the alert sound if anything matches
        #[arg(long)]
        sound: bool,
    },

    /// Validate a rules file and print a summary
    Rules {
        /// Rules file (default: config, then the built-in rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Show or edit configuration
    Config {
        /// Set the spreadsheet id
        #[arg(long)]
        set_spreadsheet_id: Option<String>,

        /// Set the authentication cookie header value
        #[arg(long)]
        set_cookies: Option<String>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

/// `config` with no setter flags defaults to showing the configuration.
pub fn show_config(
    show: bool,
    set_spreadsheet_id: &Option<String>,
    set_cookies: &Option<String>,
) -> bool {
    show || (set_spreadsheet_id.is_none() && set_cookies.is_none())
}
