use crate::types::Config;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

#[derive(Parser, Debug, Clone)]
#[command(
    name = "footprint",
    version,
    long_version = LONG_VERSION,
    about = "Map the public digital footprint of a username",
    long_about = "footprint expands a username into variations and checks each one for registered\ndomains, social media profiles and contact details published on the web."
)]
pub struct Args {
    /// Username or identity to analyze
    #[arg(value_name = "USERNAME", required_unless_present_any = ["serve", "list_platforms"])]
    pub username: Option<String>,

    /// Serve POST /analyze over HTTP instead of running a single analysis
    #[arg(long = "serve", value_name = "ADDR", num_args = 0..=1, conflicts_with = "username")]
    pub serve: Option<Option<String>>,

    /// Maximum number of probes in flight
    #[arg(short = 'c', long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// HTTP request timeout in seconds
    #[arg(short = 't', long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Configuration file path
    #[arg(long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// List all checked platforms
    #[arg(long = "list-platforms")]
    pub list_platforms: bool,

    /// Verbose mode
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Silent mode (no banner, warnings only)
    #[arg(long = "silent", conflicts_with = "verbose")]
    pub silent: bool,
}

impl Args {
    /// Layer command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(secs) = self.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(Some(bind)) = &self.serve {
            config.server.bind = bind.clone();
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else if self.silent {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        }
    }
}
