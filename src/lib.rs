// src/lib.rs
pub mod cli;
pub mod config;
pub mod contacts;
pub mod dispatcher;
pub mod domains;
pub mod engine;
pub mod error;
pub mod expander;
pub mod output;
pub mod phone;
pub mod platforms;
pub mod search;
pub mod server;
pub mod session;
pub mod types;
pub mod utils;
pub mod whois;

pub use cli::Args;
pub use engine::{AnalysisObserver, Collaborators, FootprintEngine};
pub use expander::Identity;
pub use types::{
    Config, ContactFinding, DomainRecord, FootprintError, FootprintReport, ProbeResult,
    QuickScanReport, VariationReport,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
