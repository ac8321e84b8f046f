use anyhow::Result;
use clap::Parser;
use footprint::cli::Args;
use footprint::config::load_config;
use footprint::output::ConsolePrinter;
use footprint::platforms::{default_catalog, CheckStrategy};
use footprint::{server, FootprintEngine};
use log::{error, info};
use std::sync::Arc;

const BANNER: &str = r#"
    ______            __             _       __
   / ____/___  ____  / /_____  _____(_)___  / /_
  / /_  / __ \/ __ \/ __/ __ \/ ___/ / __ \/ __/
 / __/ / /_/ / /_/ / /_/ /_/ / /  / / / / / /_
/_/    \____/\____/\__/ .___/_/  /_/_/ /_/\__/
                     /_/
        Digital Footprint Analyzer
"#;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    if !args.silent {
        println!("{}", BANNER);
    }

    if args.list_platforms {
        list_platforms();
        return Ok(());
    }

    let mut config = match load_config(args.config_path.as_deref()) {
        Ok(config) => config,
        Err(e) if args.serve.is_some() => return Err(e.into()),
        Err(e) => {
            error!("{}", e);
            return Ok(());
        }
    };
    args.apply_overrides(&mut config);

    if args.serve.is_some() {
        let bind = config.server.bind.clone();
        let engine = Arc::new(FootprintEngine::new(config)?);
        server::serve(engine, &bind)
            .await
            .map_err(|e| anyhow::anyhow!("Server failed: {}", e))?;
        return Ok(());
    }

    let username = args.username.as_deref().unwrap_or_default().trim();
    if username.is_empty() {
        error!("No username provided");
        return Ok(());
    }

    let engine = match FootprintEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            return Ok(());
        }
    };

    let printer = ConsolePrinter::stdout(!args.silent);
    let report = engine.analyze_observed(username, &printer).await;

    let failed_phases: usize = report.variations.values().map(|v| v.phase_errors.len()).sum();
    if failed_phases > 0 {
        info!("{} phases could not complete; see warnings above", failed_phases);
    }

    Ok(())
}

fn list_platforms() {
    let catalog = default_catalog();
    println!("Checked platforms ({}):\n", catalog.len());

    for spec in catalog.iter() {
        let marker = match spec.strategy {
            CheckStrategy::StructuredApi { .. } => " *",
            CheckStrategy::GenericExistence => "",
        };
        println!("  {:<12}{} {}", spec.name, marker, spec.url_template);
    }

    println!("\n* = Profile details fetched from the platform API");
}
