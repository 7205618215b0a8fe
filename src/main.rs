//! apidoc-scanner - Command-line tool for generating API resource listings.
//!
//! Reads a route manifest (or a directory of them), groups the routes into resources and writes
//! the resulting resource listing and per-group API listings as YAML or JSON.
//!
//! # Usage
//!
//! ```bash
//! apidoc-scanner [OPTIONS] <ROUTES_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! apidoc-scanner ./routes.yaml -o api-docs.yaml
//! ```
//!
//! Group by tag, hide internal routes and emit JSON:
//! ```bash
//! apidoc-scanner ./manifests --grouping tag -x /internal -f json -o api-docs.json
//! ```

use anyhow::Result;
use apidoc_scanner::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can configure the logger
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("apidoc-scanner starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Resource listing generation completed successfully");

    Ok(())
}
