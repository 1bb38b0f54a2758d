//! OpenAPI from docstrings - command-line tool for building OpenAPI documents.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-docstring [OPTIONS] <COMMAND>
//! ```
//!
//! # Examples
//!
//! Build a document from a manifest:
//! ```bash
//! openapi-from-docstring build api.yaml -o openapi.yaml
//! ```
//!
//! Inspect how one docstring is parsed:
//! ```bash
//! openapi-from-docstring parse handler_doc.txt -f json
//! ```
//!
//! Parse a model docstring from stdin with verbose logging:
//! ```bash
//! cat pet.txt | openapi-from-docstring -v parse - --schema Pet
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_docstring::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-from-docstring starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Done");
    Ok(())
}
