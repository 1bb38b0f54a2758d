use crate::docparser::{parse_from_docstring, parse_schema};
use crate::manifest::ApiManifest;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// OpenAPI from docstrings - build OpenAPI 3.0 documents from structured docstrings
#[derive(Parser, Debug)]
#[command(name = "openapi-from-docstring")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse one docstring and print the parsed operation (or model)
    Parse {
        /// Docstring file, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Parse the docstring as a model with this name
        #[arg(long = "schema", value_name = "NAME")]
        schema: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Build an OpenAPI document from a manifest
    Build {
        /// Manifest file (YAML, or JSON with a .json extension)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct OutputArgs {
    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    let input = match &args.command {
        Command::Parse { input, .. } => input,
        Command::Build { manifest, .. } => manifest,
    };
    if input != Path::new("-") && !input.is_file() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    if let Command::Parse {
        schema: Some(name), ..
    } = &args.command
    {
        if name.trim().is_empty() {
            anyhow::bail!("Schema name must not be empty");
        }
    }

    Ok(args)
}

/// Run the selected command
pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Parse {
            input,
            schema,
            output,
        } => {
            info!("Parsing docstring from {}", input.display());
            let doc = read_input(&input)?;
            match schema {
                Some(name) => emit(&parse_schema(&name, &doc), &output),
                None => emit(&parse_from_docstring(&doc), &output),
            }
        }
        Command::Build { manifest, output } => {
            let manifest = ApiManifest::load(&manifest)
                .with_context(|| format!("Failed to load manifest: {}", manifest.display()))?;
            info!(
                "Building OpenAPI document from {} routes and {} schemas",
                manifest.routes.len(),
                manifest.schemas.len()
            );

            let document = manifest.into_builder()?.build();
            info!("OpenAPI document built with {} paths", document.paths.len());
            emit(&document, &output)
        }
    }
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut doc = String::new();
        std::io::stdin()
            .read_to_string(&mut doc)
            .context("Failed to read docstring from stdin")?;
        Ok(doc)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
    }
}

fn emit<T: Serialize>(value: &T, output: &OutputArgs) -> Result<()> {
    info!("Serializing to {:?} format...", output.output_format);
    let content = match output.output_format {
        OutputFormat::Yaml => serialize_yaml(value)?,
        OutputFormat::Json => serialize_json(value)?,
    };

    if let Some(output_path) = &output.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
    } else {
        println!("{}", content);
    }
    Ok(())
}
