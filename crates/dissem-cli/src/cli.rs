//! CLI argument definitions for the `dissem` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const CONFIG_HELP: &str = "Configuration flags (--config-path, --log-filter, --log-format, \
--default-disseminator, --repository-base-url) must precede the command. The same settings \
are read from DISSEM_* environment variables.";

/// Command-line interface for the dissemination engine.
#[derive(Parser, Debug)]
#[command(name = "dissem", disable_help_subcommand = true, after_help = CONFIG_HELP)]
pub(crate) struct Cli {
    /// Operation to run.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations offered by the CLI.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Disseminates a method of an object and writes its output to stdout.
    Disseminate(DisseminateArgs),
    /// Lists every method available on an object as JSON.
    Methods(MethodsArgs),
}

/// Where objects are read from and at what time.
#[derive(Args, Debug, Clone)]
pub(crate) struct SourceArgs {
    /// JSON repository snapshot.
    #[arg(long, value_name = "FILE")]
    pub(crate) snapshot: PathBuf,
    /// Read the object as it was at this RFC 3339 time.
    #[arg(long, value_name = "RFC3339", value_parser = parse_as_of)]
    pub(crate) as_of: Option<OffsetDateTime>,
}

/// Arguments of `dissem disseminate`.
#[derive(Args, Debug, Clone)]
pub(crate) struct DisseminateArgs {
    /// Snapshot and version time.
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Prints the output MIME type to stderr before the content.
    #[arg(long)]
    pub(crate) show_mime: bool,
    /// Object identifier.
    #[arg(value_name = "PID")]
    pub(crate) pid: String,
    /// Service definition identifier.
    #[arg(value_name = "SDEF")]
    pub(crate) service_definition: String,
    /// Method name.
    #[arg(value_name = "METHOD")]
    pub(crate) method: String,
    /// Method parameters.
    #[arg(value_name = "NAME=VALUE", value_parser = parse_parameter)]
    pub(crate) parameters: Vec<(String, String)>,
}

/// Arguments of `dissem methods`.
#[derive(Args, Debug, Clone)]
pub(crate) struct MethodsArgs {
    /// Snapshot and version time.
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Object identifier.
    #[arg(value_name = "PID")]
    pub(crate) pid: String,
}

fn parse_as_of(raw: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|error| format!("expected RFC 3339: {error}"))
}

fn parse_parameter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, _)) if name.is_empty() => Err(format!("'{raw}' has an empty name")),
        Some((name, value)) => Ok((name.to_owned(), value.to_owned())),
        None => Err(format!("'{raw}' is not of the form NAME=VALUE")),
    }
}
