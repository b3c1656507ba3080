//! Command-line runtime for the dissemination engine.
//!
//! The runtime splits leading configuration flags from the command, loads
//! [`Config`], installs telemetry, reads a JSON repository snapshot, and runs
//! either a dissemination or a method listing against it. Configuration
//! loading and the output streams can be substituted in tests.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use dissem_config::Config;
use dissem_core::assembly::InvocationPlanner;
use dissem_core::memory::MemoryRepository;
use dissem_core::model::{ParameterMap, RequestContext};
use dissem_core::{DisseminationQuery, Disseminator, DynamicServiceRegistry, PermitAll};

mod cli;
mod config;
mod errors;
mod telemetry;

use cli::{Cli, CliCommand, DisseminateArgs, MethodsArgs};
use config::{ConfigArgumentSplit, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;

/// Tracing target shared by the CLI's own events.
pub(crate) const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

type SnapshotDisseminator = Disseminator<MemoryRepository, PermitAll, InvocationPlanner>;

/// Bundles the output streams handed to the runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

/// Runs the CLI using the provided arguments and output handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams { stdout, stderr };
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    match execute(args, io, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            // Help and version output.
            write!(io.stdout, "{error}").ok();
            ExitCode::SUCCESS
        }
        Err(error) => {
            writeln!(io.stderr, "{error}").ok();
            ExitCode::from(error.exit_status())
        }
    }
}

fn execute<I, W, E, L>(args: I, io: &mut IoStreams<'_, W, E>, loader: &L) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&arguments);
    let cli = Cli::try_parse_from(prepare_cli_arguments(&arguments, &split))
        .map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;

    match cli.command {
        CliCommand::Disseminate(command) => disseminate(&config, &command, io),
        CliCommand::Methods(command) => list_methods(&config, &command, io),
    }
}

fn prepare_cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    args.first()
        .into_iter()
        .chain(args.iter().skip(split.command_start))
        .cloned()
        .collect()
}

fn disseminate<W, E>(
    config: &Config,
    command: &DisseminateArgs,
    io: &mut IoStreams<'_, W, E>,
) -> Result<(), AppError>
where
    W: Write,
    E: Write,
{
    let engine = build_engine(config, &command.source.snapshot)?;
    let parameters: ParameterMap = command.parameters.iter().cloned().collect();
    let query = DisseminationQuery::new(
        command.pid.as_str(),
        command.service_definition.as_str(),
        command.method.as_str(),
    )
    .with_parameters(parameters)
    .as_of(command.source.as_of);

    let stream = engine.get_dissemination(&RequestContext::anonymous(), &query)?;
    let (mime_type, mut content) = stream.into_parts();
    if command.show_mime {
        writeln!(io.stderr, "{mime_type}").map_err(AppError::WriteOutput)?;
    }
    io::copy(&mut content, &mut *io.stdout).map_err(AppError::WriteOutput)?;
    io.stdout.flush().map_err(AppError::WriteOutput)
}

fn list_methods<W, E>(
    config: &Config,
    command: &MethodsArgs,
    io: &mut IoStreams<'_, W, E>,
) -> Result<(), AppError>
where
    W: Write,
    E: Write,
{
    let engine = build_engine(config, &command.source.snapshot)?;
    let methods = engine.list_available_methods(
        &RequestContext::anonymous(),
        &command.pid,
        command.source.as_of,
    )?;
    serde_json::to_writer_pretty(&mut *io.stdout, &methods).map_err(AppError::SerialiseMethods)?;
    writeln!(io.stdout).map_err(AppError::WriteOutput)
}

fn build_engine(config: &Config, snapshot: &Path) -> Result<SnapshotDisseminator, AppError> {
    let path = snapshot.display().to_string();
    let document = fs::read_to_string(snapshot).map_err(|source| AppError::ReadSnapshot {
        path: path.clone(),
        source,
    })?;
    let repository = MemoryRepository::from_json(&document)
        .map_err(|source| AppError::ParseSnapshot { path, source })?;
    debug!(
        target: CLI_TARGET,
        snapshot = %snapshot.display(),
        objects = repository.snapshot().objects.len(),
        deployments = repository.snapshot().service_deployments.len(),
        "repository snapshot loaded"
    );

    let registry =
        DynamicServiceRegistry::with_default_disseminator(config.default_disseminator())?;
    Ok(Disseminator::new(
        repository,
        PermitAll,
        InvocationPlanner::new(config.repository_base_url()),
        registry,
    ))
}
