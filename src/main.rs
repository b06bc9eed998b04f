//! Binary entry point for the `oci-teardown` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use oci_teardown::teardown::EXIT_SUCCESS;
use oci_teardown::{
    CancellationFlag, OciCliClient, ResourceIds, TeardownConfig, TeardownError, TeardownReport,
    TeardownSequencer,
};

mod cli;

use cli::{Cli, TeardownCommand};

const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Teardown(#[from] TeardownError),
    #[error("teardown worker failed: {0}")]
    Worker(String),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Teardown(err) => err.exit_code(),
            Self::Config(_) | Self::Worker(_) | Self::Output(_) => EXIT_FAILURE,
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print().ok();
            process::exit(usage_exit_code(&err));
        }
    };
    let exit_code = match dispatch(cli).await {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            report_error(&err);
            err.exit_code()
        }
    };

    process::exit(exit_code);
}

/// Help and version output succeed; every other parse error is a usage error.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
    {
        writeln!(io::stderr(), "failed to initialise logging: {err}").ok();
    }
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Plan => plan(),
        Cli::Teardown(command) => run_teardown(command).await,
    }
}

fn load_config() -> Result<TeardownConfig, CliError> {
    TeardownConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))
}

fn plan() -> Result<(), CliError> {
    let ids = load_config()?.resource_ids();
    write_plan(io::stdout(), &ids)?;
    Ok(())
}

async fn run_teardown(command: TeardownCommand) -> Result<(), CliError> {
    let config = apply_overrides(load_config()?, command);
    let settings = config
        .oci_settings()
        .map_err(|err| CliError::Config(err.to_string()))?;
    let ids = config.resource_ids();

    let cancellation = CancellationFlag::new();
    let sequencer = TeardownSequencer::new(OciCliClient::with_process_runner(settings))
        .with_cancellation(cancellation.clone());

    let mut worker = tokio::task::spawn_blocking(move || sequencer.teardown(&ids));
    let joined = tokio::select! {
        joined = &mut worker => joined,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    warn!("interrupt received; stopping after the current step");
                    cancellation.cancel();
                }
                Err(err) => warn!(error = %err, "failed to listen for interrupts"),
            }
            worker.await
        }
    };
    let report = joined.map_err(|err| CliError::Worker(err.to_string()))??;

    write_report(io::stdout(), &report)?;
    Ok(())
}

fn apply_overrides(mut config: TeardownConfig, command: TeardownCommand) -> TeardownConfig {
    if let Some(oci_bin) = command.oci_bin {
        config.oci_bin = oci_bin;
    }
    if command.profile.is_some() {
        config.profile = command.profile;
    }
    if command.region.is_some() {
        config.region = command.region;
    }
    if command.no_wait {
        config.wait = false;
    }
    if let Some(timeout) = command.wait_timeout {
        config.wait_timeout_secs = timeout;
    }
    config
}

fn write_plan(mut target: impl Write, ids: &ResourceIds) -> io::Result<()> {
    for (kind, id) in ids.in_teardown_order() {
        writeln!(target, "{}. {kind} ({}): {id}", kind.step(), kind.variable())?;
    }
    Ok(())
}

fn write_report(mut target: impl Write, report: &TeardownReport) -> io::Result<()> {
    for record in &report.steps {
        writeln!(
            target,
            "{}. {} {}: {}",
            record.step, record.kind, record.id, record.outcome
        )?;
    }
    writeln!(
        target,
        "teardown complete: deleted={}, already_absent={}",
        report.deleted(),
        report.already_absent()
    )
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
