//! Command-line interface definitions for the `oci-teardown` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `oci-teardown` binary.
#[derive(Debug, Parser)]
#[command(
    name = "oci-teardown",
    about = "Tear down an OCI instance pool and its network in dependency order",
    version,
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Print the ordered teardown steps without calling the provider.
    #[command(
        name = "plan",
        about = "Print the ordered teardown steps without calling the provider"
    )]
    Plan,
    /// Delete every resource, stopping at the first failure.
    #[command(
        name = "teardown",
        about = "Delete every resource, stopping at the first failure"
    )]
    Teardown(TeardownCommand),
}

/// Arguments for the `oci-teardown teardown` subcommand.
///
/// Each flag overrides the matching configuration value for this run only.
#[derive(Debug, Default, Parser)]
pub(crate) struct TeardownCommand {
    /// Path to the `oci` CLI binary.
    #[arg(long, value_name = "PATH")]
    pub(crate) oci_bin: Option<String>,
    /// OCI CLI config profile to use.
    #[arg(long, value_name = "NAME")]
    pub(crate) profile: Option<String>,
    /// Region to send requests to.
    #[arg(long, value_name = "REGION")]
    pub(crate) region: Option<String>,
    /// Return as soon as each deletion is accepted instead of waiting for
    /// the resource to reach TERMINATED.
    #[arg(long)]
    pub(crate) no_wait: bool,
    /// Maximum seconds to wait for each resource to terminate.
    #[arg(long, value_name = "SECS", conflicts_with = "no_wait")]
    pub(crate) wait_timeout: Option<u64>,
}
