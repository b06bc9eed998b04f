//! [`ResourceClient`] backed by the official `oci` command-line tool.
//!
//! Each ensure-absent call becomes one `oci ... delete --force` invocation.
//! When waiting is enabled the CLI polls the resource until it reaches the
//! `TERMINATED` lifecycle state, so the call returns only once the deletion
//! has finished. Instance configurations have no lifecycle state and are
//! never waited on.

use std::ffi::OsString;

use tracing::debug;

use crate::command::{CommandRunner, ProcessCommandRunner};
use crate::provider::{ProviderError, ProviderErrorKind, ResourceClient};
use crate::resource::ResourceKind;

mod error;

pub use error::classify_service_error;

/// Default `oci` CLI binary name.
pub const DEFAULT_OCI_BIN: &str = "oci";

/// Upper bound on how long a single deletion is waited on.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 1200;

/// Interval between lifecycle polls while waiting.
pub const DEFAULT_WAIT_INTERVAL_SECS: u64 = 30;

const TERMINATED_STATE: &str = "TERMINATED";

/// How long the CLI waits for a deleted resource to reach `TERMINATED`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WaitPolicy {
    /// Maximum number of seconds to wait.
    pub max_wait_seconds: u64,
    /// Seconds between polls.
    pub wait_interval_seconds: u64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_wait_seconds: DEFAULT_WAIT_TIMEOUT_SECS,
            wait_interval_seconds: DEFAULT_WAIT_INTERVAL_SECS,
        }
    }
}

/// Settings shared by every CLI invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OciCliSettings {
    /// Path to the `oci` binary.
    pub oci_bin: String,
    /// Profile in the OCI config file.
    pub profile: Option<String>,
    /// Region override.
    pub region: Option<String>,
    /// Alternate OCI config file.
    pub config_file: Option<String>,
    /// Wait policy, or `None` to return as soon as deletion is accepted.
    pub wait: Option<WaitPolicy>,
}

impl Default for OciCliSettings {
    fn default() -> Self {
        Self {
            oci_bin: String::from(DEFAULT_OCI_BIN),
            profile: None,
            region: None,
            config_file: None,
            wait: Some(WaitPolicy::default()),
        }
    }
}

/// Static description of the delete command for one resource kind.
struct DeleteCommand {
    path: &'static [&'static str],
    id_flag: &'static str,
    waits: bool,
}

const fn delete_command(kind: ResourceKind) -> DeleteCommand {
    match kind {
        ResourceKind::InstancePool => DeleteCommand {
            path: &["compute-management", "instance-pool", "terminate"],
            id_flag: "--instance-pool-id",
            waits: true,
        },
        ResourceKind::InstanceConfiguration => DeleteCommand {
            path: &["compute-management", "instance-configuration", "delete"],
            id_flag: "--instance-configuration-id",
            waits: false,
        },
        ResourceKind::Subnet => DeleteCommand {
            path: &["network", "subnet", "delete"],
            id_flag: "--subnet-id",
            waits: true,
        },
        ResourceKind::SecurityList => DeleteCommand {
            path: &["network", "security-list", "delete"],
            id_flag: "--security-list-id",
            waits: true,
        },
        ResourceKind::RouteTable => DeleteCommand {
            path: &["network", "route-table", "delete"],
            id_flag: "--rt-id",
            waits: true,
        },
        ResourceKind::InternetGateway => DeleteCommand {
            path: &["network", "internet-gateway", "delete"],
            id_flag: "--ig-id",
            waits: true,
        },
        ResourceKind::VirtualNetwork => DeleteCommand {
            path: &["network", "vcn", "delete"],
            id_flag: "--vcn-id",
            waits: true,
        },
    }
}

/// Deletes OCI resources by shelling out to `oci`.
#[derive(Clone, Debug)]
pub struct OciCliClient<R: CommandRunner> {
    settings: OciCliSettings,
    runner: R,
}

impl OciCliClient<ProcessCommandRunner> {
    /// Creates a client wired to the real process runner.
    #[must_use]
    pub const fn with_process_runner(settings: OciCliSettings) -> Self {
        Self::new(settings, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> OciCliClient<R> {
    /// Creates a client using the provided settings and runner.
    #[must_use]
    pub const fn new(settings: OciCliSettings, runner: R) -> Self {
        Self { settings, runner }
    }

    /// Settings used for every invocation.
    #[must_use]
    pub const fn settings(&self) -> &OciCliSettings {
        &self.settings
    }

    /// Builds the argument vector deleting `id` of the given kind.
    #[must_use]
    pub fn delete_args(&self, kind: ResourceKind, id: &str) -> Vec<OsString> {
        let command = delete_command(kind);
        let mut args = Vec::new();

        if let Some(profile) = &self.settings.profile {
            args.push(OsString::from("--profile"));
            args.push(OsString::from(profile));
        }
        if let Some(region) = &self.settings.region {
            args.push(OsString::from("--region"));
            args.push(OsString::from(region));
        }
        if let Some(config_file) = &self.settings.config_file {
            args.push(OsString::from("--config-file"));
            args.push(OsString::from(config_file));
        }

        args.extend(command.path.iter().map(OsString::from));
        args.push(OsString::from(command.id_flag));
        args.push(OsString::from(id));
        args.push(OsString::from("--force"));

        if let Some(wait) = self.settings.wait.filter(|_| command.waits) {
            args.push(OsString::from("--wait-for-state"));
            args.push(OsString::from(TERMINATED_STATE));
            args.push(OsString::from("--max-wait-seconds"));
            args.push(OsString::from(wait.max_wait_seconds.to_string()));
            args.push(OsString::from("--wait-interval-seconds"));
            args.push(OsString::from(wait.wait_interval_seconds.to_string()));
        }

        args
    }
}

impl<R: CommandRunner> ResourceClient for OciCliClient<R> {
    fn ensure_absent(&self, kind: ResourceKind, id: &str) -> Result<(), ProviderError> {
        let args = self.delete_args(kind, id);
        debug!(program = %self.settings.oci_bin, ?args, "invoking oci");

        let output = self
            .runner
            .run(&self.settings.oci_bin, &args)
            .map_err(|err| ProviderError::new(ProviderErrorKind::Other, err.to_string()))?;
        if output.is_success() {
            return Ok(());
        }

        Err(error::classify_failure(&self.settings.oci_bin, &output))
    }
}
