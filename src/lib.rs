//! Core library for the `oci-teardown` tool.
//!
//! The crate tears down an OCI instance pool together with its instance
//! configuration and network (subnet, security list, route table, internet
//! gateway, VCN) in a fixed dependency order. Deletions go through the
//! [`ResourceClient`] seam; the production client drives the `oci` CLI.

pub mod command;
pub mod config;
pub mod oci;
pub mod provider;
pub mod resource;
pub mod teardown;
pub mod test_support;

pub use command::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};
pub use config::{ConfigError, TeardownConfig};
pub use oci::{OciCliClient, OciCliSettings, WaitPolicy};
pub use provider::{ProviderError, ProviderErrorKind, ResourceClient};
pub use resource::{ResourceIds, ResourceKind};
pub use teardown::{
    CancellationFlag, StepOutcome, StepRecord, TeardownError, TeardownReport, TeardownSequencer,
};
