//! Configuration loading via `ortho-config`.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::oci::{
    DEFAULT_OCI_BIN, DEFAULT_WAIT_INTERVAL_SECS, DEFAULT_WAIT_TIMEOUT_SECS, OciCliSettings,
    WaitPolicy,
};
use crate::resource::ResourceIds;

const CONFIG_FILE_NAME: &str = "oci-teardown.toml";

/// Teardown configuration derived from configuration files and environment
/// variables.
///
/// The identifiers are normally written out by the provisioning run that
/// created the resources.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "OCI_TEARDOWN",
    discovery(
        app_name = "oci-teardown",
        env_var = "OCI_TEARDOWN_CONFIG_PATH",
        config_file_name = "oci-teardown.toml",
        dotfile_name = ".oci-teardown.toml",
        project_file_name = "oci-teardown.toml"
    )
)]
pub struct TeardownConfig {
    /// Instance pool OCID.
    pub instance_pool_id: String,
    /// Instance configuration OCID.
    pub instance_configuration_id: String,
    /// Subnet OCID.
    pub instance_subnet_id: String,
    /// Security list OCID.
    pub instance_security_list_ocid: String,
    /// Route table OCID.
    pub rt_id: String,
    /// Internet gateway OCID.
    pub ig_id: String,
    /// VCN OCID.
    pub vcn_id: String,
    /// Path to the `oci` CLI binary. Defaults to `oci` on `PATH`.
    #[ortho_config(default = DEFAULT_OCI_BIN.to_owned())]
    pub oci_bin: String,
    /// Profile in the OCI CLI config file.
    pub profile: Option<String>,
    /// Region override passed to the CLI.
    pub region: Option<String>,
    /// Alternate OCI CLI config file.
    pub oci_config_file: Option<String>,
    /// Wait for each deleted resource to reach `TERMINATED`.
    #[ortho_config(default = true)]
    pub wait: bool,
    /// Upper bound, in seconds, on each wait.
    #[ortho_config(default = DEFAULT_WAIT_TIMEOUT_SECS)]
    pub wait_timeout_secs: u64,
    /// Seconds between lifecycle polls while waiting.
    #[ortho_config(default = DEFAULT_WAIT_INTERVAL_SECS)]
    pub wait_interval_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to {CONFIG_FILE_NAME}",
            self.description, self.env_var, self.toml_key
        ))
    }

    fn zero(&self) -> ConfigError {
        ConfigError::Invalid(format!(
            "{} must be greater than zero: set {} or {} in {CONFIG_FILE_NAME}",
            self.description, self.env_var, self.toml_key
        ))
    }
}

impl TeardownConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails, including when
    /// an identifier is not provided by any source.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("oci-teardown")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on the CLI settings.
    ///
    /// Identifiers are not checked; they are handed to the provider as
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when `oci_bin` is blank and
    /// [`ConfigError::Invalid`] when a wait setting is zero while waiting is
    /// enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oci_bin.trim().is_empty() {
            return Err(FieldMetadata::new(
                "oci CLI binary",
                "OCI_TEARDOWN_OCI_BIN",
                "oci_bin",
            )
            .missing());
        }
        if self.wait && self.wait_timeout_secs == 0 {
            return Err(FieldMetadata::new(
                "wait timeout",
                "OCI_TEARDOWN_WAIT_TIMEOUT_SECS",
                "wait_timeout_secs",
            )
            .zero());
        }
        if self.wait && self.wait_interval_secs == 0 {
            return Err(FieldMetadata::new(
                "wait interval",
                "OCI_TEARDOWN_WAIT_INTERVAL_SECS",
                "wait_interval_secs",
            )
            .zero());
        }
        Ok(())
    }

    /// Returns the identifier record handed to the sequencer.
    #[must_use]
    pub fn resource_ids(&self) -> ResourceIds {
        ResourceIds {
            instance_pool_id: self.instance_pool_id.clone(),
            instance_configuration_id: self.instance_configuration_id.clone(),
            instance_subnet_id: self.instance_subnet_id.clone(),
            instance_security_list_ocid: self.instance_security_list_ocid.clone(),
            rt_id: self.rt_id.clone(),
            ig_id: self.ig_id.clone(),
            vcn_id: self.vcn_id.clone(),
        }
    }

    /// Builds validated settings for the `oci` CLI client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn oci_settings(&self) -> Result<OciCliSettings, ConfigError> {
        self.validate()?;
        let wait = self.wait.then_some(WaitPolicy {
            max_wait_seconds: self.wait_timeout_secs,
            wait_interval_seconds: self.wait_interval_secs,
        });
        Ok(OciCliSettings {
            oci_bin: self.oci_bin.trim().to_owned(),
            profile: trimmed(self.profile.as_deref()),
            region: trimmed(self.region.as_deref()),
            config_file: trimmed(self.oci_config_file.as_deref()),
            wait,
        })
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|inner| !inner.is_empty())
        .map(str::to_owned)
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

