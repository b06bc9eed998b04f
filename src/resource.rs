//! Resource kinds torn down by the sequencer and the identifiers that name
//! them.
//!
//! [`ResourceKind::TEARDOWN_ORDER`] lists the kinds so that every resource
//! comes after everything that depends on it. Deleting the instance pool
//! also terminates its member instances on the provider side, which is what
//! allows the subnet to go afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds of provider resource handled by a teardown.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum ResourceKind {
    /// Managed group of compute instances.
    InstancePool,
    /// Launch template used by the instance pool.
    InstanceConfiguration,
    /// Subnet the pool's instances were attached to.
    Subnet,
    /// Security list attached to the subnet.
    SecurityList,
    /// Route table attached to the subnet.
    RouteTable,
    /// Internet gateway referenced by the route table.
    InternetGateway,
    /// Virtual cloud network containing everything above.
    VirtualNetwork,
}

impl ResourceKind {
    /// Every kind, in the order resources must be deleted.
    pub const TEARDOWN_ORDER: [Self; 7] = [
        Self::InstancePool,
        Self::InstanceConfiguration,
        Self::Subnet,
        Self::SecurityList,
        Self::RouteTable,
        Self::InternetGateway,
        Self::VirtualNetwork,
    ];

    /// Human readable label used in logs and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InstancePool => "instance pool",
            Self::InstanceConfiguration => "instance configuration",
            Self::Subnet => "subnet",
            Self::SecurityList => "security list",
            Self::RouteTable => "route table",
            Self::InternetGateway => "internet gateway",
            Self::VirtualNetwork => "vcn",
        }
    }

    /// Name of the configuration variable carrying this kind's identifier.
    #[must_use]
    pub const fn variable(self) -> &'static str {
        match self {
            Self::InstancePool => "instance_pool_id",
            Self::InstanceConfiguration => "instance_configuration_id",
            Self::Subnet => "instance_subnet_id",
            Self::SecurityList => "instance_security_list_ocid",
            Self::RouteTable => "rt_id",
            Self::InternetGateway => "ig_id",
            Self::VirtualNetwork => "vcn_id",
        }
    }

    /// Kinds that must be gone before this kind can be deleted.
    #[must_use]
    pub const fn dependents(self) -> &'static [Self] {
        match self {
            Self::InstancePool => &[],
            Self::InstanceConfiguration | Self::Subnet => &[Self::InstancePool],
            Self::SecurityList | Self::RouteTable => &[Self::Subnet],
            Self::InternetGateway => &[Self::RouteTable],
            Self::VirtualNetwork => &[
                Self::InstancePool,
                Self::InstanceConfiguration,
                Self::Subnet,
                Self::SecurityList,
                Self::RouteTable,
                Self::InternetGateway,
            ],
        }
    }

    /// One-based position of this kind in [`Self::TEARDOWN_ORDER`].
    #[must_use]
    pub const fn step(self) -> usize {
        match self {
            Self::InstancePool => 1,
            Self::InstanceConfiguration => 2,
            Self::Subnet => 3,
            Self::SecurityList => 4,
            Self::RouteTable => 5,
            Self::InternetGateway => 6,
            Self::VirtualNetwork => 7,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a string names no known resource kind.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown resource kind: {0}")]
pub struct UnknownResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    /// Accepts either the label (`"route table"`) or the identifier variable
    /// (`"rt_id"`), ignoring case and surrounding whitespace.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase();
        Self::TEARDOWN_ORDER
            .into_iter()
            .find(|kind| kind.label() == needle || kind.variable() == needle)
            .ok_or_else(|| UnknownResourceKind(value.to_owned()))
    }
}

/// Identifiers of the resources to tear down, as recorded by provisioning.
///
/// Identifiers are passed to the provider verbatim; the provider's response
/// decides whether an unknown or empty identifier is an error.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResourceIds {
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
}

impl ResourceIds {
    /// Returns the identifier recorded for `kind`.
    #[must_use]
    pub fn id(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::InstancePool => &self.instance_pool_id,
            ResourceKind::InstanceConfiguration => &self.instance_configuration_id,
            ResourceKind::Subnet => &self.instance_subnet_id,
            ResourceKind::SecurityList => &self.instance_security_list_ocid,
            ResourceKind::RouteTable => &self.rt_id,
            ResourceKind::InternetGateway => &self.ig_id,
            ResourceKind::VirtualNetwork => &self.vcn_id,
        }
    }

    /// Pairs each kind with its identifier in teardown order.
    pub fn in_teardown_order(&self) -> impl Iterator<Item = (ResourceKind, &str)> {
        ResourceKind::TEARDOWN_ORDER
            .into_iter()
            .map(move |kind| (kind, self.id(kind)))
    }
}
