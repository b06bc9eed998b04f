//! Provider client seam and the error taxonomy shared by all clients.

use std::fmt;

use thiserror::Error;

use crate::resource::ResourceKind;

/// Categories of provider failure relevant to teardown.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProviderErrorKind {
    /// The resource does not exist; the desired absent state already holds.
    NotFound,
    /// The resource is still referenced by something else.
    DependencyConflict,
    /// Credentials were rejected or lack permission.
    AuthorizationFailure,
    /// Throttling, provider-side outages or network trouble.
    TransientNetworkFailure,
    /// The provider accepted the deletion but it did not finish in time.
    WaitTimeout,
    /// Anything not classified above, including local tooling failures.
    Other,
}

impl ProviderErrorKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::DependencyConflict => "dependency conflict",
            Self::AuthorizationFailure => "authorization failure",
            Self::TransientNetworkFailure => "transient failure",
            Self::WaitTimeout => "wait timed out",
            Self::Other => "provider failure",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by a provider client for a single ensure-absent call.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    /// Classified failure category.
    pub kind: ProviderErrorKind,
    /// Provider error code, when one was reported.
    pub code: Option<String>,
    /// HTTP status reported by the provider, when known.
    pub status: Option<u16>,
    /// Human readable message.
    pub message: String,
}

impl ProviderError {
    /// Creates an error with no provider code or status.
    #[must_use]
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            status: None,
            message: message.into(),
        }
    }

    /// Attaches the provider's error code and HTTP status.
    #[must_use]
    pub fn with_service_details(mut self, code: Option<String>, status: Option<u16>) -> Self {
        self.code = code;
        self.status = status;
        self
    }

    /// Returns `true` when the resource is already absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::NotFound)
    }
}

/// Client able to drive a single resource to the absent state.
pub trait ResourceClient {
    /// Requests deletion of `id` and blocks until the provider acknowledges
    /// it, or until the deletion finishes when the client waits for it.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] with [`ProviderErrorKind::NotFound`] when
    /// the resource does not exist, and another kind for every other
    /// failure.
    fn ensure_absent(&self, kind: ResourceKind, id: &str) -> Result<(), ProviderError>;
}

impl<C: ResourceClient + ?Sized> ResourceClient for &C {
    fn ensure_absent(&self, kind: ResourceKind, id: &str) -> Result<(), ProviderError> {
        (**self).ensure_absent(kind, id)
    }
}
