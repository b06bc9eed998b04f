//! Classification of `oci` CLI failures into [`ProviderErrorKind`].
//!
//! Service-side failures are printed by the CLI as `ServiceError:` followed
//! by a JSON body carrying `status`, `code` and `message`. Everything else is
//! classified from the raw stderr text.

use serde::Deserialize;

use crate::command::CommandOutput;
use crate::provider::{ProviderError, ProviderErrorKind};

const SERVICE_ERROR_MARKER: &str = "ServiceError:";

const NOT_FOUND_CODES: &[&str] = &["NotAuthorizedOrNotFound", "NotFound"];
const CONFLICT_CODES: &[&str] = &["Conflict", "IncorrectState"];
const AUTHORIZATION_CODES: &[&str] = &["NotAuthenticated", "NotAuthorized", "Forbidden"];
const TRANSIENT_CODES: &[&str] = &[
    "TooManyRequests",
    "InternalServerError",
    "ServiceUnavailable",
];

const WAIT_TIMEOUT_MARKERS: &[&str] = &[
    "Failed to wait until the resource entered the specified state",
    "MaximumWaitTimeExceeded",
];
const TRANSIENT_MARKERS: &[&str] = &[
    "RequestException",
    "ConnectTimeout",
    "ConnectionError",
    "Connection aborted",
    "timed out",
];

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<u16>,
}

/// Maps an OCI service error status and code onto a failure category.
///
/// Known codes take precedence; unknown or missing codes fall back to the
/// HTTP status.
#[must_use]
pub fn classify_service_error(status: Option<u16>, code: Option<&str>) -> ProviderErrorKind {
    code.and_then(classify_code)
        .unwrap_or_else(|| match status {
            Some(404) => ProviderErrorKind::NotFound,
            Some(409) => ProviderErrorKind::DependencyConflict,
            Some(401 | 403) => ProviderErrorKind::AuthorizationFailure,
            Some(429 | 500..=599) => ProviderErrorKind::TransientNetworkFailure,
            _ => ProviderErrorKind::Other,
        })
}

fn classify_code(code: &str) -> Option<ProviderErrorKind> {
    if NOT_FOUND_CODES.contains(&code) {
        Some(ProviderErrorKind::NotFound)
    } else if CONFLICT_CODES.contains(&code) {
        Some(ProviderErrorKind::DependencyConflict)
    } else if AUTHORIZATION_CODES.contains(&code) {
        Some(ProviderErrorKind::AuthorizationFailure)
    } else if TRANSIENT_CODES.contains(&code) {
        Some(ProviderErrorKind::TransientNetworkFailure)
    } else {
        None
    }
}

/// Converts a failed CLI invocation into a [`ProviderError`].
pub(super) fn classify_failure(program: &str, output: &CommandOutput) -> ProviderError {
    if let Some(body) = parse_service_error(&output.stderr) {
        let kind = classify_service_error(body.status, body.code.as_deref());
        let message = body
            .message
            .unwrap_or_else(|| String::from("no message returned"));
        return ProviderError::new(kind, message).with_service_details(body.code, body.status);
    }

    let stderr = output.stderr.trim();
    let kind = if contains_any(stderr, WAIT_TIMEOUT_MARKERS) {
        ProviderErrorKind::WaitTimeout
    } else if contains_any(stderr, TRANSIENT_MARKERS) {
        ProviderErrorKind::TransientNetworkFailure
    } else {
        ProviderErrorKind::Other
    };
    ProviderError::new(
        kind,
        format!(
            "{program} exited with status {}: {stderr}",
            output.status_text()
        ),
    )
}

fn parse_service_error(stderr: &str) -> Option<ServiceErrorBody> {
    let (_, after_marker) = stderr.split_once(SERVICE_ERROR_MARKER)?;
    let start = after_marker.find('{')?;
    let json = after_marker.get(start..)?;
    serde_json::Deserializer::from_str(json)
        .into_iter::<ServiceErrorBody>()
        .next()?
        .ok()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
