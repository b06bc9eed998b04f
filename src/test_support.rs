//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::ffi::OsString;
use std::rc::Rc;

use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::provider::{ProviderError, ProviderErrorKind, ResourceClient};
use crate::resource::{ResourceIds, ResourceKind};
use crate::teardown::CancellationFlag;

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes a successful exit status.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Pushes a failing `oci` response carrying a service error body.
    pub fn push_service_error(&self, status: u16, code: &str, message: &str) {
        self.push_output(Some(1), "", service_error_stderr(status, code, message));
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, CommandError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| CommandError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Renders stderr the way the `oci` CLI reports a service error.
#[must_use]
pub fn service_error_stderr(status: u16, code: &str, message: &str) -> String {
    format!(
        "ServiceError:\n{{\n    \"code\": \"{code}\",\n    \"message\": \"{message}\",\n    \
         \"opc-request-id\": \"ABCDEF0123456789\",\n    \"status\": {status}\n}}\n"
    )
}

/// Identifier set with distinct, recognisable OCIDs for each resource.
#[must_use]
pub fn sample_ids() -> ResourceIds {
    ResourceIds {
        instance_pool_id: String::from("ocid1.instancepool.oc1..pool"),
        instance_configuration_id: String::from("ocid1.instanceconfiguration.oc1..config"),
        instance_subnet_id: String::from("ocid1.subnet.oc1..subnet"),
        instance_security_list_ocid: String::from("ocid1.securitylist.oc1..seclist"),
        rt_id: String::from("ocid1.routetable.oc1..rt"),
        ig_id: String::from("ocid1.internetgateway.oc1..ig"),
        vcn_id: String::from("ocid1.vcn.oc1..vcn"),
    }
}

/// In-memory [`ResourceClient`] with scripted per-kind failures.
///
/// Kinds without a scripted failure succeed. Every call is recorded.
#[derive(Clone, Debug, Default)]
pub struct ScriptedClient {
    failures: Rc<RefCell<BTreeMap<ResourceKind, ProviderError>>>,
    calls: Rc<RefCell<Vec<(ResourceKind, String)>>>,
    cancel_during: Rc<RefCell<Option<(ResourceKind, CancellationFlag)>>>,
}

impl ScriptedClient {
    /// Creates a client on which every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes calls for `kind` fail with an error of the given category.
    pub fn fail(&self, kind: ResourceKind, error: ProviderErrorKind) {
        self.failures
            .borrow_mut()
            .insert(kind, ProviderError::new(error, format!("scripted {error}")));
    }

    /// Makes calls for every kind fail with an error of the given category.
    pub fn fail_all(&self, error: ProviderErrorKind) {
        for kind in ResourceKind::TEARDOWN_ORDER {
            self.fail(kind, error);
        }
    }

    /// Cancels `flag` while the call for `kind` is in flight.
    pub fn cancel_during(&self, kind: ResourceKind, flag: CancellationFlag) {
        *self.cancel_during.borrow_mut() = Some((kind, flag));
    }

    /// Returns the calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(ResourceKind, String)> {
        self.calls.borrow().clone()
    }

    /// Returns only the kinds of the calls made so far.
    #[must_use]
    pub fn called_kinds(&self) -> Vec<ResourceKind> {
        self.calls.borrow().iter().map(|(kind, _)| *kind).collect()
    }
}

impl ResourceClient for ScriptedClient {
    fn ensure_absent(&self, kind: ResourceKind, id: &str) -> Result<(), ProviderError> {
        self.calls.borrow_mut().push((kind, id.to_owned()));
        if let Some((cancel_kind, flag)) = self.cancel_during.borrow().as_ref() {
            if *cancel_kind == kind {
                flag.cancel();
            }
        }
        self.failures
            .borrow()
            .get(&kind)
            .cloned()
            .map_or(Ok(()), Err)
    }
}
