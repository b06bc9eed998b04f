//! In-memory tenancy that enforces OCI attachment rules on delete.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use oci_teardown::{ProviderError, ProviderErrorKind, ResourceClient, ResourceKind};

/// Simulated tenancy holding one of each resource kind.
///
/// Deleting a resource that is still referenced fails with a dependency
/// conflict; deleting a missing resource fails with not-found. Terminating
/// the instance pool also terminates the instances it launched.
#[derive(Clone, Debug)]
pub struct FakeTenancy {
    state: Rc<RefCell<State>>,
}

#[derive(Debug)]
struct State {
    present: BTreeSet<ResourceKind>,
    pool_instances: u32,
    stray_instances: u32,
    calls: Vec<Call>,
}

/// A recorded ensure-absent call and what the tenancy looked like at the
/// time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Call {
    pub kind: ResourceKind,
    pub id: String,
    pub instances_on_subnet: u32,
}

impl FakeTenancy {
    pub fn provisioned() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                present: ResourceKind::TEARDOWN_ORDER.into_iter().collect(),
                pool_instances: 0,
                stray_instances: 0,
                calls: Vec::new(),
            })),
        }
    }

    pub fn launch_pool_instances(&self, count: u32) {
        self.state.borrow_mut().pool_instances += count;
    }

    pub fn launch_stray_instance(&self) {
        self.state.borrow_mut().stray_instances += 1;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }
}

impl State {
    fn instances_on_subnet(&self) -> u32 {
        self.pool_instances + self.stray_instances
    }

    fn blockers(&self, kind: ResourceKind) -> Vec<String> {
        let present = |other: ResourceKind| self.present.contains(&other);
        let mut blockers = Vec::new();
        match kind {
            ResourceKind::InstancePool => {}
            ResourceKind::InstanceConfiguration => {
                if present(ResourceKind::InstancePool) {
                    blockers.push(String::from("instance pool"));
                }
            }
            ResourceKind::Subnet => {
                if self.instances_on_subnet() > 0 {
                    blockers.push(format!("{} attached VNICs", self.instances_on_subnet()));
                }
            }
            ResourceKind::SecurityList | ResourceKind::RouteTable => {
                if present(ResourceKind::Subnet) {
                    blockers.push(String::from("subnet"));
                }
            }
            ResourceKind::InternetGateway => {
                if present(ResourceKind::RouteTable) {
                    blockers.push(String::from("route table"));
                }
            }
            ResourceKind::VirtualNetwork => {
                blockers.extend(
                    [
                        ResourceKind::Subnet,
                        ResourceKind::SecurityList,
                        ResourceKind::RouteTable,
                        ResourceKind::InternetGateway,
                    ]
                    .into_iter()
                    .filter(|other| present(*other))
                    .map(|other| other.label().to_owned()),
                );
            }
        }
        blockers
    }
}

impl ResourceClient for FakeTenancy {
    fn ensure_absent(&self, kind: ResourceKind, id: &str) -> Result<(), ProviderError> {
        let mut state = self.state.borrow_mut();
        let instances_on_subnet = state.instances_on_subnet();
        state.calls.push(Call {
            kind,
            id: id.to_owned(),
            instances_on_subnet,
        });

        if !state.present.contains(&kind) {
            return Err(ProviderError::new(
                ProviderErrorKind::NotFound,
                format!("{kind} {id} not found"),
            )
            .with_service_details(Some(String::from("NotAuthorizedOrNotFound")), Some(404)));
        }

        let blockers = state.blockers(kind);
        if !blockers.is_empty() {
            return Err(ProviderError::new(
                ProviderErrorKind::DependencyConflict,
                format!("{kind} {id} is still referenced by {}", blockers.join(", ")),
            )
            .with_service_details(Some(String::from("Conflict")), Some(409)));
        }

        state.present.remove(&kind);
        if kind == ResourceKind::InstancePool {
            state.pool_instances = 0;
        }
        Ok(())
    }
}
