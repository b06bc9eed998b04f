//! BDD step definitions for teardown behaviour.

use oci_teardown::{ResourceKind, StepOutcome, TeardownError, TeardownSequencer};
use rstest_bdd_macros::{given, then, when};

use super::test_doubles::FakeTenancy;
use super::test_helpers::{TeardownContext, TeardownOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn parse_kind(text: &str) -> Result<ResourceKind, StepError> {
    text.parse()
        .map_err(|err| StepError::Assertion(format!("unknown resource kind: {err}")))
}

fn failure(teardown_context: &TeardownContext) -> Result<&TeardownError, StepError> {
    match teardown_context.outcome.as_ref() {
        Some(TeardownOutcome::Failure(err)) => Ok(err),
        Some(TeardownOutcome::Success(report)) => Err(StepError::Assertion(format!(
            "expected teardown to fail, got {report:?}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[given("a tenancy holding the pool, its configuration and network")]
fn provisioned_tenancy(mut teardown_context: TeardownContext) -> TeardownContext {
    teardown_context.tenancy = FakeTenancy::provisioned();
    teardown_context
}

#[given("the teardown has already completed once")]
fn teardown_completed_once(teardown_context: TeardownContext) -> TeardownContext {
    let sequencer = TeardownSequencer::new(teardown_context.tenancy.clone());
    if let Err(err) = sequencer.teardown(&teardown_context.ids) {
        panic!("first teardown should succeed: {err}");
    }
    teardown_context.tenancy.clear_calls();
    teardown_context
}

#[given("an instance launched outside the pool is attached to the subnet")]
fn stray_instance(teardown_context: TeardownContext) -> TeardownContext {
    teardown_context.tenancy.launch_stray_instance();
    teardown_context
}

#[given("the pool runs {count:u32} instances in the subnet")]
fn pool_instances(teardown_context: TeardownContext, count: u32) -> TeardownContext {
    teardown_context.tenancy.launch_pool_instances(count);
    teardown_context
}

#[when("I run the teardown")]
fn run_teardown(mut teardown_context: TeardownContext) -> TeardownContext {
    let sequencer = TeardownSequencer::new(teardown_context.tenancy.clone());
    teardown_context.outcome = Some(match sequencer.teardown(&teardown_context.ids) {
        Ok(report) => TeardownOutcome::Success(report),
        Err(err) => TeardownOutcome::Failure(err),
    });
    teardown_context
}

#[then("the teardown succeeds with {deleted:u32} deleted and {absent:u32} already absent")]
fn succeeds_with_counts(
    teardown_context: &TeardownContext,
    deleted: u32,
    absent: u32,
) -> Result<(), StepError> {
    let Some(outcome) = teardown_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from("missing outcome")));
    };
    let TeardownOutcome::Success(report) = outcome else {
        return Err(StepError::Assertion(format!(
            "expected success, got: {outcome:?}"
        )));
    };
    if report.deleted() == deleted as usize && report.already_absent() == absent as usize {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {deleted} deleted and {absent} already absent, got {report:?}"
        )))
    }
}

#[then("the provider saw deletions in dependency order")]
fn deletions_in_order(teardown_context: &TeardownContext) -> Result<(), StepError> {
    let seen = teardown_context
        .tenancy
        .calls()
        .into_iter()
        .map(|call| (call.kind, call.id))
        .collect::<Vec<_>>();
    let expected = teardown_context
        .ids
        .in_teardown_order()
        .map(|(kind, id)| (kind, id.to_owned()))
        .collect::<Vec<_>>();
    if seen == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected calls {expected:?}, got {seen:?}"
        )))
    }
}

#[then("the teardown fails at step {step:u32} for the \"{kind}\"")]
fn fails_at_step(
    teardown_context: &TeardownContext,
    step: u32,
    kind: String,
) -> Result<(), StepError> {
    let expected_kind = parse_kind(&kind)?;
    let err = failure(teardown_context)?;
    let TeardownError::StepFailed {
        step: failed_step,
        kind: failed_kind,
        source,
        ..
    } = err
    else {
        return Err(StepError::Assertion(format!(
            "expected a failed step, got: {err}"
        )));
    };
    if *failed_step != step as usize || *failed_kind != expected_kind {
        return Err(StepError::Assertion(format!(
            "expected failure at step {step} ({expected_kind}), got: {err}"
        )));
    }
    if source.is_not_found() {
        return Err(StepError::Assertion(format!(
            "not-found must never be fatal: {err}"
        )));
    }
    Ok(())
}

#[then("the \"{first}\" and \"{second}\" are confirmed absent")]
fn confirmed_absent(
    teardown_context: &TeardownContext,
    first: String,
    second: String,
) -> Result<(), StepError> {
    let expected = [parse_kind(&first)?, parse_kind(&second)?];
    let err = failure(teardown_context)?;
    let confirmed = err
        .completed()
        .iter()
        .filter(|record| record.outcome == StepOutcome::Deleted)
        .map(|record| record.kind)
        .collect::<Vec<_>>();
    if confirmed == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {expected:?} confirmed absent, got {confirmed:?}"
        )))
    }
}

#[then("{count:u32} steps are never attempted")]
fn steps_not_attempted(teardown_context: &TeardownContext, count: u32) -> Result<(), StepError> {
    let attempted = teardown_context.tenancy.calls().len();
    let skipped = ResourceKind::TEARDOWN_ORDER.len().saturating_sub(attempted);
    if skipped == count as usize {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} steps skipped, but {attempted} were attempted"
        )))
    }
}

#[then("the pool instances are gone before the subnet is deleted")]
fn pool_instances_gone(teardown_context: &TeardownContext) -> Result<(), StepError> {
    let calls = teardown_context.tenancy.calls();
    let Some(pool) = calls
        .iter()
        .find(|call| call.kind == ResourceKind::InstancePool)
    else {
        return Err(StepError::Assertion(String::from(
            "instance pool was never deleted",
        )));
    };
    if pool.instances_on_subnet == 0 {
        return Err(StepError::Assertion(String::from(
            "expected instances to be running before the pool was deleted",
        )));
    }
    let Some(subnet) = calls.iter().find(|call| call.kind == ResourceKind::Subnet) else {
        return Err(StepError::Assertion(String::from(
            "subnet was never deleted",
        )));
    };
    if subnet.instances_on_subnet == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "{} instances still attached when the subnet was deleted",
            subnet.instances_on_subnet
        )))
    }
}
