//! Step definitions, scenarios and doubles for teardown behaviour.

mod bdd_steps;
mod test_doubles;
