mod common;

use common::{init_tracing, shared, MockComponents, MockFilters};
use deployd_engine::{DeployError, PlanValidator, ValidationState};
use deployd_types::{ConditionPair, Plan, Rule};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn validator(filters: &Arc<MockFilters>, components: &Arc<MockComponents>) -> PlanValidator {
    PlanValidator::new(filters.clone(), components.clone())
}

fn plan_with_filters(names: &[&str]) -> Plan {
    Plan::new(
        "app1",
        ConditionPair::allow(names.iter().copied()),
        vec![Rule::unconditional("v1")],
    )
    .with_owner("owner-1")
}

// ── Filters stage ────────────────────────────────────────────────

#[tokio::test]
async fn unknown_filters_are_all_reported() {
    init_tracing();
    let filters = shared(MockFilters::new().with_known(["known"]));
    let components = shared(MockComponents::with_versions(["v1"]));

    let err = validator(&filters, &components)
        .validate(&plan_with_filters(&["known", "ghost1", "ghost2"]))
        .await
        .unwrap_err();

    match err {
        DeployError::InvalidFilters {
            owner_id,
            package_ref,
            filters: missing,
        } => {
            assert_eq!(owner_id, "owner-1");
            assert_eq!(package_ref, "app1");
            assert_eq!(missing, vec!["ghost1", "ghost2"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // later stages never ran
    assert!(components.version_calls().is_empty());
    assert_eq!(components.package_calls(), 0);
}

#[tokio::test]
async fn filters_from_every_condition_are_checked_once() {
    let filters = shared(MockFilters::new().with_known(["a", "b", "c"]));
    let components = shared(MockComponents::with_versions(["v1", "v2"]));
    let plan = Plan::new(
        "app1",
        ConditionPair::allow(["a"]).and_deny(["b"]),
        vec![
            Rule::new("v1", ConditionPair::allow(["a", "c"])),
            Rule::new("v2", ConditionPair::deny(["b"])),
        ],
    );

    validator(&filters, &components).validate(&plan).await.unwrap();

    let mut checked = filters.exists_calls();
    checked.sort();
    assert_eq!(checked, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn repeated_unknown_filter_is_reported_once() {
    let filters = shared(MockFilters::new());
    let components = shared(MockComponents::with_versions(["v1"]));
    let plan = Plan::new(
        "app1",
        ConditionPair::deny(["ghost"]),
        vec![Rule::new("v1", ConditionPair::allow(["ghost"]))],
    );

    let err = validator(&filters, &components)
        .check_filters(&plan)
        .await
        .unwrap_err();
    assert_eq!(err.details(), ["ghost".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn filter_checks_run_concurrently() {
    let filters = shared(
        MockFilters::new()
            .with_known(["a", "b", "c"])
            .with_delay(Duration::from_millis(50)),
    );
    let components = shared(MockComponents::with_versions(["v1"]));

    validator(&filters, &components)
        .check_filters(&plan_with_filters(&["a", "b", "c"]))
        .await
        .unwrap();

    assert_eq!(filters.max_in_flight(), 3);
}

#[tokio::test(start_paused = true)]
async fn filter_service_failure_waits_for_siblings_then_propagates() {
    let filters = shared(
        MockFilters::new()
            .with_known(["a", "c"])
            .with_failing(["b"])
            .with_delay(Duration::from_millis(50)),
    );
    let components = shared(MockComponents::with_versions(["v1"]));
    let started = tokio::time::Instant::now();

    let err = validator(&filters, &components)
        .validate(&plan_with_filters(&["a", "b", "c"]))
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::FilterService(_)));
    assert!(!err.is_validation_failure());
    // "b" fails at once; the slower checks of "a" and "c" still finish
    assert_eq!(filters.completed(), 3);
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(components.version_calls().is_empty());
}

// ── Versions stage ───────────────────────────────────────────────

#[tokio::test]
async fn unknown_versions_are_all_reported() {
    let filters = shared(MockFilters::new());
    let components = shared(MockComponents::with_versions(["v2"]));
    let plan = Plan::new(
        "app1",
        ConditionPair::unconstrained(),
        vec![
            Rule::unconditional("v1"),
            Rule::unconditional("v2"),
            Rule::unconditional("v3"),
        ],
    )
    .with_owner("owner-1");

    let err = validator(&filters, &components)
        .validate(&plan)
        .await
        .unwrap_err();

    match err {
        DeployError::InvalidVersions { versions, .. } => {
            assert_eq!(versions, vec!["v1", "v3"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(components.package_calls(), 0);
}

#[tokio::test]
async fn component_failure_on_versions_propagates() {
    let filters = shared(MockFilters::new());
    let components = shared(MockComponents::with_versions(["v1"]).failing_versions());
    let plan = Plan::new("app1", ConditionPair::unconstrained(), vec![Rule::unconditional("v1")]);

    let err = validator(&filters, &components)
        .validate(&plan)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::ComponentService(_)));
    assert_eq!(components.package_calls(), 0);
}

// ── Package stage ────────────────────────────────────────────────

#[tokio::test]
async fn unknown_package_is_rejected() {
    let filters = shared(MockFilters::new());
    let components = shared(MockComponents::with_versions(["v1"]).without_package());
    let plan = Plan::new("app1", ConditionPair::unconstrained(), vec![Rule::unconditional("v1")])
        .with_owner("owner-1");

    let err = validator(&filters, &components)
        .validate(&plan)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DeployError::InvalidPackage { ref package_ref, .. } if package_ref == "app1"
    ));
    assert!(err.is_validation_failure());
}

#[tokio::test]
async fn valid_plan_passes_every_stage() {
    let filters = shared(MockFilters::new().with_known(["eu"]));
    let components = shared(MockComponents::with_versions(["v1"]));
    let plan = Plan::new(
        "app1",
        ConditionPair::allow(["eu"]),
        vec![Rule::unconditional("v1")],
    );

    validator(&filters, &components).validate(&plan).await.unwrap();

    assert_eq!(filters.exists_calls(), vec!["eu"]);
    assert_eq!(components.version_calls(), vec!["v1"]);
    assert_eq!(components.package_calls(), 1);
}

#[tokio::test]
async fn plan_without_filters_or_rules_only_checks_package() {
    let filters = shared(MockFilters::new());
    let components = shared(MockComponents::with_versions(["v1"]));
    let plan = Plan::new("app1", ConditionPair::unconstrained(), vec![]);

    validator(&filters, &components).validate(&plan).await.unwrap();

    assert!(filters.exists_calls().is_empty());
    assert!(components.version_calls().is_empty());
    assert_eq!(components.package_calls(), 1);
}

// ── State machine ────────────────────────────────────────────────

#[test]
fn state_machine_accepts_after_three_stages() {
    let state = ValidationState::Init
        .advance(true)
        .advance(true)
        .advance(true);
    assert_eq!(state, ValidationState::PackageChecked);
    assert_eq!(state.advance(true), ValidationState::Accepted);
}

#[test]
fn state_machine_rejects_on_any_failed_stage() {
    assert_eq!(ValidationState::Init.advance(false), ValidationState::Rejected);
    assert_eq!(
        ValidationState::FiltersChecked.advance(false),
        ValidationState::Rejected
    );
    assert_eq!(
        ValidationState::VersionsChecked.advance(false),
        ValidationState::Rejected
    );
}

#[test]
fn terminal_states_do_not_move() {
    assert!(ValidationState::Rejected.is_terminal());
    assert!(ValidationState::Accepted.is_terminal());
    assert_eq!(ValidationState::Rejected.advance(true), ValidationState::Rejected);
    assert_eq!(ValidationState::Accepted.advance(false), ValidationState::Accepted);
    assert!(!ValidationState::Init.is_terminal());
}
