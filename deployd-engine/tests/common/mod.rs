//! Recording test doubles for the engine's collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use deployd_engine::{
    ComponentCatalog, DeployError, DeployResult, FilterCatalog, FilterMatcher, PlanStore,
};
use deployd_types::{DeviceRequest, Page, PageRequest, Plan, PlanId};
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("deployd_engine=debug")
        .with_test_writer()
        .try_init();
}

// ── Filter service ───────────────────────────────────────────────

/// Filter service double.
///
/// A device matches a filter list when every listed name is in `matching`.
#[derive(Default)]
pub struct MockFilters {
    known: HashSet<String>,
    matching: HashSet<String>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    exists_calls: Mutex<Vec<String>>,
    match_calls: Mutex<Vec<Vec<String>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl MockFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known<I: IntoIterator<Item = &'static str>>(mut self, names: I) -> Self {
        self.known.extend(names.into_iter().map(String::from));
        self
    }

    pub fn with_matching<I: IntoIterator<Item = &'static str>>(mut self, names: I) -> Self {
        self.matching.extend(names.into_iter().map(String::from));
        self
    }

    /// Names whose existence or match check fails with a service error.
    /// Failing existence checks answer at once, without the delay.
    pub fn with_failing<I: IntoIterator<Item = &'static str>>(mut self, names: I) -> Self {
        self.failing.extend(names.into_iter().map(String::from));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn exists_calls(&self) -> Vec<String> {
        self.exists_calls.lock().unwrap().clone()
    }

    pub fn match_calls(&self) -> Vec<Vec<String>> {
        self.match_calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Existence checks that ran to completion, failed ones included.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FilterCatalog for MockFilters {
    async fn filter_exists(&self, _owner_id: &str, filter_name: &str) -> DeployResult<bool> {
        self.exists_calls.lock().unwrap().push(filter_name.to_string());
        if self.failing.contains(filter_name) {
            self.completed.fetch_add(1, Ordering::SeqCst);
            return Err(DeployError::FilterService(format!("500 for {filter_name}")));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(self.known.contains(filter_name))
    }
}

#[async_trait]
impl FilterMatcher for MockFilters {
    async fn matches(&self, _request: &DeviceRequest, filters: &[String]) -> DeployResult<bool> {
        assert!(!filters.is_empty(), "matcher called with no filters");
        self.match_calls.lock().unwrap().push(filters.to_vec());
        if filters.iter().any(|f| self.failing.contains(f)) {
            return Err(DeployError::FilterService("match failed".into()));
        }
        Ok(filters.iter().all(|f| self.matching.contains(f)))
    }
}

// ── Component service ────────────────────────────────────────────

#[derive(Default)]
pub struct MockComponents {
    versions: HashSet<String>,
    package_exists: bool,
    fail_versions: bool,
    version_calls: Mutex<Vec<String>>,
    package_calls: AtomicUsize,
}

impl MockComponents {
    /// A component service where the package exists with `versions`.
    pub fn with_versions<I: IntoIterator<Item = &'static str>>(versions: I) -> Self {
        Self {
            versions: versions.into_iter().map(String::from).collect(),
            package_exists: true,
            ..Default::default()
        }
    }

    pub fn without_package(mut self) -> Self {
        self.package_exists = false;
        self
    }

    pub fn failing_versions(mut self) -> Self {
        self.fail_versions = true;
        self
    }

    pub fn version_calls(&self) -> Vec<String> {
        self.version_calls.lock().unwrap().clone()
    }

    pub fn package_calls(&self) -> usize {
        self.package_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComponentCatalog for MockComponents {
    async fn version_exists(
        &self,
        _owner_id: &str,
        _package_ref: &str,
        version_id: &str,
    ) -> DeployResult<bool> {
        self.version_calls.lock().unwrap().push(version_id.to_string());
        if self.fail_versions {
            return Err(DeployError::ComponentService("503".into()));
        }
        Ok(self.versions.contains(version_id))
    }

    async fn package_exists(&self, _owner_id: &str, _package_ref: &str) -> DeployResult<bool> {
        self.package_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.package_exists)
    }
}

// ── Plan store ───────────────────────────────────────────────────

/// In-memory plan store; later inserts supersede earlier ones.
#[derive(Default)]
pub struct MockStore {
    plans: Mutex<Vec<Plan>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with plans for `owner_id`, oldest first.
    pub fn with_plans(owner_id: &str, plans: Vec<Plan>) -> Self {
        let store = Self::new();
        {
            let mut stored = store.plans.lock().unwrap();
            for plan in plans {
                stored.push(stamp(plan.with_owner(owner_id)));
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.plans.lock().unwrap().len()
    }

    fn active(&self, owner_id: &str) -> Vec<Plan> {
        let plans = self.plans.lock().unwrap();
        let mut seen = HashSet::new();
        let mut active: Vec<Plan> = plans
            .iter()
            .rev()
            .filter(|p| p.owner_id == owner_id)
            .filter(|p| seen.insert(p.package_ref.clone()))
            .cloned()
            .collect();
        active.sort_by(|a, b| a.package_ref.cmp(&b.package_ref));
        active
    }
}

fn stamp(mut plan: Plan) -> Plan {
    plan.id = Some(PlanId::generate());
    plan.created_at = Some(chrono::Utc::now());
    plan
}

#[async_trait]
impl PlanStore for MockStore {
    async fn insert(&self, plan: Plan) -> DeployResult<Plan> {
        let plan = stamp(plan);
        self.plans.lock().unwrap().push(plan.clone());
        Ok(plan)
    }

    async fn active_plans_for(&self, owner_id: &str) -> DeployResult<Vec<Plan>> {
        Ok(self.active(owner_id))
    }

    async fn active_plan(&self, owner_id: &str, package_ref: &str) -> DeployResult<Option<Plan>> {
        Ok(self
            .active(owner_id)
            .into_iter()
            .find(|p| p.package_ref == package_ref))
    }

    async fn all_deployed_versions(
        &self,
        owner_id: &str,
        package_ref: &str,
    ) -> DeployResult<BTreeSet<String>> {
        let plans = self.plans.lock().unwrap();
        Ok(plans
            .iter()
            .filter(|p| p.owner_id == owner_id && p.package_ref == package_ref)
            .flat_map(|p| p.extract_versions())
            .collect())
    }

    async fn plans_referencing_filter(
        &self,
        owner_id: &str,
        filter_name: &str,
        page: PageRequest,
    ) -> DeployResult<Page<Plan>> {
        let matching: Vec<Plan> = self
            .active(owner_id)
            .into_iter()
            .filter(|p| p.references_filter(filter_name))
            .collect();
        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();
        Ok(Page::new(content, page, total))
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
