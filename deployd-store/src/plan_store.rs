//! Plan persistence backed by SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deployd_engine::{DeployError, DeployResult, PlanStore};
use deployd_types::{Page, PageRequest, Plan, PlanId};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Latest plan per package for the owner bound to `?1`.
const ACTIVE_PLANS: &str = "
    WITH ranked AS (
        SELECT id, owner_id, package_ref, created_at, body,
               ROW_NUMBER() OVER (
                   PARTITION BY package_ref
                   ORDER BY created_at DESC, seq DESC
               ) AS rn
        FROM plans
        WHERE owner_id = ?1
    ),
    active AS (
        SELECT id, owner_id, package_ref, created_at, body
        FROM ranked
        WHERE rn = 1
    )";

const REFERENCES_FILTER: &str = "EXISTS (
    SELECT 1 FROM plan_filters f WHERE f.plan_id = active.id AND f.filter_name = ?2
)";

/// Raw plan row: id, owner, creation millis, JSON body.
type PlanRow = (String, String, i64, String);

/// Persistent store for deployment plans backed by SQLite.
///
/// Cloning is cheap; clones share one connection.
#[derive(Clone)]
pub struct SqlitePlanStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlanStore {
    /// Opens (or creates) a plan store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory plan store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS plans (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                owner_id TEXT NOT NULL,
                package_ref TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                body TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_plans_recency
                ON plans (owner_id, package_ref, created_at DESC);

            CREATE TABLE IF NOT EXISTS plan_filters (
                plan_id TEXT NOT NULL REFERENCES plans (id),
                filter_name TEXT NOT NULL,
                UNIQUE(plan_id, filter_name)
            );

            CREATE INDEX IF NOT EXISTS idx_plan_filters_name
                ON plan_filters (filter_name);

            CREATE TABLE IF NOT EXISTS plan_versions (
                plan_id TEXT NOT NULL REFERENCES plans (id),
                version_id TEXT NOT NULL,
                UNIQUE(plan_id, version_id)
            );
            ",
        )?;
        Ok(())
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Stores a plan, assigning a fresh id and the current time.
    ///
    /// Creation time is kept at millisecond precision, so the returned plan
    /// equals what later reads produce.
    pub fn save_plan(&self, mut plan: Plan) -> StoreResult<Plan> {
        let now = Utc::now();
        let created_at = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        let id = PlanId::generate();
        plan.id = Some(id);
        plan.created_at = Some(created_at);

        let body = serde_json::to_string(&plan)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO plans (id, owner_id, package_ref, created_at, body) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                plan.owner_id,
                plan.package_ref,
                created_at.timestamp_millis(),
                body,
            ],
        )?;
        for filter in plan.extract_filters() {
            tx.execute(
                "INSERT OR IGNORE INTO plan_filters (plan_id, filter_name) VALUES (?1, ?2)",
                params![id.to_string(), filter],
            )?;
        }
        for version in plan.extract_versions() {
            tx.execute(
                "INSERT OR IGNORE INTO plan_versions (plan_id, version_id) VALUES (?1, ?2)",
                params![id.to_string(), version],
            )?;
        }
        tx.commit()?;

        debug!(plan = %id, owner = %plan.owner_id, package = %plan.package_ref, "stored plan");
        Ok(plan)
    }

    // ── Reads ────────────────────────────────────────────────────

    /// The active plan of every package the owner has published, ordered by
    /// package reference.
    pub fn load_active_plans(&self, owner_id: &str) -> StoreResult<Vec<Plan>> {
        let conn = self.conn()?;
        let sql = format!(
            "{ACTIVE_PLANS} SELECT id, owner_id, created_at, body FROM active ORDER BY package_ref"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![owner_id], read_row)?;
        collect_plans(rows)
    }

    /// The active plan of one package.
    pub fn load_active_plan(&self, owner_id: &str, package_ref: &str) -> StoreResult<Option<Plan>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, owner_id, created_at, body FROM plans
                 WHERE owner_id = ?1 AND package_ref = ?2
                 ORDER BY created_at DESC, seq DESC
                 LIMIT 1",
                params![owner_id, package_ref],
                read_row,
            )
            .optional()?;
        row.map(plan_from_row).transpose()
    }

    /// Every version named by any plan ever stored for the package.
    pub fn load_deployed_versions(
        &self,
        owner_id: &str,
        package_ref: &str,
    ) -> StoreResult<BTreeSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT v.version_id FROM plan_versions v
             JOIN plans p ON p.id = v.plan_id
             WHERE p.owner_id = ?1 AND p.package_ref = ?2",
        )?;
        let versions = stmt
            .query_map(params![owner_id, package_ref], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(versions)
    }

    /// Active plans mentioning `filter_name` in any condition, ordered by
    /// package reference.
    pub fn find_active_by_filter(
        &self,
        owner_id: &str,
        filter_name: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Plan>> {
        let conn = self.conn()?;

        let count_sql = format!("{ACTIVE_PLANS} SELECT COUNT(*) FROM active WHERE {REFERENCES_FILTER}");
        let total: i64 = conn.query_row(&count_sql, params![owner_id, filter_name], |row| {
            row.get(0)
        })?;

        let page_sql = format!(
            "{ACTIVE_PLANS} SELECT id, owner_id, created_at, body FROM active
             WHERE {REFERENCES_FILTER}
             ORDER BY package_ref
             LIMIT ?3 OFFSET ?4"
        );
        let mut stmt = conn.prepare(&page_sql)?;
        let rows = stmt.query_map(
            params![owner_id, filter_name, page.size as i64, page.offset() as i64],
            read_row,
        )?;
        let content = collect_plans(rows)?;
        Ok(Page::new(content, page, total.max(0) as u64))
    }

    /// Returns the total number of stored plans, superseded ones included.
    pub fn plan_count(&self) -> StoreResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM plans", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Runs `f` against a clone of the store on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> DeployResult<T>
    where
        T: Send + 'static,
        F: FnOnce(SqlitePlanStore) -> StoreResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| DeployError::Task(format!("plan store task failed: {e}")))?
            .map_err(DeployError::from)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlanRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn collect_plans(
    rows: impl Iterator<Item = rusqlite::Result<PlanRow>>,
) -> StoreResult<Vec<Plan>> {
    let mut plans = Vec::new();
    for row in rows {
        plans.push(plan_from_row(row?)?);
    }
    Ok(plans)
}

fn plan_from_row((id, owner_id, created_ms, body): PlanRow) -> StoreResult<Plan> {
    let mut plan: Plan = serde_json::from_str(&body)?;
    plan.id = Some(
        PlanId::parse(&id).map_err(|e| StoreError::InvalidData(e.to_string()))?,
    );
    plan.owner_id = owner_id;
    plan.created_at = Some(DateTime::from_timestamp_millis(created_ms).ok_or_else(|| {
        StoreError::InvalidData(format!("creation time out of range for plan {id}"))
    })?);
    Ok(plan)
}

// ── PlanStore ────────────────────────────────────────────────────

#[async_trait]
impl PlanStore for SqlitePlanStore {
    async fn insert(&self, plan: Plan) -> DeployResult<Plan> {
        self.blocking(move |store| store.save_plan(plan)).await
    }

    async fn active_plans_for(&self, owner_id: &str) -> DeployResult<Vec<Plan>> {
        let owner_id = owner_id.to_string();
        self.blocking(move |store| store.load_active_plans(&owner_id))
            .await
    }

    async fn active_plan(&self, owner_id: &str, package_ref: &str) -> DeployResult<Option<Plan>> {
        let (owner_id, package_ref) = (owner_id.to_string(), package_ref.to_string());
        self.blocking(move |store| store.load_active_plan(&owner_id, &package_ref))
            .await
    }

    async fn all_deployed_versions(
        &self,
        owner_id: &str,
        package_ref: &str,
    ) -> DeployResult<BTreeSet<String>> {
        let (owner_id, package_ref) = (owner_id.to_string(), package_ref.to_string());
        self.blocking(move |store| store.load_deployed_versions(&owner_id, &package_ref))
            .await
    }

    async fn plans_referencing_filter(
        &self,
        owner_id: &str,
        filter_name: &str,
        page: PageRequest,
    ) -> DeployResult<Page<Plan>> {
        let (owner_id, filter_name) = (owner_id.to_string(), filter_name.to_string());
        self.blocking(move |store| store.find_active_by_filter(&owner_id, &filter_name, page))
            .await
    }
}
