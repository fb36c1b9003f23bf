use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::database::models::{
    max_quantity, Assignment, MonitoringEntry, MonitoringSource, NewMonitoringEntry,
    NewNurseryRecord, NurseryDetail, NurseryRecord, TreeDescription, QUANTITY_SCALE,
};
use crate::filter::NurseryFilter;
use crate::ledger::store::{Access, LedgerStore, LedgerTx};
use crate::ledger::LedgerError;

/// Committed contents of the in-memory store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    pub descriptions: BTreeMap<i32, TreeDescription>,
    pub nursery: BTreeMap<i32, NurseryRecord>,
    pub monitoring: BTreeMap<i32, MonitoringEntry>,
    next_nursery_id: i32,
    next_monitoring_id: i32,
}

impl MemoryState {
    /// Σ quantity_added over existing nursery rows of one description
    pub fn nursery_total(&self, tree_desc_id: i32) -> Decimal {
        self.nursery
            .values()
            .filter(|r| r.tree_desc_id == tree_desc_id)
            .map(|r| r.quantity_added)
            .sum()
    }

    pub fn quantity_nursery(&self, tree_desc_id: i32) -> Decimal {
        self.descriptions[&tree_desc_id].quantity_nursery
    }

    pub fn monitoring_for(&self, tree_desc_id: i32) -> Vec<&MonitoringEntry> {
        self.monitoring
            .values()
            .filter(|m| m.tree_desc_id == tree_desc_id)
            .collect()
    }
}

/// In-memory ledger store with whole-store transactions. A transaction works
/// on a private copy and holds the store lock until it commits or is dropped,
/// which gives serializable isolation.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
    failpoints: Arc<std::sync::Mutex<HashSet<&'static str>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_description(
        &self,
        tree_desc_id: i32,
        scientific_name: &str,
        quantity_nursery: Decimal,
    ) {
        let mut state = self.state.lock().await;
        state.descriptions.insert(
            tree_desc_id,
            TreeDescription {
                tree_desc_id,
                scientific_name: scientific_name.to_string(),
                kinyarwanda: None,
                family: None,
                products: None,
                quantity_nursery,
            },
        );
    }

    /// Make the named store operation fail until cleared
    pub fn fail_on(&self, operation: &'static str) {
        self.failpoints.lock().unwrap().insert(operation);
    }

    pub fn clear_failpoints(&self) {
        self.failpoints.lock().unwrap().clear();
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self, access: Access) -> Result<Box<dyn LedgerTx>, LedgerError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        let failpoints = self.failpoints.lock().unwrap().clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            access,
            failpoints,
        }))
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        if self.failpoints.lock().unwrap().contains("ping") {
            return Err(store_error("connection refused"));
        }
        Ok(())
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    access: Access,
    failpoints: HashSet<&'static str>,
}

impl MemoryTx {
    fn check(&self, operation: &'static str, writes: bool) -> Result<(), LedgerError> {
        if writes && self.access == Access::Snapshot {
            return Err(store_error("cannot execute in a read-only transaction"));
        }
        if self.failpoints.contains(operation) {
            return Err(store_error(&format!("injected failure in {}", operation)));
        }
        Ok(())
    }
}

fn store_error(message: &str) -> LedgerError {
    LedgerError::Store(sqlx::Error::Protocol(message.to_string()))
}

/// What Postgres does when assigning to a `NUMERIC(12, 2)` column
fn numeric_12_2(value: Decimal) -> Result<Decimal, LedgerError> {
    let rounded =
        value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded.abs() > max_quantity() {
        return Err(store_error("numeric field overflow"));
    }
    Ok(rounded)
}

fn positive_quantity(value: Decimal) -> Result<Decimal, LedgerError> {
    let stored = numeric_12_2(value)?;
    if stored <= Decimal::ZERO {
        return Err(store_error("violates check constraint trees_nursery_quantity_added_positive"));
    }
    Ok(stored)
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn lock_description(
        &mut self,
        tree_desc_id: i32,
    ) -> Result<Option<TreeDescription>, LedgerError> {
        self.check("lock_description", false)?;
        Ok(self.working.descriptions.get(&tree_desc_id).cloned())
    }

    async fn adjust_quantity_nursery(
        &mut self,
        tree_desc_id: i32,
        delta: Decimal,
    ) -> Result<TreeDescription, LedgerError> {
        self.check("adjust_quantity_nursery", true)?;
        let description = self
            .working
            .descriptions
            .get_mut(&tree_desc_id)
            .ok_or_else(|| LedgerError::description_not_found(tree_desc_id))?;
        let next = description
            .quantity_nursery
            .checked_add(delta)
            .ok_or_else(|| store_error("numeric field overflow"))
            .and_then(numeric_12_2)?;
        if next < Decimal::ZERO {
            return Err(store_error("violates check constraint quantity_nursery >= 0"));
        }
        description.quantity_nursery = next;
        Ok(description.clone())
    }

    async fn insert_nursery(
        &mut self,
        record: &NewNurseryRecord,
    ) -> Result<NurseryRecord, LedgerError> {
        self.check("insert_nursery", true)?;
        if !self.working.descriptions.contains_key(&record.tree_desc_id) {
            return Err(store_error("violates foreign key constraint on tree_desc_id"));
        }
        let quantity_added = positive_quantity(record.quantity_added)?;
        self.working.next_nursery_id += 1;
        let row = NurseryRecord {
            id: self.working.next_nursery_id,
            tree_desc_id: record.tree_desc_id,
            quantity_added,
            registration_date: record.registration_date,
            village_id: record.village_id.clone(),
            registered_by: record.registered_by,
            notes: record.notes.clone(),
            growing_method_id: record.growing_method_id,
            stage_id_nursery: record.stage_id_nursery,
            date_planted: record.date_planted,
            propagation_method: record.propagation_method.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.working.nursery.insert(row.id, row.clone());
        Ok(row)
    }

    async fn lock_nursery(&mut self, id: i32) -> Result<Option<NurseryRecord>, LedgerError> {
        self.check("lock_nursery", false)?;
        Ok(self.working.nursery.get(&id).cloned())
    }

    async fn update_nursery(
        &mut self,
        id: i32,
        assignments: &[Assignment],
    ) -> Result<NurseryRecord, LedgerError> {
        self.check("update_nursery", true)?;
        let row = self
            .working
            .nursery
            .get_mut(&id)
            .ok_or_else(|| LedgerError::nursery_not_found(id))?;
        row.apply(assignments, Utc::now());
        row.quantity_added = positive_quantity(row.quantity_added)?;
        Ok(row.clone())
    }

    async fn delete_nursery(&mut self, id: i32) -> Result<NurseryRecord, LedgerError> {
        self.check("delete_nursery", true)?;
        if self.working.monitoring.values().any(|m| m.nursery_id == Some(id)) {
            return Err(store_error(
                "violates foreign key constraint on tree_monitoring.nursery_id",
            ));
        }
        self.working
            .nursery
            .remove(&id)
            .ok_or_else(|| LedgerError::nursery_not_found(id))
    }

    async fn insert_monitoring(
        &mut self,
        entry: &NewMonitoringEntry,
    ) -> Result<MonitoringEntry, LedgerError> {
        self.check("insert_monitoring", true)?;
        self.working.next_monitoring_id += 1;
        let row = MonitoringEntry {
            id: self.working.next_monitoring_id,
            tree_desc_id: entry.tree_desc_id,
            nursery_id: entry.nursery_id,
            monitoring_date: entry.monitoring_date,
            quantity: numeric_12_2(entry.quantity)?,
            health_status: entry.health_status.clone(),
            source: entry.source.code(),
            monitored_by: entry.monitored_by,
            notes: entry.notes.clone(),
            created_at: Utc::now(),
        };
        self.working.monitoring.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_monitoring_for_nursery(
        &mut self,
        nursery_id: i32,
        source: MonitoringSource,
    ) -> Result<u64, LedgerError> {
        self.check("delete_monitoring", true)?;
        let before = self.working.monitoring.len();
        self.working
            .monitoring
            .retain(|_, m| !(m.nursery_id == Some(nursery_id) && m.source == source.code()));
        Ok((before - self.working.monitoring.len()) as u64)
    }

    async fn select_nursery(
        &mut self,
        filter: &NurseryFilter,
    ) -> Result<Vec<NurseryDetail>, LedgerError> {
        self.check("select_nursery", false)?;
        let mut rows: Vec<NurseryDetail> = self
            .working
            .nursery
            .values()
            .filter(|r| filter.matches(r))
            .filter_map(|r| {
                let d = self.working.descriptions.get(&r.tree_desc_id)?;
                Some(NurseryDetail {
                    record: r.clone(),
                    scientific_name: d.scientific_name.clone(),
                    kinyarwanda: d.kinyarwanda.clone(),
                    family: d.family.clone(),
                    total_nursery_quantity: d.quantity_nursery,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.record
                .registration_date
                .cmp(&a.record.registration_date)
                .then(b.record.id.cmp(&a.record.id))
        });
        Ok(rows)
    }

    async fn select_monitoring(
        &mut self,
        tree_desc_ids: &[i32],
        source: MonitoringSource,
    ) -> Result<Vec<MonitoringEntry>, LedgerError> {
        self.check("select_monitoring", false)?;
        Ok(self
            .working
            .monitoring
            .values()
            .filter(|m| m.source == source.code() && tree_desc_ids.contains(&m.tree_desc_id))
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let MemoryTx {
            mut guard, working, access, ..
        } = *self;
        if access == Access::ReadWrite {
            *guard = working;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        Ok(())
    }
}
