use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::history::{attach_history, description_ids, NurseryWithHistory};
use super::store::{Access, LedgerStore, LedgerTx};
use super::LedgerError;
use crate::database::models::{
    max_quantity, MonitoringEntry, MonitoringSource, NewMonitoringEntry, NewNurseryRecord,
    NurseryChanges, NurseryRecord, TreeDescription, HEALTH_ACTIVE,
};
use crate::filter::NurseryFilter;

/// Rows touched by a registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub nursery: NurseryRecord,
    pub tree_description: TreeDescription,
    pub monitoring: MonitoringEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deletion {
    pub deleted_record: NurseryRecord,
    pub removed_monitoring: u64,
}

/// Keeps `trees_nursery`, `tree_description.quantity_nursery` and the
/// nursery-source part of `tree_monitoring` consistent. Every mutation runs in
/// one store transaction; no other code path writes those fields.
#[derive(Clone)]
pub struct NurseryLedger {
    store: Arc<dyn LedgerStore>,
}

impl NurseryLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn ping(&self) -> Result<(), LedgerError> {
        self.store.ping().await
    }

    /// Record new stock: insert the transaction, grow the aggregate, log an
    /// `active` monitoring entry.
    pub async fn register(&self, record: NewNurseryRecord) -> Result<Registration, LedgerError> {
        let mut tx = self.store.begin(Access::ReadWrite).await?;
        let outcome = apply_register(tx.as_mut(), &record).await;
        let registration = finish(tx, outcome, "register").await?;

        info!(
            "Registered nursery record {} (+{} for tree description {})",
            registration.nursery.id, record.quantity_added, record.tree_desc_id
        );
        Ok(registration)
    }

    /// Apply a partial update; a quantity change moves the aggregate by the delta
    pub async fn update(
        &self,
        id: i32,
        changes: NurseryChanges,
    ) -> Result<NurseryRecord, LedgerError> {
        let mut tx = self.store.begin(Access::ReadWrite).await?;
        let outcome = apply_update(tx.as_mut(), id, &changes).await;
        let updated = finish(tx, outcome, "update").await?;

        info!("Updated nursery record {}", id);
        Ok(updated)
    }

    /// Remove a transaction, its monitoring entries, and its share of the aggregate
    pub async fn delete(&self, id: i32) -> Result<Deletion, LedgerError> {
        let mut tx = self.store.begin(Access::ReadWrite).await?;
        let outcome = apply_delete(tx.as_mut(), id).await;
        let deletion = finish(tx, outcome, "delete").await?;

        info!(
            "Deleted nursery record {} ({} monitoring entries removed)",
            id, deletion.removed_monitoring
        );
        Ok(deletion)
    }

    /// Nursery rows matching `filter`, each with its species history, read
    /// from a single snapshot
    pub async fn view(
        &self,
        filter: &NurseryFilter,
    ) -> Result<Vec<NurseryWithHistory>, LedgerError> {
        let mut tx = self.store.begin(Access::Snapshot).await?;
        let outcome = read_view(tx.as_mut(), filter).await;
        finish(tx, outcome, "view").await
    }

    pub async fn view_one(&self, id: i32) -> Result<NurseryWithHistory, LedgerError> {
        self.view(&NurseryFilter::by_id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::nursery_not_found(id))
    }
}

/// Commit on success, roll back on failure. The operation error wins over a
/// rollback failure.
async fn finish<T>(
    tx: Box<dyn LedgerTx>,
    outcome: Result<T, LedgerError>,
    operation: &str,
) -> Result<T, LedgerError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            match &err {
                LedgerError::Store(e) => {
                    error!("Nursery {} failed, rolling back: {}", operation, e)
                }
                other => warn!("Nursery {} rejected: {}", operation, other),
            }
            if let Err(rollback_err) = tx.rollback().await {
                error!("Rollback after failed {} also failed: {}", operation, rollback_err);
            }
            Err(err)
        }
    }
}

/// `quantity_nursery + delta`, provided it stays within `0..=max_quantity()`
fn next_aggregate(description: &TreeDescription, delta: Decimal) -> Result<Decimal, LedgerError> {
    let current = description.quantity_nursery;
    let tree_desc_id = description.tree_desc_id;

    match current.checked_add(delta) {
        Some(next) if next < Decimal::ZERO => Err(LedgerError::NegativeAggregate {
            tree_desc_id,
            current,
            delta,
        }),
        Some(next) if next <= max_quantity() => Ok(next),
        _ => Err(LedgerError::AggregateOverflow {
            tree_desc_id,
            current,
            delta,
        }),
    }
}

/// Lock the description and verify the aggregate can absorb `delta`
async fn guard_aggregate(
    tx: &mut dyn LedgerTx,
    tree_desc_id: i32,
    delta: Decimal,
) -> Result<(), LedgerError> {
    let description = tx
        .lock_description(tree_desc_id)
        .await?
        .ok_or_else(|| LedgerError::description_not_found(tree_desc_id))?;

    next_aggregate(&description, delta).map(|_| ())
}

async fn apply_register(
    tx: &mut dyn LedgerTx,
    record: &NewNurseryRecord,
) -> Result<Registration, LedgerError> {
    let Some(description) = tx.lock_description(record.tree_desc_id).await? else {
        return Err(LedgerError::invalid_field(
            "tree_desc_id",
            format!("Tree description {} does not exist", record.tree_desc_id),
        ));
    };
    next_aggregate(&description, record.quantity_added)?;

    let nursery = tx.insert_nursery(record).await?;
    let tree_description = tx
        .adjust_quantity_nursery(record.tree_desc_id, record.quantity_added)
        .await?;
    let monitoring = tx
        .insert_monitoring(&NewMonitoringEntry {
            tree_desc_id: record.tree_desc_id,
            nursery_id: Some(nursery.id),
            monitoring_date: record.registration_date,
            quantity: record.quantity_added,
            health_status: HEALTH_ACTIVE.to_string(),
            source: MonitoringSource::Nursery,
            monitored_by: record.registered_by,
            notes: record.notes.clone(),
        })
        .await?;

    Ok(Registration {
        nursery,
        tree_description,
        monitoring,
    })
}

async fn apply_update(
    tx: &mut dyn LedgerTx,
    id: i32,
    changes: &NurseryChanges,
) -> Result<NurseryRecord, LedgerError> {
    let existing = tx
        .lock_nursery(id)
        .await?
        .ok_or_else(|| LedgerError::nursery_not_found(id))?;

    if let Some(tree_desc_id) = changes.tree_desc_id {
        if tree_desc_id != existing.tree_desc_id {
            return Err(LedgerError::invalid_field(
                "tree_desc_id",
                "Cannot move a nursery record to another tree description; \
                 delete and register it again",
            ));
        }
    }

    // Delta from the locked, pre-update row
    let delta = changes
        .quantity_added
        .map(|new_quantity| new_quantity - existing.quantity_added)
        .filter(|delta| !delta.is_zero());

    if let Some(delta) = delta {
        guard_aggregate(tx, existing.tree_desc_id, delta).await?;
    }

    let updated = tx.update_nursery(id, &changes.assignments()).await?;

    if let Some(delta) = delta {
        tx.adjust_quantity_nursery(existing.tree_desc_id, delta).await?;
    }

    Ok(updated)
}

async fn apply_delete(tx: &mut dyn LedgerTx, id: i32) -> Result<Deletion, LedgerError> {
    let existing = tx
        .lock_nursery(id)
        .await?
        .ok_or_else(|| LedgerError::nursery_not_found(id))?;

    let delta = -existing.quantity_added;
    guard_aggregate(tx, existing.tree_desc_id, delta).await?;

    // Monitoring rows reference the nursery row, so they go first
    let removed_monitoring = tx
        .delete_monitoring_for_nursery(id, MonitoringSource::Nursery)
        .await?;
    let deleted_record = tx.delete_nursery(id).await?;
    tx.adjust_quantity_nursery(existing.tree_desc_id, delta).await?;

    Ok(Deletion {
        deleted_record,
        removed_monitoring,
    })
}

async fn read_view(
    tx: &mut dyn LedgerTx,
    filter: &NurseryFilter,
) -> Result<Vec<NurseryWithHistory>, LedgerError> {
    let details = tx.select_nursery(filter).await?;
    let ids = description_ids(&details);
    let entries = tx.select_monitoring(&ids, MonitoringSource::Nursery).await?;
    Ok(attach_history(details, entries))
}
