use async_trait::async_trait;
use rust_decimal::Decimal;

use super::LedgerError;
use crate::database::models::{
    Assignment, MonitoringEntry, MonitoringSource, NewMonitoringEntry, NewNurseryRecord,
    NurseryDetail, NurseryRecord, TreeDescription,
};
use crate::filter::NurseryFilter;

/// Isolation requested when opening a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read-committed writes guarded by row locks
    ReadWrite,
    /// Read-only, every statement sees the same snapshot
    Snapshot,
}

/// Relational store backing the ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self, access: Access) -> Result<Box<dyn LedgerTx>, LedgerError>;

    /// Cheap connectivity check used by the health endpoint
    async fn ping(&self) -> Result<(), LedgerError>;
}

/// An open store transaction. Dropping it without `commit` discards its writes.
#[async_trait]
pub trait LedgerTx: Send {
    /// Read a description and hold its row lock until the transaction ends
    async fn lock_description(
        &mut self,
        tree_desc_id: i32,
    ) -> Result<Option<TreeDescription>, LedgerError>;

    /// `quantity_nursery += delta`, returning the updated row
    async fn adjust_quantity_nursery(
        &mut self,
        tree_desc_id: i32,
        delta: Decimal,
    ) -> Result<TreeDescription, LedgerError>;

    async fn insert_nursery(
        &mut self,
        record: &NewNurseryRecord,
    ) -> Result<NurseryRecord, LedgerError>;

    /// Read a nursery row and hold its row lock until the transaction ends
    async fn lock_nursery(&mut self, id: i32) -> Result<Option<NurseryRecord>, LedgerError>;

    async fn update_nursery(
        &mut self,
        id: i32,
        assignments: &[Assignment],
    ) -> Result<NurseryRecord, LedgerError>;

    async fn delete_nursery(&mut self, id: i32) -> Result<NurseryRecord, LedgerError>;

    async fn insert_monitoring(
        &mut self,
        entry: &NewMonitoringEntry,
    ) -> Result<MonitoringEntry, LedgerError>;

    /// Remove the monitoring entries a nursery transaction produced
    async fn delete_monitoring_for_nursery(
        &mut self,
        nursery_id: i32,
        source: MonitoringSource,
    ) -> Result<u64, LedgerError>;

    /// Nursery rows joined with their description, newest registration first
    async fn select_nursery(
        &mut self,
        filter: &NurseryFilter,
    ) -> Result<Vec<NurseryDetail>, LedgerError>;

    async fn select_monitoring(
        &mut self,
        tree_desc_ids: &[i32],
        source: MonitoringSource,
    ) -> Result<Vec<MonitoringEntry>, LedgerError>;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError>;
}
