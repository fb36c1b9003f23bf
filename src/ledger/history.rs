use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::database::models::{MonitoringEntry, NurseryDetail};

/// One point of a species' nursery monitoring history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringSnapshot {
    pub health_status: String,
    pub monitoring_date: NaiveDate,
    pub quantity: Decimal,
    pub notes: Option<String>,
}

impl From<&MonitoringEntry> for MonitoringSnapshot {
    fn from(entry: &MonitoringEntry) -> Self {
        Self {
            health_status: entry.health_status.clone(),
            monitoring_date: entry.monitoring_date,
            quantity: entry.quantity,
            notes: entry.notes.clone(),
        }
    }
}

/// A nursery transaction with the nursery-source history of its species
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NurseryWithHistory {
    #[serde(flatten)]
    pub detail: NurseryDetail,
    pub monitoring_history: Vec<MonitoringSnapshot>,
}

/// Attach to every nursery row the monitoring entries of its description,
/// newest first. Row order is preserved.
pub fn attach_history(
    details: Vec<NurseryDetail>,
    mut entries: Vec<MonitoringEntry>,
) -> Vec<NurseryWithHistory> {
    entries.sort_by(|a, b| {
        b.monitoring_date
            .cmp(&a.monitoring_date)
            .then(b.id.cmp(&a.id))
    });

    let mut by_description: HashMap<i32, Vec<MonitoringSnapshot>> = HashMap::new();
    for entry in &entries {
        by_description
            .entry(entry.tree_desc_id)
            .or_default()
            .push(MonitoringSnapshot::from(entry));
    }

    details
        .into_iter()
        .map(|detail| {
            let monitoring_history = by_description
                .get(&detail.record.tree_desc_id)
                .cloned()
                .unwrap_or_default();
            NurseryWithHistory {
                detail,
                monitoring_history,
            }
        })
        .collect()
}

/// Distinct description ids in first-seen order
pub fn description_ids(details: &[NurseryDetail]) -> Vec<i32> {
    let mut ids: Vec<i32> = Vec::new();
    for detail in details {
        if !ids.contains(&detail.record.tree_desc_id) {
            ids.push(detail.record.tree_desc_id);
        }
    }
    ids
}
