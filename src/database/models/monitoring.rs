use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Health status recorded for stock entering the nursery
pub const HEALTH_ACTIVE: &str = "active";

/// Origin of a monitoring entry, stored as a SMALLINT discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoringSource {
    Nursery,
    Field,
}

impl MonitoringSource {
    pub fn code(self) -> i16 {
        match self {
            MonitoringSource::Nursery => 1,
            MonitoringSource::Field => 2,
        }
    }
}

/// One row of the append-only `tree_monitoring` log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MonitoringEntry {
    pub id: i32,
    pub tree_desc_id: i32,
    pub nursery_id: Option<i32>,
    pub monitoring_date: NaiveDate,
    pub quantity: Decimal,
    pub health_status: String,
    pub source: i16,
    pub monitored_by: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMonitoringEntry {
    pub tree_desc_id: i32,
    pub nursery_id: Option<i32>,
    pub monitoring_date: NaiveDate,
    pub quantity: Decimal,
    pub health_status: String,
    pub source: MonitoringSource,
    pub monitored_by: i32,
    pub notes: Option<String>,
}
