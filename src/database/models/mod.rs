pub mod monitoring;
pub mod nursery;
pub mod tree_description;

pub use monitoring::{MonitoringEntry, MonitoringSource, NewMonitoringEntry, HEALTH_ACTIVE};
pub use nursery::{
    Assignment, FieldValue, NewNurseryRecord, NurseryChanges, NurseryColumn, NurseryDetail,
    NurseryRecord,
};
pub use tree_description::{max_quantity, TreeDescription, QUANTITY_SCALE};
