//! Nursery stock ledger: transactional registration, update and deletion of
//! nursery transactions, and the read side that rebuilds monitoring history.

pub mod error;
pub mod history;
pub mod postgres;
pub mod requests;
pub mod service;
pub mod store;

pub use error::LedgerError;
pub use history::{MonitoringSnapshot, NurseryWithHistory};
pub use postgres::PgLedgerStore;
pub use requests::{RegisterRequest, UpdateRequest};
pub use service::{Deletion, NurseryLedger, Registration};
pub use store::{Access, LedgerStore, LedgerTx};
