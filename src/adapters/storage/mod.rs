//! Storage adapters.
//!
//! - `memory` - single-process ledger and audit log for tests and
//!   databaseless deployments
//! - `postgres` - transactional ledger and audit log for multi-instance
//!   deployments
//! - `local_resources` - filesystem-backed resource store

mod local_resources;
mod memory;
mod postgres;

pub use local_resources::LocalResourceStore;
pub use memory::{InMemoryAuditLog, InMemoryLedger};
pub use postgres::{PostgresAuditLog, PostgresLedger};
