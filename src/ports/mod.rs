//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Collaborator Ports (external systems)
//!
//! - `PlanCatalog` - Immutable plan lookup (content is configuration)
//! - `SessionResolver` - Maps an inbound credential to a user
//!
//! ## Owned-State Ports
//!
//! - `PaymentStore` - Payment attempt lifecycle
//! - `SubscriptionLedger` - Idempotent grants and lazy-expiry reads
//! - `AuditLog` - Append-only security event record
//! - `ResourceStore` - Locator-addressed resource bytes

mod audit_log;
mod payment_store;
mod plan_catalog;
mod resource_store;
mod session_resolver;
mod subscription_ledger;

pub use audit_log::{AuditAction, AuditEntry, AuditLog};
pub use payment_store::{PaymentStore, StatusUpdate};
pub use plan_catalog::PlanCatalog;
pub use resource_store::ResourceStore;
pub use session_resolver::SessionResolver;
pub use subscription_ledger::{CancelOutcome, GrantOutcome, SubscriptionLedger};
