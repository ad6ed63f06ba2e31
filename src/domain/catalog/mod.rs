//! Catalog domain module.
//!
//! The plan catalog's content is external configuration; this module
//! defines the shape the rest of the system validates against.

mod plan;

pub use plan::{Plan, PlanPublic};
