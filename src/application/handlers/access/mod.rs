//! Access use cases.

mod fetch_resource;

pub use fetch_resource::{FetchResourceCommand, FetchResourceHandler};
