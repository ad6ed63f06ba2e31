//! Plan catalog adapters.

mod yaml_catalog;

pub use yaml_catalog::YamlPlanCatalog;
