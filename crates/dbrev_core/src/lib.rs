mod capabilities;
mod config_store;
mod error;
mod filter;
mod loader;
mod model;
mod records;
mod report;
mod reverse_engineer;
mod tree_builder;

pub use capabilities::{DbKind, MetadataCapabilities, PlacementMode};
pub use config_store::ReverseEngineeringConfigStore;
pub use error::DbError;
pub use filter::{
    BuildStrategy, CatalogFilter, CompiledTableFilter, DEFAULT_TABLE_TYPES, FiltersConfig,
    ReverseEngineeringConfig, SchemaFilter, TableFilter,
};
pub use loader::MetadataLoader;
pub use model::{DbElement, DbModel, ElementKind};
pub use records::{AttributeRecord, DataMap, EntityRecord, ProcedureMap, ProcedureRecord};
pub use report::{Diagnostic, LoadReport};
pub use reverse_engineer::{ReverseEngineer, ReverseEngineeringSession};
pub use tree_builder::TreeBuilder;
