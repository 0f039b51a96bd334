use crate::{
    DataMap, DbError, DbKind, EntityRecord, MetadataCapabilities, ProcedureMap,
    ReverseEngineeringConfig, TableFilter,
};

/// Source of raw metadata for a reverse-engineering run.
///
/// One loader wraps one live connection and is used for the whole run:
/// procedures first, then entities per filter pair. Failures are reported
/// as [`DbError::InspectionFailed`] (or `Timeout`/`Cancelled`) and are
/// propagated unchanged by the tree builder.
pub trait MetadataLoader: Send {
    /// Returns the dialect this loader talks to.
    fn kind(&self) -> DbKind;

    /// Catalog/schema/procedure support reported by the dialect.
    fn capabilities(&self) -> MetadataCapabilities {
        self.kind().default_capabilities()
    }

    /// Load tables (with their columns) for one filter pair.
    ///
    /// `None` for catalog or schema means "not restricted". Implementations
    /// may apply `tables` themselves; the builder re-applies it either way.
    fn load_entities(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        tables: &TableFilter,
        table_types: &[String],
    ) -> Result<Vec<EntityRecord>, DbError>;

    /// Load stored procedures keyed by name.
    ///
    /// The default implementation returns an empty map, which suits dialects
    /// without stored procedures.
    fn load_procedures(
        &self,
        _data_map: &DataMap,
        _config: &ReverseEngineeringConfig,
    ) -> Result<ProcedureMap, DbError> {
        Ok(ProcedureMap::new())
    }
}
