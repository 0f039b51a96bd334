use dbrev_core::{
    AttributeRecord, CatalogFilter, EntityRecord, FiltersConfig, ProcedureRecord,
    ReverseEngineeringConfig, SchemaFilter,
};

pub fn entity(
    name: impl Into<String>,
    catalog: Option<&str>,
    schema: Option<&str>,
    columns: &[&str],
) -> EntityRecord {
    EntityRecord::new(
        name,
        catalog.map(str::to_string),
        schema.map(str::to_string),
        columns
            .iter()
            .map(|column| AttributeRecord::new(*column, "integer"))
            .collect(),
    )
}

pub fn procedure(
    name: impl Into<String>,
    catalog: Option<&str>,
    schema: Option<&str>,
) -> ProcedureRecord {
    ProcedureRecord::new(name, catalog.map(str::to_string), schema.map(str::to_string))
}

/// Fully qualified filters: one catalog filter per entry, one schema filter
/// per listed schema.
pub fn qualified_filters(catalogs: &[(&str, &[&str])]) -> FiltersConfig {
    FiltersConfig::new(
        catalogs
            .iter()
            .map(|(catalog, schemas)| {
                CatalogFilter::named(
                    *catalog,
                    schemas.iter().map(|schema| SchemaFilter::named(*schema)).collect(),
                )
            })
            .collect(),
    )
}

/// Schema filters under one unnamed catalog filter.
pub fn schema_only_filters(schemas: &[Option<&str>]) -> FiltersConfig {
    FiltersConfig::new(vec![CatalogFilter::unqualified(
        schemas
            .iter()
            .map(|schema| match schema {
                Some(name) => SchemaFilter::named(*name),
                None => SchemaFilter::unqualified(),
            })
            .collect(),
    )])
}

pub fn config(filters: FiltersConfig) -> ReverseEngineeringConfig {
    ReverseEngineeringConfig::with_filters(filters)
}
