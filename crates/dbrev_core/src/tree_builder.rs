use crate::filter::{BuildStrategy, CatalogFilter, SchemaFilter};
use crate::model::{DbModel, ElementKind};
use crate::report::{Diagnostic, LoadReport};
use crate::{
    DataMap, DbError, EntityRecord, MetadataLoader, PlacementMode, ProcedureMap,
    ReverseEngineeringConfig,
};
use uuid::Uuid;

/// Catalog node created for the catalog filter currently being folded.
///
/// Threaded through the schema filters of one catalog filter and dropped
/// when the next catalog filter starts.
#[derive(Debug, Clone, Copy, Default)]
struct CatalogScope {
    catalog: Option<Uuid>,
}

/// Folds loader output into a [`DbModel`].
///
/// Catalog and schema nodes are always find-or-created, so several filter
/// pairs (or a later procedure merge) that resolve to the same names share
/// one node.
pub struct TreeBuilder<'a> {
    model: &'a mut DbModel,
    data_map: &'a mut DataMap,
    placement: PlacementMode,
    report: LoadReport,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(model: &'a mut DbModel, data_map: &'a mut DataMap, placement: PlacementMode) -> Self {
        Self {
            model,
            data_map,
            placement,
            report: LoadReport::new(placement),
        }
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn into_report(self) -> LoadReport {
        self.report
    }

    /// Loads every filter pair and builds the entity tree with the strategy
    /// the filter configuration calls for.
    pub fn load_db_entities(
        &mut self,
        loader: &dyn MetadataLoader,
        config: &ReverseEngineeringConfig,
    ) -> Result<BuildStrategy, DbError> {
        let strategy = BuildStrategy::select(&config.filters);
        self.report.strategy = Some(strategy);

        log::info!(
            "[REVERSE] Building entity tree ({} strategy, {} placement)",
            strategy.display_name(),
            self.placement.display_name()
        );

        match strategy {
            BuildStrategy::Strict => self.build_strict(loader, config)?,
            BuildStrategy::NullTolerant => self.build_null_tolerant(loader, config)?,
        }

        Ok(strategy)
    }

    /// Builds the tree from fully qualified filter pairs.
    ///
    /// The first entity of each pair's result decides the catalog and schema
    /// nodes for the whole result. A catalog node is created at most once
    /// per catalog filter.
    pub fn build_strict(
        &mut self,
        loader: &dyn MetadataLoader,
        config: &ReverseEngineeringConfig,
    ) -> Result<(), DbError> {
        let table_types = config.table_types();

        for catalog_filter in &config.filters.catalogs {
            let mut scope = CatalogScope::default();

            for schema_filter in &catalog_filter.schemas {
                scope = self.fold_qualified_pair(
                    loader,
                    catalog_filter,
                    schema_filter,
                    &table_types,
                    scope,
                )?;
            }
        }

        Ok(())
    }

    fn fold_qualified_pair(
        &mut self,
        loader: &dyn MetadataLoader,
        catalog_filter: &CatalogFilter,
        schema_filter: &SchemaFilter,
        table_types: &[String],
        scope: CatalogScope,
    ) -> Result<CatalogScope, DbError> {
        let entities = self.load_entities(loader, catalog_filter, schema_filter, table_types)?;

        let Some(representative) = entities.first() else {
            self.report.push(Diagnostic::EmptyResult {
                catalog: catalog_filter.name.clone(),
                schema: schema_filter.name.clone(),
            });
            return Ok(scope);
        };

        let scope = match (scope.catalog, representative.catalog.as_deref()) {
            (None, Some(catalog)) => CatalogScope {
                catalog: Some(self.namespace(None, ElementKind::Catalog, Some(catalog))?),
            },
            _ => scope,
        };

        let schema = match representative.schema.as_deref() {
            Some(schema) => Some(self.namespace(scope.catalog, ElementKind::Schema, Some(schema))?),
            None => None,
        };

        let parent = schema.or(scope.catalog);
        for entity in &entities {
            self.add_entity(parent, entity)?;
        }

        Ok(scope)
    }

    /// Builds the tree when some filter pair is unqualified.
    ///
    /// Every entity is placed by its own catalog/schema names.
    pub fn build_null_tolerant(
        &mut self,
        loader: &dyn MetadataLoader,
        config: &ReverseEngineeringConfig,
    ) -> Result<(), DbError> {
        let table_types = config.table_types();

        for (catalog_filter, schema_filter) in config.filters.pairs() {
            let entities =
                self.load_entities(loader, catalog_filter, schema_filter, &table_types)?;

            for entity in &entities {
                let parent =
                    self.place(entity.catalog.as_deref(), entity.schema.as_deref())?;
                self.add_entity(parent, entity)?;
            }
        }

        Ok(())
    }

    /// Attaches procedures under the catalog/schema nodes they name,
    /// reusing nodes created while loading tables.
    ///
    /// Procedures cannot hang off the root, so with neither catalogs nor
    /// schemas supported they are dropped and reported.
    pub fn merge_procedures(&mut self, procedures: &ProcedureMap) -> Result<(), DbError> {
        for procedure in procedures.values() {
            if self.placement == PlacementMode::Flat {
                self.report.push(Diagnostic::UnplaceableProcedure {
                    name: procedure.name.clone(),
                });
                continue;
            }

            let parent = self.place(procedure.catalog.as_deref(), procedure.schema.as_deref())?;
            let (_, created) =
                self.model
                    .find_or_create(parent, ElementKind::Procedure, Some(procedure.name.as_str()))?;

            if created {
                self.report.procedures += 1;
            }
        }

        Ok(())
    }

    fn load_entities(
        &mut self,
        loader: &dyn MetadataLoader,
        catalog_filter: &CatalogFilter,
        schema_filter: &SchemaFilter,
        table_types: &[String],
    ) -> Result<Vec<EntityRecord>, DbError> {
        let catalog = catalog_filter.name.as_deref();
        let schema = schema_filter.name.as_deref();

        log::debug!(
            "[REVERSE] Loading entities for catalog {:?}, schema {:?}",
            catalog,
            schema
        );

        let matcher = schema_filter.tables.compile()?;
        let mut entities =
            loader.load_entities(catalog, schema, &schema_filter.tables, table_types)?;

        entities.retain(|entity| {
            let keep = matcher.matches(&entity.name);
            if !keep {
                log::debug!("[REVERSE] Skipping {} (excluded by table filter)", entity.name);
            }
            keep
        });

        self.data_map.add_entities(&entities);
        Ok(entities)
    }

    /// Finds or creates the namespace node an element with these names
    /// belongs under. `None` is the root.
    fn place(
        &mut self,
        catalog: Option<&str>,
        schema: Option<&str>,
    ) -> Result<Option<Uuid>, DbError> {
        let parent = match self.placement {
            PlacementMode::CatalogAndSchema => {
                let catalog = self.namespace(None, ElementKind::Catalog, catalog)?;
                Some(self.namespace(Some(catalog), ElementKind::Schema, schema)?)
            }
            PlacementMode::CatalogOnly => {
                Some(self.namespace(None, ElementKind::Catalog, catalog)?)
            }
            PlacementMode::SchemaOnly => Some(self.namespace(None, ElementKind::Schema, schema)?),
            PlacementMode::Flat => None,
        };

        Ok(parent)
    }

    fn namespace(
        &mut self,
        parent: Option<Uuid>,
        kind: ElementKind,
        name: Option<&str>,
    ) -> Result<Uuid, DbError> {
        let (id, created) = self.model.find_or_create(parent, kind, name)?;
        if created {
            self.report.namespaces += 1;
        }
        Ok(id)
    }

    /// Adds an entity and its columns in attribute order. An entity that is
    /// already present only gains the columns it lacks.
    fn add_entity(&mut self, parent: Option<Uuid>, record: &EntityRecord) -> Result<(), DbError> {
        let (entity, created) =
            self.model
                .find_or_create(parent, ElementKind::Entity, Some(record.name.as_str()))?;
        if created {
            self.report.entities += 1;
        }

        for column in record.attribute_names() {
            let (_, created) =
                self.model
                    .find_or_create(Some(entity), ElementKind::Column, Some(column))?;
            if created {
                self.report.columns += 1;
            }
        }

        Ok(())
    }
}
