use crate::tree_builder::TreeBuilder;
use crate::{
    DataMap, DbError, DbModel, LoadReport, MetadataLoader, ProcedureMap, ReverseEngineeringConfig,
};

/// Runs one reverse-engineering pass over a single loader.
///
/// Procedures are loaded first, then tables (building catalog/schema nodes),
/// then procedures are merged into the nodes tables created. The first
/// error aborts the pass.
pub struct ReverseEngineer<'l> {
    loader: &'l dyn MetadataLoader,
}

impl<'l> ReverseEngineer<'l> {
    pub fn new(loader: &'l dyn MetadataLoader) -> Self {
        Self { loader }
    }

    /// Populates `model` and `data_map` from the loader.
    ///
    /// On error, nodes already added to `model` stay there. Callers that
    /// must not expose a partial tree should build into a fresh model, as
    /// [`ReverseEngineeringSession::run`] does.
    pub fn load(
        &self,
        model: &mut DbModel,
        data_map: &mut DataMap,
        config: &ReverseEngineeringConfig,
    ) -> Result<LoadReport, DbError> {
        config.validate()?;

        let capabilities = self.loader.capabilities();

        log::info!(
            "[REVERSE] Reverse engineering {} into '{}'",
            self.loader.kind().display_name(),
            model.name()
        );

        let procedures = self.load_procedures(data_map, config)?;

        let mut builder = TreeBuilder::new(model, data_map, capabilities.placement());
        builder.load_db_entities(self.loader, config)?;
        builder.merge_procedures(&procedures)?;

        let report = builder.into_report();
        log::info!("[REVERSE] Finished: {}", report);

        Ok(report)
    }

    fn load_procedures(
        &self,
        data_map: &mut DataMap,
        config: &ReverseEngineeringConfig,
    ) -> Result<ProcedureMap, DbError> {
        if config.skip_procedures {
            log::debug!("[REVERSE] Procedure loading disabled by configuration");
            return Ok(ProcedureMap::new());
        }

        if !self.loader.capabilities().supports_procedures() {
            log::debug!(
                "[REVERSE] {} does not report stored procedures",
                self.loader.kind().display_name()
            );
            return Ok(ProcedureMap::new());
        }

        log::info!("[REVERSE] Loading procedures...");

        let matcher = config.procedure_filter.compile()?;
        let mut procedures = self.loader.load_procedures(data_map, config)?;
        procedures.retain(|name, _| matcher.matches(name));

        data_map.add_procedures(&procedures);
        Ok(procedures)
    }
}

/// Owner of the tree shown for one data source.
///
/// Each run builds a fresh model and only replaces the current one when the
/// run succeeds, so a failed run never leaves a partial tree behind.
#[derive(Debug, Clone)]
pub struct ReverseEngineeringSession {
    data_source_key: String,
    model: DbModel,
    last_report: Option<LoadReport>,
}

impl ReverseEngineeringSession {
    pub fn new(data_source_key: impl Into<String>) -> Self {
        let data_source_key = data_source_key.into();
        Self {
            model: DbModel::new(data_source_key.clone()),
            data_source_key,
            last_report: None,
        }
    }

    pub fn data_source_key(&self) -> &str {
        &self.data_source_key
    }

    pub fn model(&self) -> &DbModel {
        &self.model
    }

    pub fn into_model(self) -> DbModel {
        self.model
    }

    pub fn last_report(&self) -> Option<&LoadReport> {
        self.last_report.as_ref()
    }

    pub fn run(
        &mut self,
        loader: &dyn MetadataLoader,
        data_map: &mut DataMap,
        config: &ReverseEngineeringConfig,
    ) -> Result<LoadReport, DbError> {
        let mut model = DbModel::new(self.data_source_key.clone());

        let report = match ReverseEngineer::new(loader).load(&mut model, data_map, config) {
            Ok(report) => report,
            Err(e) => {
                log::warn!(
                    "[REVERSE] Run for '{}' failed, keeping previous tree: {}",
                    self.data_source_key,
                    e
                );
                return Err(e);
            }
        };

        self.model = model;
        self.last_report = Some(report.clone());

        Ok(report)
    }
}
