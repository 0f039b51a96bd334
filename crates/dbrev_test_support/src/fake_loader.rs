use dbrev_core::{
    DataMap, DbError, DbKind, EntityRecord, MetadataCapabilities, MetadataLoader, ProcedureMap,
    ProcedureRecord, ReverseEngineeringConfig, TableFilter,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

type PairKey = (Option<String>, Option<String>);

#[derive(Debug, Clone)]
pub enum FakeLoadOutcome {
    Entities(Vec<EntityRecord>),
    Error(String),
    Timeout,
    Cancelled,
}

impl FakeLoadOutcome {
    fn into_result(&self) -> Result<Vec<EntityRecord>, DbError> {
        match self {
            Self::Entities(entities) => Ok(entities.clone()),
            Self::Error(message) => Err(DbError::inspection_failed(message.clone())),
            Self::Timeout => Err(DbError::Timeout),
            Self::Cancelled => Err(DbError::Cancelled),
        }
    }
}

/// One `load_entities` call as the fake saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRequest {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub table_types: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeLoaderStats {
    pub entity_requests: Vec<EntityRequest>,
    pub procedure_calls: usize,
}

#[derive(Default)]
struct FakeLoaderState {
    outcomes: RwLock<HashMap<PairKey, FakeLoadOutcome>>,
    default_outcome: RwLock<Option<FakeLoadOutcome>>,
    procedures: RwLock<ProcedureMap>,
    procedure_error: RwLock<Option<String>>,
    entity_requests: Mutex<Vec<EntityRequest>>,
    procedure_calls: AtomicUsize,
}

/// Scriptable [`MetadataLoader`] keyed by the (catalog, schema) pair asked for.
///
/// Pairs without a scripted outcome fall back to the default outcome, or to
/// an empty result when none is set.
#[derive(Clone)]
pub struct FakeMetadataLoader {
    kind: DbKind,
    capabilities: MetadataCapabilities,
    state: Arc<FakeLoaderState>,
}

impl FakeMetadataLoader {
    pub fn new(kind: DbKind) -> Self {
        Self {
            kind,
            capabilities: kind.default_capabilities(),
            state: Arc::new(FakeLoaderState::default()),
        }
    }

    /// Loader reporting the given catalog/schema support, with stored
    /// procedures enabled.
    pub fn with_support(catalogs: bool, schemas: bool) -> Self {
        let mut capabilities = MetadataCapabilities::STORED_PROCEDURES;
        capabilities.set(MetadataCapabilities::CATALOGS, catalogs);
        capabilities.set(MetadataCapabilities::SCHEMAS, schemas);

        Self::new(DbKind::SqlServer).with_capabilities(capabilities)
    }

    pub fn with_capabilities(mut self, capabilities: MetadataCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_entities(
        self,
        catalog: Option<&str>,
        schema: Option<&str>,
        entities: Vec<EntityRecord>,
    ) -> Self {
        self.set_outcome(catalog, schema, FakeLoadOutcome::Entities(entities));
        self
    }

    pub fn with_entities_error(
        self,
        catalog: Option<&str>,
        schema: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        self.set_outcome(catalog, schema, FakeLoadOutcome::Error(message.into()));
        self
    }

    pub fn with_default_entities(self, entities: Vec<EntityRecord>) -> Self {
        *rwlock_write(&self.state.default_outcome) = Some(FakeLoadOutcome::Entities(entities));
        self
    }

    pub fn with_procedures(self, procedures: Vec<ProcedureRecord>) -> Self {
        rwlock_write(&self.state.procedures).extend(
            procedures
                .into_iter()
                .map(|procedure| (procedure.name.clone(), procedure)),
        );
        self
    }

    pub fn with_procedure_error(self, message: impl Into<String>) -> Self {
        *rwlock_write(&self.state.procedure_error) = Some(message.into());
        self
    }

    pub fn set_outcome(&self, catalog: Option<&str>, schema: Option<&str>, outcome: FakeLoadOutcome) {
        rwlock_write(&self.state.outcomes).insert(pair_key(catalog, schema), outcome);
    }

    pub fn stats(&self) -> FakeLoaderStats {
        FakeLoaderStats {
            entity_requests: mutex_lock(&self.state.entity_requests).clone(),
            procedure_calls: self.state.procedure_calls.load(Ordering::Relaxed),
        }
    }
}

impl MetadataLoader for FakeMetadataLoader {
    fn kind(&self) -> DbKind {
        self.kind
    }

    fn capabilities(&self) -> MetadataCapabilities {
        self.capabilities
    }

    fn load_entities(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        _tables: &TableFilter,
        table_types: &[String],
    ) -> Result<Vec<EntityRecord>, DbError> {
        mutex_lock(&self.state.entity_requests).push(EntityRequest {
            catalog: catalog.map(str::to_string),
            schema: schema.map(str::to_string),
            table_types: table_types.to_vec(),
        });

        if let Some(outcome) = rwlock_read(&self.state.outcomes).get(&pair_key(catalog, schema)) {
            return outcome.into_result();
        }

        match rwlock_read(&self.state.default_outcome).as_ref() {
            Some(outcome) => outcome.into_result(),
            None => Ok(Vec::new()),
        }
    }

    fn load_procedures(
        &self,
        _data_map: &DataMap,
        _config: &ReverseEngineeringConfig,
    ) -> Result<ProcedureMap, DbError> {
        self.state.procedure_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(message) = rwlock_read(&self.state.procedure_error).as_ref() {
            return Err(DbError::inspection_failed(message.clone()));
        }

        Ok(rwlock_read(&self.state.procedures).clone())
    }
}

fn pair_key(catalog: Option<&str>, schema: Option<&str>) -> PairKey {
    (catalog.map(str::to_string), schema.map(str::to_string))
}

fn rwlock_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn rwlock_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn mutex_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}
