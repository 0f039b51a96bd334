use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Table or view found by introspection.
///
/// Read-only input to the tree builder; the model never holds on to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,

    /// Owning catalog, or `None` when the dialect has no catalogs.
    pub catalog: Option<String>,

    /// Owning schema, or `None` when the dialect has no schemas.
    pub schema: Option<String>,

    /// Columns in ordinal order.
    pub attributes: Vec<AttributeRecord>,
}

impl EntityRecord {
    pub fn new(
        name: impl Into<String>,
        catalog: Option<String>,
        schema: Option<String>,
        attributes: Vec<AttributeRecord>,
    ) -> Self {
        Self {
            name: name.into(),
            catalog,
            schema,
            attributes,
        }
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|attr| attr.name.as_str())
    }
}

/// Column metadata within an entity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub name: String,

    /// Database-specific type (e.g., "integer", "varchar(255)").
    pub type_name: String,

    pub nullable: bool,
    pub is_primary_key: bool,
}

impl AttributeRecord {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            is_primary_key: false,
        }
    }
}

/// Stored procedure found by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRecord {
    pub name: String,
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

impl ProcedureRecord {
    pub fn new(name: impl Into<String>, catalog: Option<String>, schema: Option<String>) -> Self {
        Self {
            name: name.into(),
            catalog,
            schema,
        }
    }
}

/// Procedures keyed by name. Iteration order carries no meaning.
pub type ProcedureMap = BTreeMap<String, ProcedureRecord>;

/// Project-side map that receives every record loaded during a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataMap {
    pub name: String,

    #[serde(default)]
    pub entities: Vec<EntityRecord>,

    #[serde(default)]
    pub procedures: ProcedureMap,
}

impl DataMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds entities, replacing any previous record with the same qualified name.
    pub fn add_entities(&mut self, entities: &[EntityRecord]) {
        for entity in entities {
            match self.entities.iter_mut().find(|existing| {
                existing.name == entity.name
                    && existing.catalog == entity.catalog
                    && existing.schema == entity.schema
            }) {
                Some(existing) => *existing = entity.clone(),
                None => self.entities.push(entity.clone()),
            }
        }
    }

    pub fn add_procedures(&mut self, procedures: &ProcedureMap) {
        self.procedures.extend(
            procedures
                .iter()
                .map(|(name, record)| (name.clone(), record.clone())),
        );
    }
}
