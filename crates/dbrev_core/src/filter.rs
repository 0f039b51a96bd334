use crate::DbError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Table types requested when the configuration does not name any.
pub const DEFAULT_TABLE_TYPES: &[&str] = &["TABLE", "VIEW"];

/// Include/exclude patterns applied to table or procedure names.
///
/// Patterns are regular expressions matched against the whole name. An empty
/// include list accepts every name that no exclude pattern rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFilter {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

impl TableFilter {
    pub fn include_all() -> Self {
        Self::default()
    }

    pub fn including<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: patterns.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn excluding<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn is_include_all(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn compile(&self) -> Result<CompiledTableFilter, DbError> {
        Ok(CompiledTableFilter {
            include: compile_patterns(&self.include)?,
            exclude: compile_patterns(&self.exclude)?,
        })
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, DbError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                DbError::InvalidConfig(format!("invalid table pattern '{}': {}", pattern, e))
            })
        })
        .collect()
}

/// A [`TableFilter`] with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledTableFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl CompiledTableFilter {
    pub fn matches(&self, name: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|re| re.is_match(name));

        included && !self.exclude.iter().any(|re| re.is_match(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFilter {
    /// `None` leaves the schema unqualified.
    pub name: Option<String>,

    #[serde(default)]
    pub tables: TableFilter,
}

impl SchemaFilter {
    pub fn new(name: Option<String>, tables: TableFilter) -> Self {
        Self { name, tables }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()), TableFilter::include_all())
    }

    pub fn unqualified() -> Self {
        Self::new(None, TableFilter::include_all())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// `None` leaves the catalog unqualified.
    pub name: Option<String>,

    #[serde(default)]
    pub schemas: Vec<SchemaFilter>,
}

impl CatalogFilter {
    pub fn new(name: Option<String>, schemas: Vec<SchemaFilter>) -> Self {
        Self { name, schemas }
    }

    pub fn named(name: impl Into<String>, schemas: Vec<SchemaFilter>) -> Self {
        Self::new(Some(name.into()), schemas)
    }

    pub fn unqualified(schemas: Vec<SchemaFilter>) -> Self {
        Self::new(None, schemas)
    }
}

/// User selection of catalogs, schemas and tables to reverse-engineer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub catalogs: Vec<CatalogFilter>,
}

impl FiltersConfig {
    pub fn new(catalogs: Vec<CatalogFilter>) -> Self {
        Self { catalogs }
    }

    /// One unqualified catalog/schema pair that accepts every table.
    pub fn everything() -> Self {
        Self::new(vec![CatalogFilter::unqualified(vec![
            SchemaFilter::unqualified(),
        ])])
    }

    /// Every (catalog, schema) pair in configuration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&CatalogFilter, &SchemaFilter)> {
        self.catalogs
            .iter()
            .flat_map(|catalog| catalog.schemas.iter().map(move |schema| (catalog, schema)))
    }

    /// True when some pair names neither a catalog nor a schema.
    pub fn has_unqualified_pair(&self) -> bool {
        self.pairs()
            .any(|(catalog, schema)| catalog.name.is_none() && schema.name.is_none())
    }

    pub fn validate(&self) -> Result<(), DbError> {
        for (_, schema) in self.pairs() {
            schema.tables.compile()?;
        }
        Ok(())
    }
}

/// How loaded entities are folded into the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildStrategy {
    /// Every pair is qualified: the first entity of each result decides
    /// where the whole result goes.
    Strict,

    /// Some pair is unqualified: each entity is placed by its own
    /// catalog/schema names.
    NullTolerant,
}

impl BuildStrategy {
    pub fn select(filters: &FiltersConfig) -> Self {
        if filters.has_unqualified_pair() {
            BuildStrategy::NullTolerant
        } else {
            BuildStrategy::Strict
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BuildStrategy::Strict => "strict",
            BuildStrategy::NullTolerant => "null-tolerant",
        }
    }
}

/// Everything a reverse-engineering run needs besides the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseEngineeringConfig {
    #[serde(default = "FiltersConfig::everything")]
    pub filters: FiltersConfig,

    /// Table types passed to the loader (e.g., "TABLE", "VIEW").
    #[serde(default = "default_table_types")]
    pub table_types: Vec<String>,

    #[serde(default)]
    pub procedure_filter: TableFilter,

    #[serde(default)]
    pub skip_procedures: bool,
}

impl Default for ReverseEngineeringConfig {
    fn default() -> Self {
        Self {
            filters: FiltersConfig::everything(),
            table_types: default_table_types(),
            procedure_filter: TableFilter::include_all(),
            skip_procedures: false,
        }
    }
}

impl ReverseEngineeringConfig {
    pub fn with_filters(filters: FiltersConfig) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    /// Table types to request, falling back to the defaults when none are set.
    pub fn table_types(&self) -> Vec<String> {
        if self.table_types.is_empty() {
            default_table_types()
        } else {
            self.table_types.clone()
        }
    }

    pub fn validate(&self) -> Result<(), DbError> {
        self.filters.validate()?;
        self.procedure_filter.compile()?;
        Ok(())
    }
}

fn default_table_types() -> Vec<String> {
    DEFAULT_TABLE_TYPES.iter().map(|t| t.to_string()).collect()
}
