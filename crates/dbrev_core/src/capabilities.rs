use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Namespacing features a database dialect reports through its metadata.
    ///
    /// Read once at the start of a reverse-engineering run. Every placement
    /// decision of the tree builder is gated by these flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MetadataCapabilities: u8 {
        /// Tables can be qualified by a catalog name.
        const CATALOGS = 1 << 0;

        /// Tables can be qualified by a schema name.
        const SCHEMAS = 1 << 1;

        /// The dialect exposes stored procedures through its metadata.
        const STORED_PROCEDURES = 1 << 2;
    }
}

impl MetadataCapabilities {
    pub fn supports_catalogs(&self) -> bool {
        self.contains(MetadataCapabilities::CATALOGS)
    }

    pub fn supports_schemas(&self) -> bool {
        self.contains(MetadataCapabilities::SCHEMAS)
    }

    pub fn supports_procedures(&self) -> bool {
        self.contains(MetadataCapabilities::STORED_PROCEDURES)
    }

    pub fn placement(&self) -> PlacementMode {
        PlacementMode::from_flags(self.supports_catalogs(), self.supports_schemas())
    }
}

/// Where entities and procedures hang in the tree, derived from the
/// catalog/schema capability pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementMode {
    /// catalog → schema → entity/procedure
    CatalogAndSchema,

    /// catalog → entity/procedure
    CatalogOnly,

    /// schema → entity/procedure
    SchemaOnly,

    /// Entities attach to the root. Procedures have no valid parent.
    Flat,
}

impl PlacementMode {
    pub fn from_flags(catalogs: bool, schemas: bool) -> Self {
        match (catalogs, schemas) {
            (true, true) => PlacementMode::CatalogAndSchema,
            (true, false) => PlacementMode::CatalogOnly,
            (false, true) => PlacementMode::SchemaOnly,
            (false, false) => PlacementMode::Flat,
        }
    }

    pub fn uses_catalogs(&self) -> bool {
        matches!(
            self,
            PlacementMode::CatalogAndSchema | PlacementMode::CatalogOnly
        )
    }

    pub fn uses_schemas(&self) -> bool {
        matches!(
            self,
            PlacementMode::CatalogAndSchema | PlacementMode::SchemaOnly
        )
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlacementMode::CatalogAndSchema => "catalog/schema",
            PlacementMode::CatalogOnly => "catalog",
            PlacementMode::SchemaOnly => "schema",
            PlacementMode::Flat => "flat",
        }
    }
}

/// Database dialects with known metadata behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbKind {
    Postgres,
    MySQL,
    MariaDB,
    SQLite,
    SqlServer,
    Oracle,
}

impl DbKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            DbKind::Postgres => "PostgreSQL",
            DbKind::MySQL => "MySQL",
            DbKind::MariaDB => "MariaDB",
            DbKind::SQLite => "SQLite",
            DbKind::SqlServer => "SQL Server",
            DbKind::Oracle => "Oracle",
        }
    }

    /// Capabilities the dialect's metadata reports out of the box.
    ///
    /// MySQL exposes databases as catalogs and has no schemas. SQLite has
    /// neither in the SQL standard sense, but attached databases behave like
    /// schemas (`main`, `aux`, ...), which is how loaders report them.
    pub fn default_capabilities(&self) -> MetadataCapabilities {
        match self {
            DbKind::Postgres | DbKind::Oracle => {
                MetadataCapabilities::SCHEMAS | MetadataCapabilities::STORED_PROCEDURES
            }
            DbKind::MySQL | DbKind::MariaDB => {
                MetadataCapabilities::CATALOGS | MetadataCapabilities::STORED_PROCEDURES
            }
            DbKind::SqlServer => MetadataCapabilities::all(),
            DbKind::SQLite => MetadataCapabilities::SCHEMAS,
        }
    }
}
