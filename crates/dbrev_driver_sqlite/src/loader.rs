use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dbrev_core::{
    AttributeRecord, DbError, DbKind, EntityRecord, MetadataCapabilities, MetadataLoader,
    TableFilter,
};
use rusqlite::{Connection as RusqliteConnection, OpenFlags};

/// Reads tables, views and columns out of a SQLite database file.
///
/// Every attached database (`main` plus anything added with `ATTACH`) is
/// reported as a schema. SQLite has no catalogs and no stored procedures.
pub struct SqliteMetadataLoader {
    conn: Mutex<RusqliteConnection>,
    path: Option<PathBuf>,
}

impl SqliteMetadataLoader {
    /// Opens `path` read-only. The file must already exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();

        let conn = RusqliteConnection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            DbError::inspection_failed(format!("cannot open {}: {}", path.display(), e))
        })?;

        log::info!("[SCHEMA] Opened SQLite database {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Wraps an existing connection, including any databases already
    /// attached to it.
    pub fn from_connection(conn: RusqliteConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn get_schemas(&self, conn: &RusqliteConnection) -> Result<Vec<String>, DbError> {
        let mut stmt = conn
            .prepare("PRAGMA database_list")
            .map_err(|e| format_sqlite_error(&e))?;

        // PRAGMA database_list returns: seq, name, file
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| format_sqlite_error(&e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format_sqlite_error(&e))?;

        Ok(names.into_iter().filter(|name| name != "temp").collect())
    }

    fn get_tables(
        &self,
        conn: &RusqliteConnection,
        schema: &str,
        object_types: &[&'static str],
    ) -> Result<Vec<String>, DbError> {
        if object_types.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; object_types.len()].join(", ");
        let sql = format!(
            "SELECT name FROM {}.sqlite_master WHERE type IN ({}) AND name NOT LIKE 'sqlite_%' ORDER BY name",
            sqlite_quote_ident(schema),
            placeholders
        );

        let mut stmt = conn.prepare(&sql).map_err(|e| format_sqlite_error(&e))?;

        let names = stmt
            .query_map(rusqlite::params_from_iter(object_types.iter()), |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| format_sqlite_error(&e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format_sqlite_error(&e))?;

        Ok(names)
    }

    fn get_columns(
        &self,
        conn: &RusqliteConnection,
        schema: &str,
        table: &str,
    ) -> Result<Vec<AttributeRecord>, DbError> {
        let sql = format!(
            "PRAGMA {}.table_info({})",
            sqlite_quote_ident(schema),
            sqlite_quote_ident(table)
        );

        let mut stmt = conn.prepare(&sql).map_err(|e| format_sqlite_error(&e))?;

        // PRAGMA table_info returns: cid, name, type, notnull, dflt_value, pk
        let columns = stmt
            .query_map([], |row| {
                Ok(AttributeRecord {
                    name: row.get(1)?,
                    type_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    nullable: row.get::<_, i32>(3)? == 0,
                    is_primary_key: row.get::<_, i32>(5)? > 0,
                })
            })
            .map_err(|e| format_sqlite_error(&e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format_sqlite_error(&e))?;

        Ok(columns)
    }
}

impl MetadataLoader for SqliteMetadataLoader {
    fn kind(&self) -> DbKind {
        DbKind::SQLite
    }

    fn capabilities(&self) -> MetadataCapabilities {
        MetadataCapabilities::SCHEMAS
    }

    fn load_entities(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        tables: &TableFilter,
        table_types: &[String],
    ) -> Result<Vec<EntityRecord>, DbError> {
        if let Some(catalog) = catalog {
            log::debug!("[SCHEMA] SQLite has no catalogs, ignoring '{}'", catalog);
        }

        let matcher = tables.compile()?;
        let object_types = sqlite_object_types(table_types);

        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::inspection_failed(format!("Lock error: {}", e)))?;

        let schemas = match schema {
            Some(schema) => vec![schema.to_string()],
            None => self.get_schemas(&conn)?,
        };

        let mut entities = Vec::new();

        for schema in schemas {
            for table in self.get_tables(&conn, &schema, &object_types)? {
                if !matcher.matches(&table) {
                    continue;
                }

                let columns = self.get_columns(&conn, &schema, &table)?;
                entities.push(EntityRecord::new(
                    table,
                    None,
                    Some(schema.clone()),
                    columns,
                ));
            }
        }

        log::info!(
            "[SCHEMA] Loaded {} entities from schema {}",
            entities.len(),
            schema.unwrap_or("<all>")
        );

        Ok(entities)
    }
}

/// `sqlite_master.type` values for the requested table types.
fn sqlite_object_types(table_types: &[String]) -> Vec<&'static str> {
    let mut types = Vec::new();

    for table_type in table_types {
        let object_type = match table_type.to_ascii_uppercase().as_str() {
            "TABLE" => "table",
            "VIEW" => "view",
            other => {
                log::debug!("[SCHEMA] Ignoring table type {} for SQLite", other);
                continue;
            }
        };

        if !types.contains(&object_type) {
            types.push(object_type);
        }
    }

    types
}

fn format_sqlite_error(e: &rusqlite::Error) -> DbError {
    log::error!("SQLite metadata query failed: {}", e);
    DbError::inspection_failed(e.to_string())
}

fn sqlite_quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_types_map_case_insensitively() {
        let types = sqlite_object_types(&[
            "table".to_string(),
            "VIEW".to_string(),
            "SYSTEM TABLE".to_string(),
            "TABLE".to_string(),
        ]);
        assert_eq!(types, vec!["table", "view"]);
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(sqlite_quote_ident("main"), "\"main\"");
        assert_eq!(sqlite_quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_in_memory_connection_reports_main_schema() {
        let conn = RusqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a INTEGER PRIMARY KEY, b TEXT NOT NULL, c)")
            .unwrap();

        let loader = SqliteMetadataLoader::from_connection(conn);
        let entities = loader
            .load_entities(None, None, &TableFilter::include_all(), &["TABLE".to_string()])
            .unwrap();

        assert_eq!(entities.len(), 1);
        let t = &entities[0];
        assert_eq!(t.name, "t");
        assert_eq!(t.catalog, None);
        assert_eq!(t.schema.as_deref(), Some("main"));
        assert_eq!(t.attribute_names().collect::<Vec<_>>(), vec!["a", "b", "c"]);

        assert!(t.attributes[0].is_primary_key);
        assert!(!t.attributes[1].nullable);
        assert!(t.attributes[2].nullable);
        assert_eq!(t.attributes[2].type_name, "");
    }
}
