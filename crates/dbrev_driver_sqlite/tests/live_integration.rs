use dbrev_core::{
    BuildStrategy, CatalogFilter, DataMap, DbError, DbModel, ElementKind, FiltersConfig,
    MetadataLoader, ReverseEngineer, ReverseEngineeringConfig, ReverseEngineeringSession,
    SchemaFilter, TableFilter,
};
use dbrev_driver_sqlite::SqliteMetadataLoader;
use dbrev_test_support::fixtures::schema_only_filters;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_database(dir: &Path, file: &str, ddl: &str) -> PathBuf {
    let path = dir.join(file);
    let conn = Connection::open(&path).expect("create database");
    conn.execute_batch(ddl).expect("apply ddl");
    path
}

fn shop_database() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = create_database(
        dir.path(),
        "shop.sqlite",
        "CREATE TABLE customers (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL,
            name TEXT
        );
        CREATE TABLE orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL REFERENCES customers(id),
            total REAL
        );
        CREATE INDEX idx_orders_customer ON orders(customer_id);
        CREATE VIEW big_orders AS SELECT id, total FROM orders WHERE total > 100;",
    );
    (dir, path)
}

fn names(model: &DbModel, kind: ElementKind) -> Vec<String> {
    model
        .elements_of_kind(kind)
        .iter()
        .map(|node| node.label().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[test]
fn sqlite_loads_tables_and_views_with_columns() -> Result<(), DbError> {
    let (_dir, path) = shop_database();
    let loader = SqliteMetadataLoader::open(&path)?;

    let entities = loader.load_entities(
        None,
        None,
        &TableFilter::include_all(),
        &["TABLE".to_string(), "VIEW".to_string()],
    )?;

    // sqlite_sequence (from AUTOINCREMENT) is internal and must not appear.
    let names: Vec<_> = entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["big_orders", "customers", "orders"]);
    assert!(entities.iter().all(|e| e.schema.as_deref() == Some("main")));
    assert!(entities.iter().all(|e| e.catalog.is_none()));

    let orders = entities
        .iter()
        .find(|e| e.name == "orders")
        .expect("orders loaded");
    assert_eq!(
        orders.attribute_names().collect::<Vec<_>>(),
        vec!["id", "customer_id", "total"]
    );
    assert!(orders.attributes[0].is_primary_key);
    assert!(!orders.attributes[1].nullable);
    assert_eq!(orders.attributes[2].type_name, "REAL");

    Ok(())
}

#[test]
fn sqlite_table_types_restrict_object_kinds() -> Result<(), DbError> {
    let (_dir, path) = shop_database();
    let loader = SqliteMetadataLoader::open(&path)?;

    let tables = loader.load_entities(
        None,
        Some("main"),
        &TableFilter::include_all(),
        &["TABLE".to_string()],
    )?;
    assert_eq!(tables.len(), 2);

    let views = loader.load_entities(
        None,
        Some("main"),
        &TableFilter::include_all(),
        &["VIEW".to_string()],
    )?;
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].name, "big_orders");

    let none = loader.load_entities(
        None,
        Some("main"),
        &TableFilter::include_all(),
        &["SYNONYM".to_string()],
    )?;
    assert!(none.is_empty());

    Ok(())
}

#[test]
fn sqlite_attached_databases_are_schemas() -> Result<(), DbError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = create_database(dir.path(), "main.sqlite", "CREATE TABLE notes (id INTEGER, body TEXT);");
    let archive = create_database(dir.path(), "archive.sqlite", "CREATE TABLE old_notes (id INTEGER);");

    let conn = Connection::open(&main).expect("open main");
    conn.execute(
        "ATTACH DATABASE ?1 AS archive",
        [archive.to_str().expect("utf-8 path")],
    )
    .expect("attach");
    conn.execute_batch("CREATE TEMP TABLE scratch (x INTEGER);")
        .expect("temp table");

    let loader = SqliteMetadataLoader::from_connection(conn);
    let entities =
        loader.load_entities(None, None, &TableFilter::include_all(), &["TABLE".to_string()])?;

    let placed: Vec<_> = entities
        .iter()
        .map(|e| (e.schema.as_deref().unwrap_or_default(), e.name.as_str()))
        .collect();
    assert_eq!(placed, vec![("main", "notes"), ("archive", "old_notes")]);

    Ok(())
}

#[test]
fn sqlite_unknown_schema_is_inspection_failure() {
    let (_dir, path) = shop_database();
    let loader = SqliteMetadataLoader::open(&path).expect("open");

    let err = loader
        .load_entities(
            None,
            Some("nope"),
            &TableFilter::include_all(),
            &["TABLE".to_string()],
        )
        .unwrap_err();

    assert!(matches!(err, DbError::InspectionFailed(_)));
}

#[test]
fn sqlite_missing_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = SqliteMetadataLoader::open(dir.path().join("missing.sqlite"));

    assert!(matches!(result, Err(DbError::InspectionFailed(_))));
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[test]
fn sqlite_full_run_builds_schema_tree() -> Result<(), DbError> {
    let (_dir, path) = shop_database();
    let loader = SqliteMetadataLoader::open(&path)?;

    let mut session = ReverseEngineeringSession::new("shop");
    let mut data_map = DataMap::new("shop");
    let report = session.run(&loader, &mut data_map, &ReverseEngineeringConfig::default())?;

    assert_eq!(report.strategy, Some(BuildStrategy::NullTolerant));
    assert_eq!(report.entities, 3);
    assert_eq!(report.columns, 8);
    assert_eq!(report.procedures, 0);

    let model = session.model();
    assert_eq!(names(model, ElementKind::Schema), vec!["main"]);
    assert_eq!(model.count(ElementKind::Catalog), 0);

    let main = model
        .find_child(None, ElementKind::Schema, Some("main"))
        .expect("main schema")
        .id;
    let entities: Vec<_> = model
        .children_of(main)
        .iter()
        .map(|node| node.label().to_string())
        .collect();
    assert_eq!(entities, vec!["big_orders", "customers", "orders"]);

    Ok(())
}

#[test]
fn sqlite_qualified_filters_use_strict_strategy() -> Result<(), DbError> {
    let (_dir, path) = shop_database();
    let loader = SqliteMetadataLoader::open(&path)?;

    let mut config = ReverseEngineeringConfig::with_filters(FiltersConfig::new(vec![
        CatalogFilter::unqualified(vec![SchemaFilter::new(
            Some("main".to_string()),
            TableFilter::including(["cust.*", "orders"]),
        )]),
    ]));
    config.table_types = vec!["TABLE".to_string()];

    let mut model = DbModel::new("shop");
    let mut data_map = DataMap::new("shop");
    let report = ReverseEngineer::new(&loader).load(&mut model, &mut data_map, &config)?;

    assert_eq!(report.strategy, Some(BuildStrategy::Strict));
    assert_eq!(names(&model, ElementKind::Entity), vec!["customers", "orders"]);
    assert_eq!(data_map.entities.len(), 2);

    Ok(())
}

#[test]
fn sqlite_empty_schema_adds_no_nodes() -> Result<(), DbError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = create_database(dir.path(), "empty.sqlite", "PRAGMA user_version = 1;");
    let loader = SqliteMetadataLoader::open(&path)?;

    let mut model = DbModel::new("empty");
    let mut data_map = DataMap::new("empty");
    let report = ReverseEngineer::new(&loader).load(
        &mut model,
        &mut data_map,
        &ReverseEngineeringConfig::with_filters(schema_only_filters(&[Some("main")])),
    )?;

    assert!(model.is_empty());
    assert_eq!(report.empty_results(), 1);

    Ok(())
}
