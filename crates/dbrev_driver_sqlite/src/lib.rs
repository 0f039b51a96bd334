mod loader;

pub use loader::SqliteMetadataLoader;
