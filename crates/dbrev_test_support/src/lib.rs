pub mod fake_loader;
pub mod fixtures;

pub use fake_loader::{EntityRequest, FakeLoadOutcome, FakeLoaderStats, FakeMetadataLoader};
