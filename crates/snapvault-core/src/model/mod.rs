pub mod metadata;
pub mod record;

pub use metadata::Metadata;
pub use record::SnapshotRecord;
