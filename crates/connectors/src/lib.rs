pub mod collection;
pub mod error;
pub mod memory;
pub mod mongo;

pub use collection::{CollectionStats, SourceCollection, TargetCollection};
pub use error::AdapterError;
