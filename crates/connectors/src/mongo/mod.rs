pub mod collection;
pub mod convert;
pub mod store;

pub use collection::MongoCollection;
pub use store::MongoStore;
