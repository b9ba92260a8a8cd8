pub mod collection;
pub mod engine;
pub mod memory;
pub mod repository;

pub use collection::Collection;
pub use engine::{DocumentStore, Filter};
pub use memory::InMemoryStore;
pub use repository::Repository;
