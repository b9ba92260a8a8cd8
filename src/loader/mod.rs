pub mod batch;
pub mod document;

pub use batch::{BatchFn, BatchLoader, LoadOutcome, LoaderStats};
pub use document::{DocumentFetcher, DocumentLoader};
