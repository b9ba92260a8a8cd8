pub mod document;
pub mod error;
pub mod types;

pub use document::{Document, ID_FIELD, UPDATED_AT_FIELD, VERSION_FIELD};
pub use error::{DomainError, ErrorCode, ErrorPayload, Result};
pub use types::{Coordinates, EntityId, Metadata, ModelStatus, OrderStatus, UserId};
