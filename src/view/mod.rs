// Lazy projections over stored records. Related records are fetched only
// when a relation accessor is invoked, always through the loaders of the
// operation that produced the view.

pub mod customer;
pub mod order;
pub mod relation;

pub use customer::CustomerView;
pub use order::OrderView;
pub use relation::Relation;
