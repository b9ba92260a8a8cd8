pub mod customer;
pub mod linker;
pub mod order;
pub mod update;

pub use customer::CustomerService;
pub use linker::TransactionalLinker;
pub use order::OrderService;
pub use update::update_by_id;
