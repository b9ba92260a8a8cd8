pub mod customer;
pub mod order;

pub use customer::{Customer, CustomerPatch, CustomerUpdate, NewCustomer};
pub use order::{NewOrder, Order, OrderPatch, OrderUpdate};
