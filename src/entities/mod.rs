pub mod customer;
pub mod product;
pub mod quote;
pub mod sale;
pub mod sale_item;

pub use sale::PaymentMethod;
