pub mod customers;
pub mod inventory;
pub mod products;
pub mod quotes;
pub mod reports;
pub mod sales;

pub use customers::CustomerService;
pub use products::ProductService;
pub use quotes::QuoteService;
pub use reports::DashboardService;
pub use sales::SaleService;
