pub mod inventory_client;
pub mod models;
pub mod order_repo;

pub use inventory_client::HttpInventoryClient;
pub use order_repo::DieselOrderRepository;
