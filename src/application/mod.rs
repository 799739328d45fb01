pub mod decrement_relay;
pub mod order_service;

pub use decrement_relay::DecrementRelay;
pub use order_service::OrderService;
