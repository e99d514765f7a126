pub mod confirm_delivery;
pub mod dispatch_delivery;
pub mod search_deliveries;
