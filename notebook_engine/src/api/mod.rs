mod directory_api;
mod order_flow_api;
mod status_api;

pub use directory_api::DirectoryApi;
pub use order_flow_api::OrderFlowApi;
pub use status_api::{PurchaseStatus, StatusApi};
