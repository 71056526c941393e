pub mod deloox;
pub mod fixtures;
pub mod http_client;
pub mod server;
pub mod shopify;

pub use deloox::DelooxMock;
pub use fixtures::*;
pub use http_client::SyncClient;
pub use server::{serve, MockServer};
pub use shopify::{InventorySet, ShopifyMock};
