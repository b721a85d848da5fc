// taxdeck-api: Async HTTP client for the taxdeck record service.

pub mod client;
pub mod error;
pub mod model;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use model::{Country, Tax};
pub use transport::TransportConfig;
