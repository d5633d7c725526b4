//! Remote product catalog: domain types, wire types and the HTTP client.

mod api_types;
pub mod client;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use client::{CatalogApi, CatalogClient};
pub use error::FetchError;
pub use types::Product;
