//! Shopping cart persisted to local storage.
//!
//! The cart lives in a single named slot as a JSON array of line items.
//! Storage backends are pluggable: SQLite on disk for the app, an in-memory
//! map for tests.

mod storage;
mod store;

pub use storage::{CartStorage, MemoryStorage, SqliteStorage};
pub use store::{CartLineItem, CartStore, CartSummary};
