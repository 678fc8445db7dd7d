//! Record Store access: query construction, write payloads and the HTTP
//! client all scoped reads go through.

pub mod client;
pub mod payloads;
pub mod query;

pub use client::{collections, RecordStoreClient};
pub use query::Query;
