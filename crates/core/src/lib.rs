//! # Klinik Core
//!
//! Core business logic for the klinik outpatient system:
//! - Record Store client (query building, tenant scoping, error mapping)
//! - Visit status workflow and its ensure-record side effect
//! - Clinical aggregation (BMI, line totals, catalog filtering, invoices)
//! - Org-scoped services for patients, catalogs, visits and records
//!
//! **No API concerns**: HTTP endpoints, OpenAPI documentation and CLI
//! presentation belong in `api-rest` and `klinik-cli`.

#![warn(rust_2018_idioms)]

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod format;
pub mod services;
pub mod store;
pub mod workflow;

pub use config::CoreConfig;
pub use context::RequestContext;
pub use error::{ClinicError, ClinicResult};
pub use store::client::RecordStoreClient;
