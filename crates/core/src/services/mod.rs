//! Org-scoped domain services over the Record Store client.
//!
//! Services are cheap request-scoped structs around the shared client and
//! config; handlers construct them per request. Every scoped method takes
//! a [`crate::RequestContext`] explicitly.

pub mod catalog;
pub mod patients;
pub mod records;
pub mod visits;

pub use catalog::CatalogService;
pub use patients::PatientService;
pub use records::RecordService;
pub use visits::VisitService;
