//! # Klinik Types
//!
//! Shared wire types for the klinik outpatient system:
//! - Record Store envelopes (entries, relations, pagination, error bodies)
//! - Entity attribute shapes and the status/gender/inventory enumerations
//! - Validated text primitives used across crates
//!
//! **No behaviour**: transition rules, derived values and HTTP concerns live
//! in `klinik-core`.

#![warn(rust_2018_idioms)]

pub mod entities;
pub mod envelope;
pub mod text;

pub use entities::{
    Account, AuthResponse, DoctorFields, DrugLineFields, Gender, InventoryFields, InventoryType,
    MedicalTreatmentFields, OrganizationRef, OutpatientFields, PatientFields, PatientRecordFields,
    PolyclinicFields, TreatmentLineFields, VisitStatus,
};
pub use envelope::{
    ApiErrorBody, EntityResponse, Entry, ErrorResponse, ListResponse, Pagination, Relation,
    RelationList, ResponseMeta, WriteBody,
};
pub use text::{NonEmptyText, TextError};
