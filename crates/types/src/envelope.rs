//! Request and response envelopes shared by every Record Store collection.
//!
//! The store wraps stored documents in `{ id, attributes }` entries, wraps
//! reads in `{ data, meta }` and writes in `{ data }`, and reports failures
//! through an `error` object. These shapes are a fixed external contract.

use serde::{Deserialize, Serialize};

/// One stored document: numeric id plus collection-specific attributes.
///
/// Store-managed timestamps (`createdAt` and friends) arrive inside
/// `attributes`; shapes that need one declare the field explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub id: u64,
    pub attributes: T,
}

/// Collection read: one page of entries plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<Entry<T>>,
    #[serde(default)]
    pub meta: ResponseMeta,
}

/// Single-entity read or write acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResponse<T> {
    pub data: Entry<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Pagination block the store returns under `meta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Pagination {
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    #[serde(rename = "pageCount")]
    pub page_count: u32,
    pub total: u64,
}

/// A to-one relation; `data` is `None` when unset or not populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation<T> {
    pub data: Option<Entry<T>>,
}

impl<T> Relation<T> {
    /// Id of the related entry, when present.
    pub fn id(&self) -> Option<u64> {
        self.data.as_ref().map(|entry| entry.id)
    }

    pub fn entry(&self) -> Option<&Entry<T>> {
        self.data.as_ref()
    }
}

impl<T> Default for Relation<T> {
    fn default() -> Self {
        Self { data: None }
    }
}

/// A to-many relation; empty when not populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationList<T> {
    pub data: Vec<Entry<T>>,
}

impl<T> Default for RelationList<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

/// Body wrapper for create and update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteBody<T> {
    pub data: T,
}

/// Error payload carried by non-2xx store responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{OutpatientFields, VisitStatus};

    #[test]
    fn test_list_response_parses_store_shape() {
        let body = r#"{
            "data": [
                {
                    "id": 12,
                    "attributes": {
                        "status": "in_queue",
                        "appointment_date": "2023-08-12T02:10:00.000Z",
                        "registration_date": "2023-08-12T02:10:00.000Z",
                        "createdAt": "2023-08-12T02:10:05.000Z",
                        "updatedAt": "2023-08-12T02:10:05.000Z",
                        "publishedAt": "2023-08-12T02:10:05.000Z",
                        "patient": { "data": { "id": 3, "attributes": { "name": "Budi" } } }
                    }
                }
            ],
            "meta": { "pagination": { "page": 1, "pageSize": 10, "pageCount": 1, "total": 1 } }
        }"#;

        let parsed: ListResponse<OutpatientFields> =
            serde_json::from_str(body).expect("list body should deserialize");
        assert_eq!(parsed.data.len(), 1);
        let visit = &parsed.data[0];
        assert_eq!(visit.id, 12);
        assert_eq!(visit.attributes.status, VisitStatus::InQueue);
        assert_eq!(visit.attributes.patient.id(), Some(3));
        assert!(visit.attributes.doctor.entry().is_none());
        let pagination = parsed.meta.pagination.expect("pagination should be present");
        assert_eq!(pagination.page_size, 10);
        assert_eq!(pagination.total, 1);
    }

    #[test]
    fn test_error_response_keeps_details() {
        let body = r#"{
            "data": null,
            "error": {
                "status": 400,
                "name": "ValidationError",
                "message": "name must be defined.",
                "details": { "errors": [{ "path": ["name"] }] }
            }
        }"#;

        let parsed: ErrorResponse = serde_json::from_str(body).expect("error body should parse");
        assert_eq!(parsed.error.status, 400);
        assert_eq!(parsed.error.name, "ValidationError");
        assert!(parsed.error.details.get("errors").is_some());
    }

    #[test]
    fn test_error_details_default_to_null() {
        let body = r#"{ "error": { "status": 401, "name": "UnauthorizedError", "message": "Missing or invalid credentials" } }"#;
        let parsed: ErrorResponse = serde_json::from_str(body).expect("error body should parse");
        assert!(parsed.error.details.is_null());
    }
}
