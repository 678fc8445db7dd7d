//! HTTP client for the Record Store.
//!
//! One client is built at startup and shared by every service. All entity
//! reads are tenant-scoped here, so a caller cannot issue an unscoped read;
//! the two auth endpoints are the only exceptions.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use klinik_types::{Account, AuthResponse, EntityResponse, Entry, ErrorResponse, ListResponse, WriteBody};

use crate::constants::{API_PREFIX, CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use crate::context::RequestContext;
use crate::error::{ClinicError, ClinicResult};
use crate::store::query::Query;

/// Collection paths, relative to the `/api` prefix.
pub mod collections {
    pub const PATIENTS: &str = "patients";
    pub const DOCTORS: &str = "doctors";
    pub const POLYCLINICS: &str = "polyclinics";
    pub const INVENTORIES: &str = "inventories";
    pub const MEDICAL_TREATMENTS: &str = "medical-treatments";
    pub const OUTPATIENTS: &str = "outpatients";
    pub const PATIENT_RECORDS: &str = "patient-records";
    pub const DRUG_LINES: &str = "patient-record-inventories";
    pub const TREATMENT_LINES: &str = "patient-record-medical-treatments";
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

/// Shared HTTP client wrapping the store's REST conventions.
#[derive(Clone, Debug)]
pub struct RecordStoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl RecordStoreClient {
    /// Builds a client for the store at `base_url`.
    ///
    /// The URL must be absolute `http` or `https`; a trailing slash is
    /// trimmed so endpoint paths can be appended verbatim.
    pub fn new(base_url: &str) -> ClinicResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|e| ClinicError::Url(e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ClinicError::Url(format!(
                "unsupported scheme '{}', expected http or https",
                parsed.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
        })
    }

    fn endpoint(&self, collection: &str) -> String {
        format!("{}{}/{}", self.base_url, API_PREFIX, collection)
    }

    /// Authenticates against the store's local provider.
    pub async fn login(&self, identifier: &str, password: &str) -> ClinicResult<AuthResponse> {
        let response = self
            .http
            .post(format!("{}{}/auth/local", self.base_url, API_PREFIX))
            .json(&LoginRequest { identifier, password })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Fetches the calling account with its organization populated.
    pub async fn own_account(&self, api_token: &str) -> ClinicResult<Account> {
        let response = self
            .http
            .get(format!(
                "{}{}/users/me?populate=organization",
                self.base_url, API_PREFIX
            ))
            .bearer_auth(api_token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Org-scoped collection read.
    pub async fn list<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        collection: &str,
        query: Query,
    ) -> ClinicResult<ListResponse<T>> {
        let query_string = query.scoped_to(ctx).encode();
        let response = self
            .http
            .get(format!("{}?{}", self.endpoint(collection), query_string))
            .bearer_auth(&ctx.api_token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Org-scoped single-entity read.
    ///
    /// Detail fetches go through the list endpoint with an id filter so the
    /// organization scope applies to them exactly like list reads; an id
    /// outside the caller's organization is indistinguishable from a
    /// missing one.
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        collection: &str,
        id: u64,
        query: Query,
    ) -> ClinicResult<Entry<T>> {
        let query = query.filter("id", serde_json::json!({ "$eq": id }));
        let mut listed: ListResponse<T> = self.list(ctx, collection, query).await?;
        if listed.data.is_empty() {
            return Err(ClinicError::NotFound(format!("{collection}/{id}")));
        }
        Ok(listed.data.swap_remove(0))
    }

    /// Creates a document. The payload must already carry the organization
    /// reference; the service layer guarantees that.
    pub async fn create<T: DeserializeOwned, B: Serialize>(
        &self,
        ctx: &RequestContext,
        collection: &str,
        body: &B,
    ) -> ClinicResult<EntityResponse<T>> {
        let response = self
            .http
            .post(self.endpoint(collection))
            .bearer_auth(&ctx.api_token)
            .json(&WriteBody { data: body })
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn update<T: DeserializeOwned, B: Serialize>(
        &self,
        ctx: &RequestContext,
        collection: &str,
        id: u64,
        body: &B,
    ) -> ClinicResult<EntityResponse<T>> {
        let response = self
            .http
            .put(format!("{}/{id}", self.endpoint(collection)))
            .bearer_auth(&ctx.api_token)
            .json(&WriteBody { data: body })
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn delete(&self, ctx: &RequestContext, collection: &str, id: u64) -> ClinicResult<()> {
        let response = self
            .http
            .delete(format!("{}/{id}", self.endpoint(collection)))
            .bearer_auth(&ctx.api_token)
            .send()
            .await?;
        // Deletion acknowledgements echo the removed entry; nothing needs it.
        let _: serde_json::Value = self.handle_response(response).await?;
        Ok(())
    }

    /// Maps a store response to the typed result: 2xx deserializes, 404
    /// becomes `NotFound`, anything else preserves the store's error body.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ClinicResult<T> {
        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ClinicError::NotFound("record store entity".into()));
        }

        let bytes = response.bytes().await?;
        match serde_json::from_slice::<ErrorResponse>(&bytes) {
            Ok(envelope) => Err(envelope.error.into()),
            Err(_) => Err(ClinicError::RemoteRequest {
                status: status.as_u16(),
                name: status.canonical_reason().unwrap_or("Unknown").to_string(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
                details: serde_json::Value::Null,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klinik_types::PatientFields;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_ctx() -> RequestContext {
        RequestContext::new("test-token", 7)
    }

    fn patient_list_body(ids: &[u64]) -> serde_json::Value {
        let data: Vec<_> = ids
            .iter()
            .map(|id| json!({ "id": id, "attributes": { "name": format!("Patient {id}") } }))
            .collect();
        json!({
            "data": data,
            "meta": { "pagination": { "page": 1, "pageSize": 10, "pageCount": 1, "total": data.len() } }
        })
    }

    #[test]
    fn test_new_rejects_relative_urls() {
        assert!(matches!(
            RecordStoreClient::new("not-a-url"),
            Err(ClinicError::Url(_))
        ));
    }

    #[test]
    fn test_new_rejects_unsupported_schemes() {
        assert!(matches!(
            RecordStoreClient::new("ftp://store.example.com"),
            Err(ClinicError::Url(_))
        ));
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = RecordStoreClient::new("http://localhost:1337/").expect("valid URL");
        assert_eq!(client.endpoint("patients"), "http://localhost:1337/api/patients");
    }

    #[tokio::test]
    async fn test_list_is_always_org_scoped_and_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients"))
            .and(query_param("filters[organization][id][$eq]", "7"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(patient_list_body(&[1, 2])))
            .expect(1)
            .mount(&server)
            .await;

        let client = RecordStoreClient::new(&server.uri()).expect("valid URL");
        let listed: ListResponse<PatientFields> = client
            .list(&test_ctx(), collections::PATIENTS, Query::new())
            .await
            .expect("list should succeed");
        assert_eq!(listed.data.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_one_maps_an_empty_page_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients"))
            .and(query_param("filters[id][$eq]", "42"))
            .and(query_param("filters[organization][id][$eq]", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(patient_list_body(&[])))
            .mount(&server)
            .await;

        let client = RecordStoreClient::new(&server.uri()).expect("valid URL");
        let result: ClinicResult<Entry<PatientFields>> = client
            .fetch_one(&test_ctx(), collections::PATIENTS, 42, Query::new())
            .await;
        assert!(matches!(result, Err(ClinicError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_wraps_the_payload_in_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/patients"))
            .and(body_partial_json(json!({ "data": { "name": "Budi", "organization": 7 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 9, "attributes": { "name": "Budi" } },
                "meta": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RecordStoreClient::new(&server.uri()).expect("valid URL");
        let created: EntityResponse<PatientFields> = client
            .create(
                &test_ctx(),
                collections::PATIENTS,
                &json!({ "name": "Budi", "organization": 7 }),
            )
            .await
            .expect("create should succeed");
        assert_eq!(created.data.id, 9);
    }

    #[tokio::test]
    async fn test_store_error_bodies_are_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/patients"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "data": null,
                "error": {
                    "status": 400,
                    "name": "ValidationError",
                    "message": "name must be defined.",
                    "details": { "errors": [{ "path": ["name"] }] }
                }
            })))
            .mount(&server)
            .await;

        let client = RecordStoreClient::new(&server.uri()).expect("valid URL");
        let result: ClinicResult<EntityResponse<PatientFields>> = client
            .create(&test_ctx(), collections::PATIENTS, &json!({}))
            .await;
        match result {
            Err(ClinicError::RemoteRequest {
                status,
                name,
                message,
                details,
            }) => {
                assert_eq!(status, 400);
                assert_eq!(name, "ValidationError");
                assert_eq!(message, "name must be defined.");
                assert!(details.get("errors").is_some());
            }
            other => panic!("expected RemoteRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plain_404_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/patients/42"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "data": null,
                "error": { "status": 404, "name": "NotFoundError", "message": "Not Found" }
            })))
            .mount(&server)
            .await;

        let client = RecordStoreClient::new(&server.uri()).expect("valid URL");
        let result = client.delete(&test_ctx(), collections::PATIENTS, 42).await;
        assert!(matches!(result, Err(ClinicError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_login_posts_the_identifier_pair_unilaterally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/local"))
            .and(body_partial_json(json!({ "identifier": "admin@example.com", "password": "secret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwt": "token-abc",
                "user": {
                    "id": 1,
                    "username": "admin",
                    "email": "admin@example.com",
                    "organization": { "id": 7, "name": "Klinik Sehat" }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RecordStoreClient::new(&server.uri()).expect("valid URL");
        let auth = client
            .login("admin@example.com", "secret")
            .await
            .expect("login should succeed");
        assert_eq!(auth.jwt, "token-abc");
        assert_eq!(auth.user.organization.map(|org| org.id), Some(7));
    }
}
