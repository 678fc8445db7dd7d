//! Outpatient visit lifecycle: queueing, the queue listing, the status
//! workflow and its ensure-record side effect.
//!
//! Event handling always re-reads the visit first, so the transition check
//! runs against the store's current status and an illegal event writes
//! nothing.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use klinik_types::{Entry, ListResponse, OutpatientFields, VisitStatus};

use crate::config::CoreConfig;
use crate::context::RequestContext;
use crate::error::{ClinicError, ClinicResult};
use crate::store::client::collections;
use crate::store::payloads::{NewRecord, NewVisit, RecordRefPatch, StatusPatch};
use crate::store::{Query, RecordStoreClient};
use crate::workflow::{transition, VisitEvent};

// ============================================================================
// POPULATION SHAPES
// ============================================================================

/// Queue listing population: participant names only.
fn listing_population() -> Value {
    json!({
        "patient": { "fields": ["name"] },
        "doctor": { "fields": ["name"] },
    })
}

/// Event-handling population: enough to know the current status, the
/// participants and whether a record is attached.
fn event_population() -> Value {
    json!({
        "patient": { "fields": ["name"] },
        "doctor": { "fields": ["name"] },
        "patient_record": { "fields": ["id"] },
    })
}

/// Full clinical population for the detail and invoice views.
pub(crate) fn full_population() -> Value {
    json!({
        "patient": "*",
        "doctor": "*",
        "polyclinic": "*",
        "patient_record": {
            "populate": {
                "patient_record_inventories": { "populate": ["inventory"] },
                "patient_record_medical_treatments": { "populate": ["medical_treatment"] },
            }
        }
    })
}

pub(crate) async fn fetch_visit_for_event(
    client: &RecordStoreClient,
    ctx: &RequestContext,
    visit_id: u64,
) -> ClinicResult<Entry<OutpatientFields>> {
    client
        .fetch_one(
            ctx,
            collections::OUTPATIENTS,
            visit_id,
            Query::new().populate(event_population()),
        )
        .await
}

/// Patient and doctor ids off a fetched visit; both are mandatory
/// references in practice.
pub(crate) fn participant_ids(visit: &Entry<OutpatientFields>) -> ClinicResult<(u64, u64)> {
    let patient = visit.attributes.patient.id().ok_or_else(|| {
        ClinicError::InvalidInput(format!("visit {} has no patient reference", visit.id))
    })?;
    let doctor = visit.attributes.doctor.id().ok_or_else(|| {
        ClinicError::InvalidInput(format!("visit {} has no doctor reference", visit.id))
    })?;
    Ok((patient, doctor))
}

/// Creates an empty record for the visit and attaches it, unless one is
/// already referenced.
///
/// The caller has just fetched `visit`, so the presence check reflects the
/// store's current state. Two racing callers can still both create; the
/// later attach wins and the loser's record stays unreferenced.
pub(crate) async fn ensure_record_for(
    client: &RecordStoreClient,
    ctx: &RequestContext,
    visit: &Entry<OutpatientFields>,
) -> ClinicResult<u64> {
    if let Some(existing) = visit.attributes.patient_record.id() {
        return Ok(existing);
    }

    let (patient, doctor) = participant_ids(visit)?;

    let created = client
        .create::<klinik_types::PatientRecordFields, _>(
            ctx,
            collections::PATIENT_RECORDS,
            &NewRecord {
                patient,
                doctor,
                organization: ctx.organization_id,
            },
        )
        .await?;
    let record_id = created.data.id;

    client
        .update::<OutpatientFields, _>(
            ctx,
            collections::OUTPATIENTS,
            visit.id,
            &RecordRefPatch {
                patient_record: record_id,
            },
        )
        .await?;
    tracing::info!("created patient record {} for visit {}", record_id, visit.id);

    Ok(record_id)
}

// ============================================================================
// VISIT SERVICE
// ============================================================================

/// Queue entry input: who sees whom, and where.
#[derive(Debug, Clone)]
pub struct EnqueueVisit {
    pub patient: u64,
    pub doctor: u64,
    pub polyclinic: u64,
}

/// Listing parameters for the queue view.
#[derive(Debug, Clone, Default)]
pub struct VisitFilter {
    pub search: Option<String>,
    pub status: Option<VisitStatus>,
    pub page: u32,
}

pub struct VisitService {
    client: Arc<RecordStoreClient>,
    cfg: Arc<CoreConfig>,
}

impl VisitService {
    pub fn new(client: Arc<RecordStoreClient>, cfg: Arc<CoreConfig>) -> Self {
        Self { client, cfg }
    }

    /// Queues a visit: status starts at `in_queue` with the appointment and
    /// registration timestamps both set to now.
    pub async fn enqueue(
        &self,
        ctx: &RequestContext,
        input: EnqueueVisit,
    ) -> ClinicResult<Entry<OutpatientFields>> {
        let now = Utc::now();
        let payload = NewVisit {
            patient: input.patient,
            doctor: input.doctor,
            polyclinic: input.polyclinic,
            organization: ctx.organization_id,
            status: VisitStatus::InQueue,
            appointment_date: now,
            registration_date: now,
        };
        let created = self
            .client
            .create(ctx, collections::OUTPATIENTS, &payload)
            .await?;
        Ok(created.data)
    }

    /// Queue listing: optional text search over doctor and patient names,
    /// optional status filter, newest appointment first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: VisitFilter,
    ) -> ClinicResult<ListResponse<OutpatientFields>> {
        let mut query = Query::new()
            .paginate(filter.page.max(1), self.cfg.page_size())
            .populate(listing_population())
            .sort("appointment_date:desc");
        if let Some(term) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            query = query.filter(
                "$or",
                json!([
                    { "doctor": { "name": { "$contains": term } } },
                    { "patient": { "name": { "$contains": term } } },
                ]),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter("status", json!(status));
        }
        self.client.list(ctx, collections::OUTPATIENTS, query).await
    }

    /// One visit with the full clinical population.
    pub async fn find(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
    ) -> ClinicResult<Entry<OutpatientFields>> {
        self.client
            .fetch_one(
                ctx,
                collections::OUTPATIENTS,
                visit_id,
                Query::new().populate(full_population()),
            )
            .await
    }

    pub async fn start_processing(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
    ) -> ClinicResult<Entry<OutpatientFields>> {
        self.apply_event(ctx, visit_id, VisitEvent::StartProcessing)
            .await
    }

    pub async fn cancel(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
    ) -> ClinicResult<Entry<OutpatientFields>> {
        self.apply_event(ctx, visit_id, VisitEvent::Cancel).await
    }

    pub async fn advance_to_payment(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
    ) -> ClinicResult<Entry<OutpatientFields>> {
        self.apply_event(ctx, visit_id, VisitEvent::AdvanceToPayment)
            .await
    }

    pub async fn mark_done(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
    ) -> ClinicResult<Entry<OutpatientFields>> {
        self.apply_event(ctx, visit_id, VisitEvent::MarkDone).await
    }

    /// Validates and applies one workflow event: fetch, check the
    /// transition, run the side effect, persist the new status. An illegal
    /// event fails before anything is written.
    pub async fn apply_event(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
        event: VisitEvent,
    ) -> ClinicResult<Entry<OutpatientFields>> {
        let visit = fetch_visit_for_event(&self.client, ctx, visit_id).await?;
        let next = transition(visit.attributes.status, event)?;

        if event == VisitEvent::StartProcessing {
            ensure_record_for(&self.client, ctx, &visit).await?;
        }

        let updated = self
            .client
            .update(
                ctx,
                collections::OUTPATIENTS,
                visit_id,
                &StatusPatch { status: next },
            )
            .await?;
        Ok(updated.data)
    }

    /// Guarantees the visit has a Patient Record, creating and attaching an
    /// empty one when absent. Sequential calls return the same record id
    /// and never create a second record.
    pub async fn ensure_record(&self, ctx: &RequestContext, visit_id: u64) -> ClinicResult<u64> {
        let visit = fetch_visit_for_event(&self.client, ctx, visit_id).await?;
        ensure_record_for(&self.client, ctx, &visit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_ctx() -> RequestContext {
        RequestContext::new("test-token", 7)
    }

    async fn test_service(server: &MockServer) -> VisitService {
        let client = RecordStoreClient::new(&server.uri()).expect("valid URL");
        let cfg = CoreConfig::new(server.uri(), 10).expect("valid config");
        VisitService::new(Arc::new(client), Arc::new(cfg))
    }

    fn visit_list_body(id: u64, status: &str, record: Option<u64>) -> serde_json::Value {
        let record = match record {
            Some(record_id) => json!({ "data": { "id": record_id, "attributes": {} } }),
            None => json!({ "data": null }),
        };
        json!({
            "data": [{
                "id": id,
                "attributes": {
                    "status": status,
                    "appointment_date": "2023-08-12T02:10:00.000Z",
                    "registration_date": "2023-08-12T02:10:00.000Z",
                    "patient": { "data": { "id": 3, "attributes": { "name": "Budi Santoso" } } },
                    "doctor": { "data": { "id": 4, "attributes": { "name": "dr. Sari" } } },
                    "patient_record": record
                }
            }],
            "meta": {}
        })
    }

    fn visit_entity_body(id: u64, status: &str) -> serde_json::Value {
        json!({
            "data": { "id": id, "attributes": { "status": status } },
            "meta": {}
        })
    }

    async fn mock_visit_fetch(server: &MockServer, body: serde_json::Value, times: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path("/api/outpatients"))
            .and(query_param("filters[id][$eq]", "12"))
            .and(query_param("filters[organization][id][$eq]", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body));
        match times {
            Some(n) => mock.up_to_n_times(n).mount(server).await,
            None => mock.mount(server).await,
        }
    }

    #[tokio::test]
    async fn test_enqueue_stamps_scope_status_and_both_timestamps() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/outpatients"))
            .and(body_partial_json(json!({
                "data": { "patient": 3, "doctor": 4, "polyclinic": 5, "organization": 7, "status": "in_queue" }
            })))
            .and(body_string_contains("appointment_date"))
            .and(body_string_contains("registration_date"))
            .respond_with(ResponseTemplate::new(200).set_body_json(visit_entity_body(12, "in_queue")))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let created = service
            .enqueue(
                &test_ctx(),
                EnqueueVisit {
                    patient: 3,
                    doctor: 4,
                    polyclinic: 5,
                },
            )
            .await
            .expect("enqueue should succeed");
        assert_eq!(created.id, 12);
        assert_eq!(created.attributes.status, VisitStatus::InQueue);
    }

    #[tokio::test]
    async fn test_cancel_from_queue_sets_canceled_by_admin() {
        let server = MockServer::start().await;
        mock_visit_fetch(&server, visit_list_body(12, "in_queue", None), None).await;
        Mock::given(method("PUT"))
            .and(path("/api/outpatients/12"))
            .and(body_partial_json(json!({ "data": { "status": "canceled_by_admin" } })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(visit_entity_body(12, "canceled_by_admin")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let updated = service
            .cancel(&test_ctx(), 12)
            .await
            .expect("cancel from queue should succeed");
        assert_eq!(updated.attributes.status, VisitStatus::CanceledByAdmin);
    }

    #[tokio::test]
    async fn test_cancel_of_an_in_progress_visit_writes_nothing() {
        let server = MockServer::start().await;
        mock_visit_fetch(&server, visit_list_body(12, "in_progress", Some(55)), None).await;
        Mock::given(method("PUT"))
            .and(path("/api/outpatients/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(visit_entity_body(12, "in_progress")))
            .expect(0)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let err = service
            .cancel(&test_ctx(), 12)
            .await
            .expect_err("cancel should be rejected");
        assert!(matches!(
            err,
            ClinicError::InvalidTransition {
                status: VisitStatus::InProgress,
                event: VisitEvent::Cancel,
            }
        ));
    }

    #[tokio::test]
    async fn test_start_processing_creates_and_attaches_a_record() {
        let server = MockServer::start().await;
        mock_visit_fetch(&server, visit_list_body(12, "in_queue", None), None).await;
        Mock::given(method("POST"))
            .and(path("/api/patient-records"))
            .and(body_partial_json(json!({
                "data": { "patient": 3, "doctor": 4, "organization": 7 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 55, "attributes": {} },
                "meta": {}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/outpatients/12"))
            .and(body_partial_json(json!({ "data": { "patient_record": 55 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(visit_entity_body(12, "in_queue")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/outpatients/12"))
            .and(body_partial_json(json!({ "data": { "status": "in_progress" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(visit_entity_body(12, "in_progress")))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let updated = service
            .start_processing(&test_ctx(), 12)
            .await
            .expect("start should succeed");
        assert_eq!(updated.attributes.status, VisitStatus::InProgress);
    }

    #[tokio::test]
    async fn test_ensure_record_returns_the_attached_id_without_creating() {
        let server = MockServer::start().await;
        mock_visit_fetch(&server, visit_list_body(12, "in_progress", Some(55)), None).await;
        Mock::given(method("POST"))
            .and(path("/api/patient-records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 99, "attributes": {} },
                "meta": {}
            })))
            .expect(0)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let record_id = service
            .ensure_record(&test_ctx(), 12)
            .await
            .expect("ensure should succeed");
        assert_eq!(record_id, 55);
    }

    #[tokio::test]
    async fn test_ensure_record_twice_creates_exactly_one_record() {
        let server = MockServer::start().await;
        // First fetch sees no record; every later fetch sees the attached one.
        mock_visit_fetch(&server, visit_list_body(12, "in_queue", None), Some(1)).await;
        mock_visit_fetch(&server, visit_list_body(12, "in_queue", Some(55)), None).await;
        Mock::given(method("POST"))
            .and(path("/api/patient-records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 55, "attributes": {} },
                "meta": {}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/outpatients/12"))
            .and(body_partial_json(json!({ "data": { "patient_record": 55 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(visit_entity_body(12, "in_queue")))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let first = service
            .ensure_record(&test_ctx(), 12)
            .await
            .expect("first ensure should succeed");
        let second = service
            .ensure_record(&test_ctx(), 12)
            .await
            .expect("second ensure should succeed");
        assert_eq!(first, 55);
        assert_eq!(second, 55);
    }

    #[tokio::test]
    async fn test_advance_to_payment_follows_the_payment_path() {
        let server = MockServer::start().await;
        mock_visit_fetch(&server, visit_list_body(12, "in_progress", Some(55)), None).await;
        Mock::given(method("PUT"))
            .and(path("/api/outpatients/12"))
            .and(body_partial_json(json!({ "data": { "status": "waiting_for_payment" } })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(visit_entity_body(12, "waiting_for_payment")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let updated = service
            .advance_to_payment(&test_ctx(), 12)
            .await
            .expect("advance should succeed");
        assert_eq!(updated.attributes.status, VisitStatus::WaitingForPayment);
    }

    #[tokio::test]
    async fn test_list_pushes_search_status_sort_and_names_population() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/outpatients"))
            .and(query_param("filters[$or][0][doctor][name][$contains]", "sari"))
            .and(query_param("filters[$or][1][patient][name][$contains]", "sari"))
            .and(query_param("filters[status]", "in_queue"))
            .and(query_param("filters[organization][id][$eq]", "7"))
            .and(query_param("pagination[page]", "2"))
            .and(query_param("pagination[pageSize]", "10"))
            .and(query_param("sort[0]", "appointment_date:desc"))
            .and(query_param("populate[patient][fields][0]", "name"))
            .and(query_param("populate[doctor][fields][0]", "name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [],
                "meta": { "pagination": { "page": 2, "pageSize": 10, "pageCount": 0, "total": 0 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let listed = service
            .list(
                &test_ctx(),
                VisitFilter {
                    search: Some("sari".to_string()),
                    status: Some(VisitStatus::InQueue),
                    page: 2,
                },
            )
            .await
            .expect("list should succeed");
        assert!(listed.data.is_empty());
    }
}
