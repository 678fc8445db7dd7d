//! Clinical documentation on a visit's record: vitals, SOAP notes, the two
//! free-text notes, drug and treatment line items, and the invoice.
//!
//! Every save addresses the record through its visit and runs the
//! ensure-record step first, so the first clinical write on a visit is what
//! lazily creates its record.

use std::sync::Arc;

use klinik_types::{DrugLineFields, Entry, OutpatientFields, PatientRecordFields, TreatmentLineFields};

use crate::aggregate::{self, Invoice};
use crate::context::RequestContext;
use crate::error::{ClinicError, ClinicResult};
use crate::services::visits::{
    ensure_record_for, fetch_visit_for_event, full_population, participant_ids,
};
use crate::store::client::collections;
use crate::store::payloads::{
    LinePatch, NewDrugLine, NewTreatmentLine, NotesPatch, SoapPatch, VitalsPatch,
};
use crate::store::{Query, RecordStoreClient};

/// Vital signs captured when the examination starts. All fields optional;
/// only the provided ones are written.
#[derive(Debug, Clone, Default)]
pub struct VitalsInput {
    pub blood_pressure: Option<String>,
    pub pulse: Option<f64>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub saturation: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct SoapInput {
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
}

/// A new line item. `catalog_id` names the inventory item or treatment;
/// `price` is the unit-price snapshot the caller read from the catalog and
/// is stored on the line as-is.
#[derive(Debug, Clone)]
pub struct NewLineInput {
    pub catalog_id: u64,
    pub qty: Option<u32>,
    pub price: i64,
    pub description: Option<String>,
}

pub struct RecordService {
    client: Arc<RecordStoreClient>,
}

impl RecordService {
    pub fn new(client: Arc<RecordStoreClient>) -> Self {
        Self { client }
    }

    /// The visit together with its record id, creating and attaching an
    /// empty record first when the visit has none.
    async fn record_for_visit(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
    ) -> ClinicResult<(Entry<OutpatientFields>, u64)> {
        let visit = fetch_visit_for_event(&self.client, ctx, visit_id).await?;
        let record_id = ensure_record_for(&self.client, ctx, &visit).await?;
        Ok((visit, record_id))
    }

    pub async fn save_vitals(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
        input: VitalsInput,
    ) -> ClinicResult<Entry<PatientRecordFields>> {
        let (_, record_id) = self.record_for_visit(ctx, visit_id).await?;
        let patch = VitalsPatch {
            blood_pressure: input.blood_pressure,
            pulse: input.pulse,
            temperature: input.temperature,
            respiratory_rate: input.respiratory_rate,
            saturation: input.saturation,
            height: input.height,
            weight: input.weight,
        };
        let updated = self
            .client
            .update(ctx, collections::PATIENT_RECORDS, record_id, &patch)
            .await?;
        Ok(updated.data)
    }

    pub async fn save_soap(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
        input: SoapInput,
    ) -> ClinicResult<Entry<PatientRecordFields>> {
        let (_, record_id) = self.record_for_visit(ctx, visit_id).await?;
        let patch = SoapPatch {
            subjective: input.subjective,
            objective: input.objective,
            assessment: input.assessment,
            plan: input.plan,
        };
        let updated = self
            .client
            .update(ctx, collections::PATIENT_RECORDS, record_id, &patch)
            .await?;
        Ok(updated.data)
    }

    /// Overwrites the free-text drug recipe note.
    pub async fn save_drug_note(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
        note: impl Into<String>,
    ) -> ClinicResult<Entry<PatientRecordFields>> {
        let patch = NotesPatch {
            drug_recipe_note: Some(note.into()),
            medical_treatment_note: None,
        };
        self.save_notes(ctx, visit_id, patch).await
    }

    /// Overwrites the free-text treatment note.
    pub async fn save_treatment_note(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
        note: impl Into<String>,
    ) -> ClinicResult<Entry<PatientRecordFields>> {
        let patch = NotesPatch {
            drug_recipe_note: None,
            medical_treatment_note: Some(note.into()),
        };
        self.save_notes(ctx, visit_id, patch).await
    }

    /// Writes either or both notes in one round trip.
    pub async fn save_notes(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
        patch: NotesPatch,
    ) -> ClinicResult<Entry<PatientRecordFields>> {
        let (_, record_id) = self.record_for_visit(ctx, visit_id).await?;
        let updated = self
            .client
            .update(ctx, collections::PATIENT_RECORDS, record_id, &patch)
            .await?;
        Ok(updated.data)
    }

    // ========================================================================
    // LINE ITEMS
    // ========================================================================

    /// Adds a drug-recipe line. Quantity defaults to 1; the line is stamped
    /// with the visit's patient and doctor and the caller's organization.
    pub async fn add_drug_line(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
        input: NewLineInput,
    ) -> ClinicResult<Entry<DrugLineFields>> {
        check_price(input.price)?;
        let (visit, record_id) = self.record_for_visit(ctx, visit_id).await?;
        let (patient, doctor) = participant_ids(&visit)?;
        let payload = NewDrugLine {
            inventory: input.catalog_id,
            patient_record: record_id,
            patient,
            doctor,
            organization: ctx.organization_id,
            qty: input.qty.unwrap_or(1),
            price: input.price,
            description: input.description.unwrap_or_default(),
        };
        let created = self
            .client
            .create(ctx, collections::DRUG_LINES, &payload)
            .await?;
        Ok(created.data)
    }

    pub async fn update_drug_line(
        &self,
        ctx: &RequestContext,
        line_id: u64,
        patch: LinePatch,
    ) -> ClinicResult<Entry<DrugLineFields>> {
        if let Some(price) = patch.price {
            check_price(price)?;
        }
        let updated = self
            .client
            .update(ctx, collections::DRUG_LINES, line_id, &patch)
            .await?;
        Ok(updated.data)
    }

    pub async fn remove_drug_line(&self, ctx: &RequestContext, line_id: u64) -> ClinicResult<()> {
        self.client.delete(ctx, collections::DRUG_LINES, line_id).await
    }

    /// Adds a treatment line, mirroring [`RecordService::add_drug_line`].
    pub async fn add_treatment_line(
        &self,
        ctx: &RequestContext,
        visit_id: u64,
        input: NewLineInput,
    ) -> ClinicResult<Entry<TreatmentLineFields>> {
        check_price(input.price)?;
        let (visit, record_id) = self.record_for_visit(ctx, visit_id).await?;
        let (patient, doctor) = participant_ids(&visit)?;
        let payload = NewTreatmentLine {
            medical_treatment: input.catalog_id,
            patient_record: record_id,
            patient,
            doctor,
            organization: ctx.organization_id,
            qty: input.qty.unwrap_or(1),
            price: input.price,
            description: input.description.unwrap_or_default(),
        };
        let created = self
            .client
            .create(ctx, collections::TREATMENT_LINES, &payload)
            .await?;
        Ok(created.data)
    }

    pub async fn update_treatment_line(
        &self,
        ctx: &RequestContext,
        line_id: u64,
        patch: LinePatch,
    ) -> ClinicResult<Entry<TreatmentLineFields>> {
        if let Some(price) = patch.price {
            check_price(price)?;
        }
        let updated = self
            .client
            .update(ctx, collections::TREATMENT_LINES, line_id, &patch)
            .await?;
        Ok(updated.data)
    }

    pub async fn remove_treatment_line(
        &self,
        ctx: &RequestContext,
        line_id: u64,
    ) -> ClinicResult<()> {
        self.client
            .delete(ctx, collections::TREATMENT_LINES, line_id)
            .await
    }

    /// The billing summary for a visit, computed from its fully populated
    /// record. A visit that never entered processing has no record and
    /// nothing to bill.
    pub async fn invoice(&self, ctx: &RequestContext, visit_id: u64) -> ClinicResult<Invoice> {
        let visit: Entry<OutpatientFields> = self
            .client
            .fetch_one(
                ctx,
                collections::OUTPATIENTS,
                visit_id,
                Query::new().populate(full_population()),
            )
            .await?;
        let record = visit.attributes.patient_record.entry().ok_or_else(|| {
            ClinicError::NotFound(format!("patient record for visit {visit_id}"))
        })?;
        Ok(aggregate::invoice_for_record(&record.attributes))
    }
}

fn check_price(price: i64) -> ClinicResult<()> {
    if price < 0 {
        return Err(ClinicError::InvalidInput(
            "line price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    fn test_ctx() -> RequestContext {
        RequestContext::new("test-token", 7)
    }

    async fn test_service(server: &MockServer) -> RecordService {
        let client = RecordStoreClient::new(&server.uri()).expect("valid URL");
        RecordService::new(Arc::new(client))
    }

    /// Matches write bodies whose `data` object does not carry the key.
    struct DataLacksKey(&'static str);

    impl Match for DataLacksKey {
        fn matches(&self, request: &Request) -> bool {
            serde_json::from_slice::<serde_json::Value>(&request.body)
                .ok()
                .and_then(|body| body.get("data").cloned())
                .map(|data| data.get(self.0).is_none())
                .unwrap_or(false)
        }
    }

    async fn mock_visit_fetch(server: &MockServer, record: Option<u64>) {
        let record = match record {
            Some(record_id) => json!({ "data": { "id": record_id, "attributes": {} } }),
            None => json!({ "data": null }),
        };
        Mock::given(method("GET"))
            .and(path("/api/outpatients"))
            .and(query_param("filters[id][$eq]", "12"))
            .and(query_param("filters[organization][id][$eq]", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": 12,
                    "attributes": {
                        "status": "in_progress",
                        "patient": { "data": { "id": 3, "attributes": { "name": "Budi Santoso" } } },
                        "doctor": { "data": { "id": 4, "attributes": { "name": "dr. Sari" } } },
                        "patient_record": record
                    }
                }],
                "meta": {}
            })))
            .mount(server)
            .await;
    }

    fn record_entity_body(id: u64, attributes: serde_json::Value) -> serde_json::Value {
        json!({ "data": { "id": id, "attributes": attributes }, "meta": {} })
    }

    #[tokio::test]
    async fn test_save_vitals_creates_the_record_on_first_write() {
        let server = MockServer::start().await;
        mock_visit_fetch(&server, None).await;
        Mock::given(method("POST"))
            .and(path("/api/patient-records"))
            .and(body_partial_json(json!({
                "data": { "patient": 3, "doctor": 4, "organization": 7 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_entity_body(55, json!({}))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/outpatients/12"))
            .and(body_partial_json(json!({ "data": { "patient_record": 55 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 12, "attributes": { "status": "in_progress" } },
                "meta": {}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/patient-records/55"))
            .and(body_partial_json(json!({ "data": { "height": 175.0, "weight": 70.0 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_entity_body(
                55,
                json!({ "height": 175.0, "weight": 70.0 }),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let record = service
            .save_vitals(
                &test_ctx(),
                12,
                VitalsInput {
                    height: Some(175.0),
                    weight: Some(70.0),
                    ..VitalsInput::default()
                },
            )
            .await
            .expect("vitals save should succeed");
        assert_eq!(record.attributes.height, Some(175.0));
    }

    #[tokio::test]
    async fn test_save_soap_writes_only_the_provided_fields() {
        let server = MockServer::start().await;
        mock_visit_fetch(&server, Some(55)).await;
        Mock::given(method("PUT"))
            .and(path("/api/patient-records/55"))
            .and(body_partial_json(json!({ "data": { "subjective": "headache for two days" } })))
            .and(DataLacksKey("objective"))
            .and(DataLacksKey("assessment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_entity_body(
                55,
                json!({ "subjective": "headache for two days" }),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        service
            .save_soap(
                &test_ctx(),
                12,
                SoapInput {
                    subjective: Some("headache for two days".to_string()),
                    ..SoapInput::default()
                },
            )
            .await
            .expect("soap save should succeed");
    }

    #[tokio::test]
    async fn test_save_drug_note_leaves_the_treatment_note_alone() {
        let server = MockServer::start().await;
        mock_visit_fetch(&server, Some(55)).await;
        Mock::given(method("PUT"))
            .and(path("/api/patient-records/55"))
            .and(body_partial_json(json!({ "data": { "drug_recipe_note": "amoxicillin 3x1" } })))
            .and(DataLacksKey("medical_treatment_note"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_entity_body(
                55,
                json!({ "drug_recipe_note": "amoxicillin 3x1" }),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        service
            .save_drug_note(&test_ctx(), 12, "amoxicillin 3x1")
            .await
            .expect("note save should succeed");
    }

    #[tokio::test]
    async fn test_add_drug_line_defaults_qty_and_stamps_ownership() {
        let server = MockServer::start().await;
        mock_visit_fetch(&server, Some(55)).await;
        Mock::given(method("POST"))
            .and(path("/api/patient-record-inventories"))
            .and(body_partial_json(json!({
                "data": {
                    "inventory": 31,
                    "patient_record": 55,
                    "patient": 3,
                    "doctor": 4,
                    "organization": 7,
                    "qty": 1,
                    "price": 5000
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 9, "attributes": { "qty": 1, "price": 5000 } },
                "meta": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let line = service
            .add_drug_line(
                &test_ctx(),
                12,
                NewLineInput {
                    catalog_id: 31,
                    qty: None,
                    price: 5000,
                    description: None,
                },
            )
            .await
            .expect("add line should succeed");
        assert_eq!(line.attributes.qty, 1);
        assert_eq!(line.attributes.price, 5000);
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        let service = test_service(&server).await;

        let err = service
            .add_treatment_line(
                &test_ctx(),
                12,
                NewLineInput {
                    catalog_id: 8,
                    qty: Some(1),
                    price: -500,
                    description: None,
                },
            )
            .await
            .expect_err("negative price should be rejected");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
        let hits = server.received_requests().await.map(|requests| requests.len());
        assert_eq!(hits, Some(0), "no request should reach the store");
    }

    #[tokio::test]
    async fn test_update_line_qty_alone_never_touches_the_price() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/patient-record-inventories/9"))
            .and(body_partial_json(json!({ "data": { "qty": 3 } })))
            .and(DataLacksKey("price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 9, "attributes": { "qty": 3, "price": 5000 } },
                "meta": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let line = service
            .update_drug_line(
                &test_ctx(),
                9,
                LinePatch {
                    qty: Some(3),
                    ..LinePatch::default()
                },
            )
            .await
            .expect("line update should succeed");
        assert_eq!(line.attributes.price, 5000, "snapshot must survive a qty change");
    }

    #[tokio::test]
    async fn test_invoice_sums_lines_from_the_populated_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/outpatients"))
            .and(query_param("filters[id][$eq]", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": 12,
                    "attributes": {
                        "status": "waiting_for_payment",
                        "patient_record": { "data": { "id": 55, "attributes": {
                            "patient_record_inventories": { "data": [
                                { "id": 1, "attributes": {
                                    "qty": 3, "price": 15000,
                                    "inventory": { "data": { "id": 31, "attributes": { "name": "Amoxicillin 500mg" } } }
                                } },
                                { "id": 2, "attributes": {
                                    "qty": 2, "price": 4000,
                                    "inventory": { "data": { "id": 32, "attributes": { "name": "Paracetamol 500mg" } } }
                                } }
                            ] },
                            "patient_record_medical_treatments": { "data": [
                                { "id": 3, "attributes": {
                                    "qty": 1, "price": 30000,
                                    "medical_treatment": { "data": { "id": 8, "attributes": { "name": "Wound dressing" } } }
                                } }
                            ] }
                        } } }
                    }
                }],
                "meta": {}
            })))
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let invoice = service
            .invoice(&test_ctx(), 12)
            .await
            .expect("invoice should succeed");
        assert_eq!(invoice.grand_total, 83_000);
        assert_eq!(invoice.drug_lines[0].label, "Amoxicillin 500mg");
        assert_eq!(invoice.drug_lines[0].total, 45_000);
        assert_eq!(invoice.treatment_lines[0].total, 30_000);
    }

    #[tokio::test]
    async fn test_invoice_without_a_record_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/outpatients"))
            .and(query_param("filters[id][$eq]", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": 12,
                    "attributes": { "status": "in_queue", "patient_record": { "data": null } }
                }],
                "meta": {}
            })))
            .mount(&server)
            .await;

        let service = test_service(&server).await;
        let err = service
            .invoice(&test_ctx(), 12)
            .await
            .expect_err("invoice needs a record");
        assert!(matches!(err, ClinicError::NotFound(_)));
    }
}
