//! Patient directory operations.
//!
//! Registration, lookup, paginated search over name and medical-record
//! number, and a patient's visit history. All reads carry the caller's
//! organization scope; created patients are stamped with it.

use std::sync::Arc;

use serde_json::json;

use klinik_types::{Entry, Gender, ListResponse, NonEmptyText, OutpatientFields, PatientFields};

use crate::config::CoreConfig;
use crate::context::RequestContext;
use crate::error::{ClinicError, ClinicResult};
use crate::store::client::collections;
use crate::store::payloads::{NewPatient, PatientPatch};
use crate::store::{Query, RecordStoreClient};

/// Registration input; name and date of birth are required.
#[derive(Debug, Clone)]
pub struct RegisterPatient {
    pub name: String,
    pub dob: String,
    pub rm_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
}

/// Partial update; unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePatient {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub rm_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
}

pub struct PatientService {
    client: Arc<RecordStoreClient>,
    cfg: Arc<CoreConfig>,
}

impl PatientService {
    pub fn new(client: Arc<RecordStoreClient>, cfg: Arc<CoreConfig>) -> Self {
        Self { client, cfg }
    }

    /// Creates a patient in the caller's organization.
    pub async fn register(
        &self,
        ctx: &RequestContext,
        input: RegisterPatient,
    ) -> ClinicResult<Entry<PatientFields>> {
        let name = NonEmptyText::new(&input.name)
            .map_err(|_| ClinicError::InvalidInput("patient name is required".into()))?;
        let dob = NonEmptyText::new(&input.dob)
            .map_err(|_| ClinicError::InvalidInput("patient date of birth is required".into()))?;

        let payload = NewPatient {
            name: name.into_inner(),
            rm_id: input.rm_id,
            dob: dob.into_inner(),
            address: input.address,
            phone: input.phone,
            gender: input.gender,
            organization: ctx.organization_id,
        };
        let created = self
            .client
            .create(ctx, collections::PATIENTS, &payload)
            .await?;
        Ok(created.data)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        patient_id: u64,
        input: UpdatePatient,
    ) -> ClinicResult<Entry<PatientFields>> {
        if let Some(name) = &input.name {
            NonEmptyText::new(name)
                .map_err(|_| ClinicError::InvalidInput("patient name cannot be blank".into()))?;
        }

        let payload = PatientPatch {
            name: input.name,
            rm_id: input.rm_id,
            dob: input.dob,
            address: input.address,
            phone: input.phone,
            gender: input.gender,
        };
        let updated = self
            .client
            .update(ctx, collections::PATIENTS, patient_id, &payload)
            .await?;
        Ok(updated.data)
    }

    pub async fn remove(&self, ctx: &RequestContext, patient_id: u64) -> ClinicResult<()> {
        self.client
            .delete(ctx, collections::PATIENTS, patient_id)
            .await
    }

    pub async fn find(
        &self,
        ctx: &RequestContext,
        patient_id: u64,
    ) -> ClinicResult<Entry<PatientFields>> {
        self.client
            .fetch_one(ctx, collections::PATIENTS, patient_id, Query::new())
            .await
    }

    /// Paginated directory listing. A search term matches name or
    /// medical-record number by case-insensitive substring.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        search: Option<&str>,
        page: u32,
    ) -> ClinicResult<ListResponse<PatientFields>> {
        let mut query = Query::new().paginate(page.max(1), self.cfg.page_size());
        if let Some(term) = search.map(str::trim).filter(|term| !term.is_empty()) {
            query = query.filter(
                "$or",
                json!([
                    { "name": { "$contains": term } },
                    { "rm_id": { "$contains": term } },
                ]),
            );
        }
        self.client.list(ctx, collections::PATIENTS, query).await
    }

    /// The patient's visits, most recent appointment first, with doctor and
    /// polyclinic populated for display.
    pub async fn visit_history(
        &self,
        ctx: &RequestContext,
        patient_id: u64,
        page: u32,
    ) -> ClinicResult<ListResponse<OutpatientFields>> {
        let query = Query::new()
            .paginate(page.max(1), self.cfg.page_size())
            .filter("patient", json!({ "id": { "$eq": patient_id } }))
            .populate(json!({ "doctor": "*", "polyclinic": "*" }))
            .sort("appointment_date:desc");
        self.client.list(ctx, collections::OUTPATIENTS, query).await
    }
}
