//! Reference catalog lookups: polyclinics, doctors, inventory items and
//! medical treatments.
//!
//! Text search over the item catalogs happens client-side on the fetched
//! page, matching how the pickers behave; only structural filters (type,
//! polyclinic) are pushed down to the store.

use std::sync::Arc;

use serde_json::json;

use klinik_types::{
    DoctorFields, Entry, InventoryFields, InventoryType, MedicalTreatmentFields, PolyclinicFields,
};

use crate::aggregate::filter_catalog;
use crate::context::RequestContext;
use crate::error::ClinicResult;
use crate::store::client::collections;
use crate::store::{Query, RecordStoreClient};

pub struct CatalogService {
    client: Arc<RecordStoreClient>,
}

impl CatalogService {
    pub fn new(client: Arc<RecordStoreClient>) -> Self {
        Self { client }
    }

    pub async fn polyclinics(&self, ctx: &RequestContext) -> ClinicResult<Vec<Entry<PolyclinicFields>>> {
        let listed = self
            .client
            .list(ctx, collections::POLYCLINICS, Query::new())
            .await?;
        Ok(listed.data)
    }

    /// Doctors in the organization, optionally narrowed to one polyclinic.
    pub async fn doctors(
        &self,
        ctx: &RequestContext,
        polyclinic_id: Option<u64>,
    ) -> ClinicResult<Vec<Entry<DoctorFields>>> {
        let mut query = Query::new();
        if let Some(id) = polyclinic_id {
            query = query.filter("polyclinic", json!({ "id": { "$eq": id } }));
        }
        let listed = self.client.list(ctx, collections::DOCTORS, query).await?;
        Ok(listed.data)
    }

    /// Inventory items, optionally narrowed by type, then filtered by the
    /// search term on this side.
    pub async fn inventories(
        &self,
        ctx: &RequestContext,
        kind: Option<InventoryType>,
        search: &str,
    ) -> ClinicResult<Vec<Entry<InventoryFields>>> {
        let mut query = Query::new();
        if let Some(kind) = kind {
            query = query.filter("inventory_type", json!(kind));
        }
        let listed = self
            .client
            .list(ctx, collections::INVENTORIES, query)
            .await?;
        Ok(filter_catalog(search, listed.data))
    }

    pub async fn treatments(
        &self,
        ctx: &RequestContext,
        search: &str,
    ) -> ClinicResult<Vec<Entry<MedicalTreatmentFields>>> {
        let listed = self
            .client
            .list(ctx, collections::MEDICAL_TREATMENTS, Query::new())
            .await?;
        Ok(filter_catalog(search, listed.data))
    }
}
