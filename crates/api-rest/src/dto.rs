//! Wire DTOs for the REST surface.
//!
//! Core entities arrive as Record Store entries (`{ id, attributes }` with
//! populated relations); these types flatten them into the shapes the REST
//! clients consume, with timestamps as RFC 3339 strings and derived values
//! (BMI, line totals, IDR-formatted amounts) computed on the way out.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use klinik_core::aggregate::{self, Invoice, InvoiceLine};
use klinik_core::format::format_idr;
use klinik_types::{
    Account, DoctorFields, DrugLineFields, Entry, Gender, InventoryFields, InventoryType,
    ListResponse, MedicalTreatmentFields, OutpatientFields, Pagination, PatientFields,
    PatientRecordFields, PolyclinicFields, TreatmentLineFields, VisitStatus,
};

// ============================================================================
// GENERAL
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthDto {
    pub ok: bool,
    pub message: String,
}

/// Acknowledgement for mutations that return no entity.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AckDto {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    /// Validation detail object passed through from the Record Store.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }
}

// ============================================================================
// AUTH
// ============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginReq {
    /// Username or email, as accepted by the store's local auth.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginDto {
    pub jwt: String,
    pub account: Account,
}

// ============================================================================
// PATIENTS
// ============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterPatientReq {
    pub name: String,
    /// Date of birth, `YYYY-MM-DD`.
    pub dob: String,
    pub rm_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub rm_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatientDto {
    pub id: u64,
    pub rm_id: Option<String>,
    pub name: String,
    pub dob: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
}

impl From<Entry<PatientFields>> for PatientDto {
    fn from(entry: Entry<PatientFields>) -> Self {
        let fields = entry.attributes;
        Self {
            id: entry.id,
            rm_id: fields.rm_id,
            name: fields.name,
            dob: fields.dob,
            address: fields.address,
            phone: fields.phone,
            gender: fields.gender,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatientListDto {
    pub data: Vec<PatientDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl From<ListResponse<PatientFields>> for PatientListDto {
    fn from(list: ListResponse<PatientFields>) -> Self {
        Self {
            data: list.data.into_iter().map(PatientDto::from).collect(),
            pagination: list.meta.pagination,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientListParams {
    /// Substring matched against patient names and RM numbers.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<u32>,
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PolyclinicDto {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
}

impl From<Entry<PolyclinicFields>> for PolyclinicDto {
    fn from(entry: Entry<PolyclinicFields>) -> Self {
        Self {
            id: entry.id,
            name: entry.attributes.name,
            description: entry.attributes.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DoctorDto {
    pub id: u64,
    pub name: String,
}

impl From<Entry<DoctorFields>> for DoctorDto {
    fn from(entry: Entry<DoctorFields>) -> Self {
        Self {
            id: entry.id,
            name: entry.attributes.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryDto {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub unit_in_stock: Option<i64>,
    pub qty_per_unit: Option<String>,
    pub inventory_type: Option<InventoryType>,
    pub price: Option<i64>,
}

impl From<Entry<InventoryFields>> for InventoryDto {
    fn from(entry: Entry<InventoryFields>) -> Self {
        let fields = entry.attributes;
        Self {
            id: entry.id,
            name: fields.name,
            description: fields.description,
            unit_in_stock: fields.unit_in_stock,
            qty_per_unit: fields.qty_per_unit,
            inventory_type: fields.inventory_type,
            price: fields.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TreatmentDto {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<i64>,
}

impl From<Entry<MedicalTreatmentFields>> for TreatmentDto {
    fn from(entry: Entry<MedicalTreatmentFields>) -> Self {
        let fields = entry.attributes;
        Self {
            id: entry.id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DoctorParams {
    /// Restrict to one polyclinic.
    pub polyclinic: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryParams {
    pub kind: Option<InventoryType>,
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    pub search: Option<String>,
}

// ============================================================================
// VISITS
// ============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnqueueVisitReq {
    pub patient: u64,
    pub doctor: u64,
    pub polyclinic: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisitListParams {
    /// Substring matched against patient and doctor names.
    pub search: Option<String>,
    pub status: Option<VisitStatus>,
    pub page: Option<u32>,
}

/// Queue row: ids and names, no clinical payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitSummaryDto {
    pub id: u64,
    pub status: VisitStatus,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub appointment_date: Option<String>,
    pub registration_date: Option<String>,
}

impl From<Entry<OutpatientFields>> for VisitSummaryDto {
    fn from(entry: Entry<OutpatientFields>) -> Self {
        let attrs = &entry.attributes;
        Self {
            id: entry.id,
            status: attrs.status,
            patient_name: attrs
                .patient
                .entry()
                .map(|patient| patient.attributes.name.clone()),
            doctor_name: attrs
                .doctor
                .entry()
                .map(|doctor| doctor.attributes.name.clone()),
            // Older documents predate the appointment timestamp; fall back
            // to the store's creation time for display.
            appointment_date: attrs
                .appointment_date
                .or(attrs.created_at)
                .map(|ts| ts.to_rfc3339()),
            registration_date: attrs.registration_date.map(|ts| ts.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitListDto {
    pub data: Vec<VisitSummaryDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl From<ListResponse<OutpatientFields>> for VisitListDto {
    fn from(list: ListResponse<OutpatientFields>) -> Self {
        Self {
            data: list.data.into_iter().map(VisitSummaryDto::from).collect(),
            pagination: list.meta.pagination,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitDetailDto {
    pub id: u64,
    pub status: VisitStatus,
    pub appointment_date: Option<String>,
    pub registration_date: Option<String>,
    pub patient: Option<PatientDto>,
    pub doctor: Option<DoctorDto>,
    pub polyclinic: Option<PolyclinicDto>,
    pub record: Option<RecordDto>,
}

impl From<Entry<OutpatientFields>> for VisitDetailDto {
    fn from(entry: Entry<OutpatientFields>) -> Self {
        let attrs = &entry.attributes;
        Self {
            id: entry.id,
            status: attrs.status,
            appointment_date: attrs
                .appointment_date
                .or(attrs.created_at)
                .map(|ts| ts.to_rfc3339()),
            registration_date: attrs.registration_date.map(|ts| ts.to_rfc3339()),
            patient: attrs.patient.entry().cloned().map(PatientDto::from),
            doctor: attrs.doctor.entry().cloned().map(DoctorDto::from),
            polyclinic: attrs.polyclinic.entry().cloned().map(PolyclinicDto::from),
            record: attrs.patient_record.entry().cloned().map(RecordDto::from),
        }
    }
}

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct VitalsReq {
    pub blood_pressure: Option<String>,
    pub pulse: Option<f64>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub saturation: Option<f64>,
    /// Centimetres.
    pub height: Option<f64>,
    /// Kilograms.
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SoapReq {
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NotesReq {
    pub drug_recipe_note: Option<String>,
    pub medical_treatment_note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewDrugLineReq {
    pub visit: u64,
    pub inventory: u64,
    /// Defaults to 1.
    pub qty: Option<u32>,
    /// Unit price copied from the catalog at add time.
    pub price: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewTreatmentLineReq {
    pub visit: u64,
    pub treatment: u64,
    pub qty: Option<u32>,
    pub price: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LineUpdateReq {
    pub qty: Option<u32>,
    pub price: Option<i64>,
    pub description: Option<String>,
}

/// One line item on a record, with its billed total.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LineDto {
    pub id: u64,
    pub catalog_id: Option<u64>,
    pub label: String,
    pub qty: u32,
    pub unit_price: i64,
    pub total: i64,
    pub description: Option<String>,
}

impl LineDto {
    pub(crate) fn from_drug(line: &Entry<DrugLineFields>) -> Self {
        let attrs = &line.attributes;
        Self {
            id: line.id,
            catalog_id: attrs.inventory.id(),
            label: attrs
                .inventory
                .entry()
                .map(|item| item.attributes.name.clone())
                .or_else(|| attrs.description.clone())
                .unwrap_or_default(),
            qty: attrs.qty,
            unit_price: attrs.price,
            total: aggregate::line_total(attrs.qty, attrs.price),
            description: attrs.description.clone(),
        }
    }

    pub(crate) fn from_treatment(line: &Entry<TreatmentLineFields>) -> Self {
        let attrs = &line.attributes;
        Self {
            id: line.id,
            catalog_id: attrs.medical_treatment.id(),
            label: attrs
                .medical_treatment
                .entry()
                .map(|item| item.attributes.name.clone())
                .or_else(|| attrs.description.clone())
                .unwrap_or_default(),
            qty: attrs.qty,
            unit_price: attrs.price,
            total: aggregate::line_total(attrs.qty, attrs.price),
            description: attrs.description.clone(),
        }
    }
}

/// Clinical record view: vitals with derived BMI, SOAP text, notes and
/// priced line items.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecordDto {
    pub id: u64,
    pub blood_pressure: Option<String>,
    pub pulse: Option<f64>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub saturation: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    /// Derived from height and weight when both are usable.
    pub bmi: Option<f64>,
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    pub drug_recipe_note: Option<String>,
    pub medical_treatment_note: Option<String>,
    pub drug_lines: Vec<LineDto>,
    pub treatment_lines: Vec<LineDto>,
}

impl From<Entry<PatientRecordFields>> for RecordDto {
    fn from(entry: Entry<PatientRecordFields>) -> Self {
        let attrs = entry.attributes;
        let bmi = match (attrs.weight, attrs.height) {
            (Some(weight), Some(height)) => aggregate::bmi(weight, height),
            _ => None,
        };
        let drug_lines = attrs
            .patient_record_inventories
            .data
            .iter()
            .map(LineDto::from_drug)
            .collect();
        let treatment_lines = attrs
            .patient_record_medical_treatments
            .data
            .iter()
            .map(LineDto::from_treatment)
            .collect();
        Self {
            id: entry.id,
            blood_pressure: attrs.blood_pressure,
            pulse: attrs.pulse,
            temperature: attrs.temperature,
            respiratory_rate: attrs.respiratory_rate,
            saturation: attrs.saturation,
            height: attrs.height,
            weight: attrs.weight,
            bmi,
            subjective: attrs.subjective,
            objective: attrs.objective,
            assessment: attrs.assessment,
            plan: attrs.plan,
            drug_recipe_note: attrs.drug_recipe_note,
            medical_treatment_note: attrs.medical_treatment_note,
            drug_lines,
            treatment_lines,
        }
    }
}

// ============================================================================
// INVOICE
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceLineDto {
    pub label: String,
    pub qty: u32,
    pub unit_price: i64,
    pub total: i64,
    /// `total` grouped for display, e.g. `Rp15.000`.
    pub total_idr: String,
}

impl From<InvoiceLine> for InvoiceLineDto {
    fn from(line: InvoiceLine) -> Self {
        let total_idr = format_idr(line.total);
        Self {
            label: line.label,
            qty: line.qty,
            unit_price: line.unit_price,
            total: line.total,
            total_idr,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceDto {
    pub drug_lines: Vec<InvoiceLineDto>,
    pub treatment_lines: Vec<InvoiceLineDto>,
    pub grand_total: i64,
    pub grand_total_idr: String,
}

impl From<Invoice> for InvoiceDto {
    fn from(invoice: Invoice) -> Self {
        let grand_total_idr = format_idr(invoice.grand_total);
        Self {
            drug_lines: invoice
                .drug_lines
                .into_iter()
                .map(InvoiceLineDto::from)
                .collect(),
            treatment_lines: invoice
                .treatment_lines
                .into_iter()
                .map(InvoiceLineDto::from)
                .collect(),
            grand_total: invoice.grand_total,
            grand_total_idr,
        }
    }
}
