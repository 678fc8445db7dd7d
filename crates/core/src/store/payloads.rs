//! Write payloads for Record Store mutations.
//!
//! Writes reference relations by numeric id and omit unset fields, so the
//! store only touches the keys present in the body. The service layer
//! stamps the organization on every create; patches never carry it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use klinik_types::{Gender, VisitStatus};

/// New patient document.
#[derive(Debug, Clone, Serialize)]
pub struct NewPatient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rm_id: Option<String>,
    pub dob: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub organization: u64,
}

/// Patch for an existing patient; only set keys are written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatientPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rm_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

/// New visit enqueued by the admin desk.
#[derive(Debug, Clone, Serialize)]
pub struct NewVisit {
    pub patient: u64,
    pub doctor: u64,
    pub polyclinic: u64,
    pub organization: u64,
    pub status: VisitStatus,
    pub appointment_date: DateTime<Utc>,
    pub registration_date: DateTime<Utc>,
}

/// Status-only visit update, written after a transition was validated.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPatch {
    pub status: VisitStatus,
}

/// Attaches a freshly created record to its visit.
#[derive(Debug, Clone, Serialize)]
pub struct RecordRefPatch {
    pub patient_record: u64,
}

/// Empty clinical document, created the first time a visit leaves the
/// queue or clinical data is first saved.
#[derive(Debug, Clone, Serialize)]
pub struct NewRecord {
    pub patient: u64,
    pub doctor: u64,
    pub organization: u64,
}

/// Vitals step fields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VitalsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// SOAP step fields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SoapPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

/// The two free-text notes; either or both may be written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drug_recipe_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_treatment_note: Option<String>,
}

/// New drug-recipe line; `price` is the unit-price snapshot at add time.
#[derive(Debug, Clone, Serialize)]
pub struct NewDrugLine {
    pub inventory: u64,
    pub patient_record: u64,
    pub patient: u64,
    pub doctor: u64,
    pub organization: u64,
    pub qty: u32,
    pub price: i64,
    pub description: String,
}

/// New treatment line, same snapshot semantics as [`NewDrugLine`].
#[derive(Debug, Clone, Serialize)]
pub struct NewTreatmentLine {
    pub medical_treatment: u64,
    pub patient_record: u64,
    pub patient: u64,
    pub doctor: u64,
    pub organization: u64,
    pub qty: u32,
    pub price: i64,
    pub description: String,
}

/// Line patch. The price snapshot is only rewritten when explicitly
/// provided; changing the quantity alone never touches it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patches_omit_unset_fields() {
        let patch = LinePatch {
            qty: Some(5),
            ..LinePatch::default()
        };
        let body = serde_json::to_value(&patch).expect("patch should serialize");
        assert_eq!(body, serde_json::json!({ "qty": 5 }));
    }

    #[test]
    fn test_new_visit_serializes_status_token_and_relations_by_id() {
        let now = "2023-08-12T02:10:00Z".parse().expect("valid timestamp");
        let body = serde_json::to_value(NewVisit {
            patient: 3,
            doctor: 4,
            polyclinic: 5,
            organization: 7,
            status: VisitStatus::InQueue,
            appointment_date: now,
            registration_date: now,
        })
        .expect("visit should serialize");
        assert_eq!(body["status"], "in_queue");
        assert_eq!(body["patient"], 3);
        assert_eq!(body["organization"], 7);
    }
}
