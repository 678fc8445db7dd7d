//! Attribute shapes for the Record Store collections.
//!
//! Field names mirror the store schema exactly. Relation fields only carry
//! data when the issuing query asked for them to be populated, so they all
//! default to empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::{Relation, RelationList};

/// Patient gender, spelled the way the store stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Others,
}

/// Inventory classification, separating drugs from medical supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InventoryType {
    Drugs,
    MedSupplies,
}

/// Lifecycle status of an outpatient visit.
///
/// `Done` and `CanceledByAdmin` are terminal. Which events may move a visit
/// between the remaining states is enforced by `klinik-core`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    InQueue,
    InProgress,
    WaitingForPayment,
    Done,
    CanceledByAdmin,
}

impl VisitStatus {
    /// The wire token the store persists for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::InQueue => "in_queue",
            VisitStatus::InProgress => "in_progress",
            VisitStatus::WaitingForPayment => "waiting_for_payment",
            VisitStatus::Done => "done",
            VisitStatus::CanceledByAdmin => "canceled_by_admin",
        }
    }

    /// Terminal statuses accept no further events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VisitStatus::Done | VisitStatus::CanceledByAdmin)
    }
}

impl std::fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VisitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_queue" => Ok(VisitStatus::InQueue),
            "in_progress" => Ok(VisitStatus::InProgress),
            "waiting_for_payment" => Ok(VisitStatus::WaitingForPayment),
            "done" => Ok(VisitStatus::Done),
            "canceled_by_admin" => Ok(VisitStatus::CanceledByAdmin),
            other => Err(format!("unknown visit status: {other}")),
        }
    }
}

/// Patient demographics. `rm_id` is the clinic's medical-record number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientFields {
    pub name: String,
    pub rm_id: Option<String>,
    pub dob: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorFields {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyclinicFields {
    pub name: String,
    pub description: Option<String>,
}

/// One stockable item. `price` is the current catalog price, not a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryFields {
    pub name: String,
    pub description: Option<String>,
    pub unit_in_stock: Option<i64>,
    pub qty_per_unit: Option<String>,
    pub inventory_type: Option<InventoryType>,
    pub price: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalTreatmentFields {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<i64>,
}

/// One outpatient visit. `created_at` backs the queue display when the
/// appointment timestamp is missing on older documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutpatientFields {
    pub status: VisitStatus,
    pub appointment_date: Option<DateTime<Utc>>,
    pub registration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub patient: Relation<PatientFields>,
    #[serde(default)]
    pub doctor: Relation<DoctorFields>,
    #[serde(default)]
    pub polyclinic: Relation<PolyclinicFields>,
    #[serde(default)]
    pub patient_record: Relation<PatientRecordFields>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The clinical document for one visit: vitals, SOAP note, free-text notes
/// and the two billable line collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecordFields {
    pub blood_pressure: Option<String>,
    pub pulse: Option<f64>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub saturation: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    pub drug_recipe_note: Option<String>,
    pub medical_treatment_note: Option<String>,
    #[serde(default)]
    pub patient: Relation<PatientFields>,
    #[serde(default)]
    pub doctor: Relation<DoctorFields>,
    #[serde(default)]
    pub patient_record_inventories: RelationList<DrugLineFields>,
    #[serde(default)]
    pub patient_record_medical_treatments: RelationList<TreatmentLineFields>,
}

/// A drug-recipe line. `price` is the unit price snapshotted when the line
/// was added; the line total is always recomputed, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrugLineFields {
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub price: i64,
    pub description: Option<String>,
    #[serde(default)]
    pub inventory: Relation<InventoryFields>,
}

/// A treatment line, same snapshot semantics as [`DrugLineFields`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreatmentLineFields {
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub price: i64,
    pub description: Option<String>,
    #[serde(default)]
    pub medical_treatment: Relation<MedicalTreatmentFields>,
}

/// Organization block attached to an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OrganizationRef {
    pub id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Account shape returned by the store's own-account endpoint.
///
/// Unlike entity reads this arrives flat, without the entry envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Account {
    pub id: u64,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub organization: Option<OrganizationRef>,
}

/// Successful local-login response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub jwt: String,
    pub user: Account,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_tokens_round_trip() {
        let all = [
            VisitStatus::InQueue,
            VisitStatus::InProgress,
            VisitStatus::WaitingForPayment,
            VisitStatus::Done,
            VisitStatus::CanceledByAdmin,
        ];
        for status in all {
            let token = serde_json::to_string(&status).expect("status should serialize");
            assert_eq!(token, format!("\"{}\"", status.as_str()));
            let parsed: VisitStatus =
                token.trim_matches('"').parse().expect("token should parse back");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_rejects_unknown_token() {
        let err = "archived".parse::<VisitStatus>().expect_err("should reject");
        assert!(err.contains("archived"));
    }

    #[test]
    fn test_only_done_and_canceled_are_terminal() {
        assert!(VisitStatus::Done.is_terminal());
        assert!(VisitStatus::CanceledByAdmin.is_terminal());
        assert!(!VisitStatus::InQueue.is_terminal());
        assert!(!VisitStatus::InProgress.is_terminal());
        assert!(!VisitStatus::WaitingForPayment.is_terminal());
    }

    #[test]
    fn test_enum_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&Gender::Others).expect("gender should serialize"),
            "\"others\""
        );
        assert_eq!(
            serde_json::to_string(&InventoryType::MedSupplies)
                .expect("inventory type should serialize"),
            "\"med_supplies\""
        );
    }

    #[test]
    fn test_patient_fields_tolerate_missing_optionals() {
        let parsed: PatientFields =
            serde_json::from_str(r#"{ "name": "Siti Rahma" }"#).expect("should parse");
        assert_eq!(parsed.name, "Siti Rahma");
        assert_eq!(parsed.rm_id, None);
        assert_eq!(parsed.gender, None);
    }
}
