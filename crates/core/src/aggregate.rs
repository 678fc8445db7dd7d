//! Derived clinical and billing values.
//!
//! Everything here is pure: the service layer fetches, this module computes.
//! Derived numbers are never written back to the Record Store.

use klinik_types::{Entry, InventoryFields, MedicalTreatmentFields, PatientRecordFields};

/// Body-mass index from weight in kilograms and height in centimetres,
/// rounded to two decimals.
///
/// Height must be a positive finite number; anything else (unset, zero,
/// negative, non-finite) yields `None` rather than a nonsense value. A
/// weight of zero with a valid height yields `Some(0.0)`.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !height_cm.is_finite() || height_cm <= 0.0 || !weight_kg.is_finite() {
        return None;
    }
    let metres = height_cm / 100.0;
    Some((weight_kg / (metres * metres) * 100.0).round() / 100.0)
}

/// A line item's billed amount: quantity times the unit price snapshotted
/// when the line was added. Computed fresh on every read, never stored.
pub fn line_total(qty: u32, unit_price: i64) -> i64 {
    i64::from(qty) * unit_price
}

/// Searchable name/description pair, implemented by the catalog attribute
/// shapes so one filter serves drugs and treatments alike.
pub trait CatalogText {
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
}

impl CatalogText for InventoryFields {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl CatalogText for MedicalTreatmentFields {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Case-insensitive substring filter over name plus description, the way
/// the pickers narrow an already-fetched catalog page. An empty query
/// returns the input unchanged; no store round trip is involved.
pub fn filter_catalog<T: CatalogText>(query: &str, items: Vec<Entry<T>>) -> Vec<Entry<T>> {
    if query.is_empty() {
        return items;
    }
    let needle = query.to_lowercase();
    items
        .into_iter()
        .filter(|entry| {
            let attrs = &entry.attributes;
            let mut haystack = attrs.name().to_string();
            if let Some(description) = attrs.description() {
                haystack.push_str(description);
            }
            haystack.to_lowercase().contains(&needle)
        })
        .collect()
}

/// One billable row on an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    pub label: String,
    pub qty: u32,
    pub unit_price: i64,
    pub total: i64,
}

/// Priced summary of a visit's record: one row per line item plus the
/// grand total across drugs and treatments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub drug_lines: Vec<InvoiceLine>,
    pub treatment_lines: Vec<InvoiceLine>,
    pub grand_total: i64,
}

/// Builds the invoice for a populated record.
///
/// The row label is the referenced catalog item's name; when the reference
/// was not populated the stored line description stands in.
pub fn invoice_for_record(record: &PatientRecordFields) -> Invoice {
    let drug_lines: Vec<InvoiceLine> = record
        .patient_record_inventories
        .data
        .iter()
        .map(|line| {
            let attrs = &line.attributes;
            let label = attrs
                .inventory
                .entry()
                .map(|item| item.attributes.name.clone())
                .or_else(|| attrs.description.clone())
                .unwrap_or_default();
            InvoiceLine {
                label,
                qty: attrs.qty,
                unit_price: attrs.price,
                total: line_total(attrs.qty, attrs.price),
            }
        })
        .collect();

    let treatment_lines: Vec<InvoiceLine> = record
        .patient_record_medical_treatments
        .data
        .iter()
        .map(|line| {
            let attrs = &line.attributes;
            let label = attrs
                .medical_treatment
                .entry()
                .map(|item| item.attributes.name.clone())
                .or_else(|| attrs.description.clone())
                .unwrap_or_default();
            InvoiceLine {
                label,
                qty: attrs.qty,
                unit_price: attrs.price,
                total: line_total(attrs.qty, attrs.price),
            }
        })
        .collect();

    let grand_total = drug_lines.iter().map(|line| line.total).sum::<i64>()
        + treatment_lines.iter().map(|line| line.total).sum::<i64>();

    Invoice {
        drug_lines,
        treatment_lines,
        grand_total,
    }
}
