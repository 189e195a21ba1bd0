//! Formulary drug records.

use crate::{DoseSpec, NonEmptyText, RenalAdjustment};
use serde::Serialize;

/// A named dose rule within a drug record (`"childHSV"`, `"iv"`, ...).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DoseEntry {
    pub key: String,
    pub spec: DoseSpec,
}

/// One immutable formulary entry.
///
/// Records are loaded once from the dataset and shared read-only; nothing in the engine mutates
/// them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrugRecord {
    /// Stable identifier, e.g. `acyclovir`.
    pub id: NonEmptyText,
    pub name: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Free-text maximum for the drug as a whole, e.g. "4 g/day" or "See protocol".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub doses: Vec<DoseEntry>,
    pub renal_adjustment: RenalAdjustment,
}

impl DrugRecord {
    pub fn dose(&self, key: &str) -> Option<&DoseSpec> {
        self.doses
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.spec)
    }
}
