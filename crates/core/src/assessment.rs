//! Per-drug assessment for one patient.
//!
//! Runs the whole calculation for a single drug: one eGFR estimate, a dose suggestion for every
//! dose rule, and the renal adjustment resolved against the patient's band.

use crate::adjustment::{resolve_renal_adjustment, ResolvedAdjustment};
use crate::dose::{calculate_dose_with_cap, parse_max_text, DoseResult, DoseSchedule};
use crate::renal::{estimate_gfr, GfrResult, PatientRenalParameters};
use peds_types::{DoseEntry, DoseKind, DrugRecord};
use serde::Serialize;

/// Calculated output for one dose rule.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DoseSuggestion {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub kind: DoseKind,
    /// `None` when the rule is fixed, a rate, unparsable, or the weight is missing.
    pub result: Option<DoseResult>,
    /// The cap that was in force, from the rule or the drug-level maximum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_max: Option<f64>,
    pub schedule: DoseSchedule,
    /// One administration of a divided daily dose.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_dose: Option<f64>,
}

impl DoseSuggestion {
    pub fn below_min_dose(&self) -> bool {
        self.result.is_some_and(|result| result.below_min_dose())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrugAssessment {
    pub drug_id: String,
    pub drug_name: String,
    pub gfr: GfrResult,
    pub doses: Vec<DoseSuggestion>,
    pub renal: ResolvedAdjustment,
}

/// Assesses `drug` for the patient described by `params`.
pub fn assess_drug(params: &PatientRenalParameters, drug: &DrugRecord) -> DrugAssessment {
    let gfr = estimate_gfr(params);

    let doses = drug
        .doses
        .iter()
        .map(|entry| suggest_dose(params.weight_kg, drug, entry))
        .collect();

    DrugAssessment {
        drug_id: drug.id.to_string(),
        drug_name: drug.name.to_string(),
        gfr,
        doses,
        renal: resolve_renal_adjustment(&drug.renal_adjustment, gfr.band),
    }
}

fn suggest_dose(weight_kg: f64, drug: &DrugRecord, entry: &DoseEntry) -> DoseSuggestion {
    let spec = &entry.spec;

    // Drug-level maximum text is milligram-denominated; only apply it to milligram rules.
    let effective_max = spec.max_dose.or_else(|| {
        if !spec.unit.contains("mg") {
            return None;
        }
        drug.max_text
            .as_deref()
            .and_then(|text| parse_max_text(text, weight_kg))
    });

    let result = calculate_dose_with_cap(weight_kg, spec, effective_max);
    let schedule = DoseSchedule::from_unit(&spec.unit);
    let per_dose = result.and_then(|result| schedule.per_dose_amount(result.dose_mg));

    DoseSuggestion {
        key: entry.key.clone(),
        label: spec.label.clone(),
        unit: spec.unit.clone(),
        kind: spec.kind,
        result,
        effective_max,
        schedule,
        per_dose,
    }
}
