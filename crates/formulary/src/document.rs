//! Formulary document wire model and translation helpers.
//!
//! Responsibilities:
//! - Define a strict wire model for the formulary YAML file
//! - Translate wire entries into `peds-types` domain records
//! - Reject renal adjustments whose shape the resolver cannot interpret
//!
//! Notes:
//! - Dose entries whose unit is a per-time rate are treated as rates even when the file does not
//!   flag them, so they are never multiplied into a total dose
//! - A drug-level `fixed_dose: true` marks every entry of that drug as fixed

use crate::{FormularyError, FormularyResult};
use peds_types::{
    AdjustmentKey, BandedAdjustment, DoseEntry, DoseKind, DoseSpec, DrugRecord, NonEmptyText,
    RenalAdjustment,
};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Public FormularyDocument operations
// ============================================================================

/// Formulary document operations.
///
/// Zero-sized namespace for parsing the dataset; all methods are associated functions.
pub struct FormularyDocument;

impl FormularyDocument {
    /// Parse a formulary from YAML text.
    ///
    /// Schema mismatches are reported with the path of the failing field (for example
    /// `drugs[3].doses[0].max_dose`) via `serde_path_to_error`.
    ///
    /// # Errors
    ///
    /// Returns [`FormularyError`] if:
    /// - the YAML does not match the wire schema or contains unknown keys,
    /// - a drug id or name is blank,
    /// - a dose entry is flagged both fixed and rate,
    /// - a renal adjustment has an unsupported shape.
    pub fn parse(yaml_text: &str) -> FormularyResult<Vec<DrugRecord>> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, FormularyWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FormularyError::Translation(format!(
                    "Formulary schema mismatch at {path}: {source}"
                )));
            }
        };

        wire.drugs.into_iter().map(drug_to_domain).collect()
    }

    /// Read and parse a formulary YAML file.
    pub fn read_file(path: &Path) -> FormularyResult<Vec<DrugRecord>> {
        let text = std::fs::read_to_string(path)?;
        let drugs = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), count = drugs.len(), "parsed formulary file");
        Ok(drugs)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FormularyWire {
    drugs: Vec<DrugWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DrugWire {
    id: String,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    route: Option<String>,
    #[serde(default)]
    max: Option<String>,
    #[serde(default)]
    indication: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    fixed_dose: bool,
    #[serde(default)]
    doses: Vec<DoseWire>,
    /// Kept loose so the shape can be checked explicitly.
    #[serde(default)]
    renal_adjust: serde_yaml::Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DoseWire {
    key: String,
    label: String,
    value: ScalarWire,
    unit: String,
    #[serde(default)]
    is_fixed: bool,
    #[serde(default)]
    is_rate: bool,
    #[serde(default)]
    max_dose: Option<f64>,
    #[serde(default)]
    max_unit: Option<String>,
    #[serde(default)]
    min_dose: Option<f64>,
}

/// Dose values are text in the dataset but authors often write bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScalarWire {
    Text(String),
    Number(f64),
}

impl ScalarWire {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(n) => n.to_string(),
        }
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn drug_to_domain(wire: DrugWire) -> FormularyResult<DrugRecord> {
    let id = NonEmptyText::new(&wire.id)
        .map_err(|_| FormularyError::Translation("drug id cannot be empty".into()))?;
    let name = NonEmptyText::new(&wire.name).map_err(|_| {
        FormularyError::Translation(format!("drug '{id}' has an empty name"))
    })?;

    let doses = wire
        .doses
        .into_iter()
        .map(|dose| dose_to_domain(id.as_str(), wire.fixed_dose, dose))
        .collect::<FormularyResult<Vec<_>>>()?;

    let renal_adjustment = adjustment_to_domain(id.as_str(), wire.renal_adjust)?;

    Ok(DrugRecord {
        id,
        name,
        category: wire.category,
        route: wire.route,
        max_text: wire.max,
        indication: wire.indication,
        notes: wire.notes,
        doses,
        renal_adjustment,
    })
}

fn dose_to_domain(drug_id: &str, drug_fixed: bool, wire: DoseWire) -> FormularyResult<DoseEntry> {
    let mut kind = DoseKind::from_flags(wire.is_fixed, wire.is_rate).map_err(|e| {
        FormularyError::Translation(format!("drug '{drug_id}' dose '{}': {e}", wire.key))
    })?;

    if let Some(max_dose) = wire.max_dose {
        if !(max_dose.is_finite() && max_dose > 0.0) {
            return Err(FormularyError::Translation(format!(
                "drug '{drug_id}' dose '{}': max_dose must be a positive number, found {max_dose}",
                wire.key
            )));
        }
    }
    if let Some(min_dose) = wire.min_dose {
        if !(min_dose.is_finite() && min_dose >= 0.0) {
            return Err(FormularyError::Translation(format!(
                "drug '{drug_id}' dose '{}': min_dose cannot be negative, found {min_dose}",
                wire.key
            )));
        }
    }

    if drug_fixed && kind != DoseKind::Rate {
        kind = DoseKind::Fixed;
    }

    if kind == DoseKind::WeightScaled && DoseKind::unit_describes_rate(&wire.unit) {
        tracing::warn!(
            drug = drug_id,
            dose = %wire.key,
            unit = %wire.unit,
            "dose unit describes a rate; treating entry as a rate"
        );
        kind = DoseKind::Rate;
    }

    Ok(DoseEntry {
        key: wire.key,
        spec: DoseSpec {
            label: wire.label,
            value: wire.value.into_text(),
            unit: wire.unit,
            kind,
            max_dose: wire.max_dose,
            max_unit: wire.max_unit,
            min_dose: wire.min_dose,
        },
    })
}

fn adjustment_to_domain(
    drug_id: &str,
    value: serde_yaml::Value,
) -> FormularyResult<RenalAdjustment> {
    use serde_yaml::Value;

    let invalid = |detail: String| FormularyError::InvalidAdjustmentShape {
        drug_id: drug_id.to_owned(),
        detail,
    };

    match value {
        Value::Null => Ok(RenalAdjustment::NotNeeded),
        Value::String(text) => {
            if text.trim().is_empty() {
                return Err(invalid("free-text adjustment is empty".into()));
            }
            Ok(RenalAdjustment::FreeText(text))
        }
        Value::Mapping(map) => {
            if map.is_empty() {
                return Err(invalid("adjustment mapping has no entries".into()));
            }

            let mut banded = BandedAdjustment::default();
            for (key, text) in map {
                let key_name = key
                    .as_str()
                    .ok_or_else(|| invalid(format!("non-text key {}", value_kind(&key))))?;
                let key = AdjustmentKey::from_wire_name(key_name).ok_or_else(|| {
                    invalid(format!(
                        "unknown key '{key_name}' (expected gfr50, gfr30, gfr10 or hd)"
                    ))
                })?;
                let text = match text {
                    Value::String(text) => text,
                    other => {
                        return Err(invalid(format!(
                            "value for '{key_name}' must be text, found {}",
                            value_kind(&other)
                        )))
                    }
                };
                banded.set(key, text);
            }
            Ok(RenalAdjustment::Banded(banded))
        }
        other => Err(invalid(format!(
            "expected null, text or a mapping, found {}",
            value_kind(&other)
        ))),
    }
}

fn value_kind(value: &serde_yaml::Value) -> &'static str {
    use serde_yaml::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
