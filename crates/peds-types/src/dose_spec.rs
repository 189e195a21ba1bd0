//! Per-indication dosing rules.

use serde::Serialize;

/// Errors raised while assembling a [`DoseSpec`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DoseModelError {
    /// A dose entry was flagged as both a fixed dose and an infusion rate.
    #[error("dose cannot be both fixed and a rate")]
    ConflictingKind,
}

/// How a dose entry relates to body weight.
///
/// Exactly one of these applies to any [`DoseSpec`]; only [`DoseKind::WeightScaled`] entries
/// produce a calculated dose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseKind {
    /// `value` is per kg (or per m²) and is multiplied by the patient's weight.
    #[default]
    WeightScaled,
    /// `value`/`unit` is an absolute dose that must not be scaled.
    Fixed,
    /// A continuous infusion rate such as mcg/kg/min; there is no single total dose.
    Rate,
}

impl DoseKind {
    /// Builds the kind from the two boolean flags used in formulary data.
    pub fn from_flags(is_fixed: bool, is_rate: bool) -> Result<Self, DoseModelError> {
        match (is_fixed, is_rate) {
            (true, true) => Err(DoseModelError::ConflictingKind),
            (true, false) => Ok(Self::Fixed),
            (false, true) => Ok(Self::Rate),
            (false, false) => Ok(Self::WeightScaled),
        }
    }

    /// True when the unit text describes a per-time infusion rate (`/min`, `/hr`, `/hour`).
    pub fn unit_describes_rate(unit: &str) -> bool {
        unit.contains("/min") || unit.contains("/hr") || unit.contains("/hour")
    }
}

/// One dosing rule for one indication or age group of one drug.
///
/// `value` is kept as the original text: it may be a single number (`"15"`), a range
/// (`"10-15"`), or something that is not numeric at all. The unit is free text and is never
/// interpreted arithmetically.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DoseSpec {
    /// Human-readable context, e.g. "IV Child <50kg".
    pub label: String,
    pub value: String,
    /// Unit and frequency description, e.g. "mg/kg/dose Q4-6h".
    pub unit: String,
    pub kind: DoseKind,
    /// Absolute ceiling in milligrams for the weight-scaled result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dose: Option<f64>,
    /// Descriptive only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_unit: Option<String>,
    /// Informational floor. Never enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_dose: Option<f64>,
}

impl DoseSpec {
    /// A weight-scaled rule with no cap or floor.
    pub fn weight_scaled(
        label: impl Into<String>,
        value: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            unit: unit.into(),
            kind: DoseKind::WeightScaled,
            max_dose: None,
            max_unit: None,
            min_dose: None,
        }
    }

    pub fn with_kind(mut self, kind: DoseKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_max_dose(mut self, max_dose: f64) -> Self {
        self.max_dose = Some(max_dose);
        self
    }

    pub fn with_min_dose(mut self, min_dose: f64) -> Self {
        self.min_dose = Some(min_dose);
        self
    }

    pub fn is_fixed(&self) -> bool {
        self.kind == DoseKind::Fixed
    }

    pub fn is_rate(&self) -> bool {
        self.kind == DoseKind::Rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_flags_is_exclusive() {
        assert_eq!(DoseKind::from_flags(false, false), Ok(DoseKind::WeightScaled));
        assert_eq!(DoseKind::from_flags(true, false), Ok(DoseKind::Fixed));
        assert_eq!(DoseKind::from_flags(false, true), Ok(DoseKind::Rate));
        assert_eq!(
            DoseKind::from_flags(true, true),
            Err(DoseModelError::ConflictingKind)
        );
    }

    #[test]
    fn rate_units_are_recognised() {
        assert!(DoseKind::unit_describes_rate("mcg/kg/min"));
        assert!(DoseKind::unit_describes_rate("mg/kg/hr infusion"));
        assert!(DoseKind::unit_describes_rate("units/kg/hour"));
        assert!(!DoseKind::unit_describes_rate("mg/kg/dose q8h"));
    }

    #[test]
    fn builder_sets_optional_fields() {
        let spec = DoseSpec::weight_scaled("IV", "30", "mg/kg/dose q8h")
            .with_max_dose(2000.0)
            .with_min_dose(50.0);
        assert_eq!(spec.max_dose, Some(2000.0));
        assert_eq!(spec.min_dose, Some(50.0));
        assert!(!spec.is_fixed());
        assert!(!spec.is_rate());

        let fixed = DoseSpec::weight_scaled("Croup", "2", "mg nebulised").with_kind(DoseKind::Fixed);
        assert!(fixed.is_fixed());
    }
}
