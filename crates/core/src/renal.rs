//! Renal function estimation.
//!
//! Estimates eGFR (mL/min/1.73m²) from height and serum creatinine with either Schwartz
//! variant, then classifies the result into a [`GfrBand`].
//!
//! Both variants take creatinine in µmol/L:
//! - revised (bedside): `eGFR = 36.5 × height_cm / SCr`
//! - original: `eGFR = k × 88.4 × height_cm / SCr`, with `k` from the patient's age category
//!
//! The result is rounded to one decimal place and the band is taken from that rounded value, so
//! the displayed number and its band always agree.

use crate::constants::{
    BEDSIDE_SCHWARTZ_UMOL_COEFFICIENT, CREATININE_MG_DL_TO_UMOL_L, SCHWARTZ_K_ADOLESCENT_FEMALE,
    SCHWARTZ_K_ADOLESCENT_MALE, SCHWARTZ_K_CHILD, SCHWARTZ_K_PRETERM, SCHWARTZ_K_TERM_INFANT,
};
use crate::{DosingError, DosingResult};
use peds_types::{parse_form_number, round_to_tenth, GfrBand};
use serde::Serialize;
use std::str::FromStr;

/// Which Schwartz equation to apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchwartzVariant {
    /// Bedside equation with a single coefficient for all ages.
    #[default]
    Revised,
    /// Classic equation with an age/sex-dependent coefficient.
    Original,
}

impl FromStr for SchwartzVariant {
    type Err = DosingError;

    fn from_str(s: &str) -> DosingResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revised" | "bedside" => Ok(Self::Revised),
            "original" | "classic" => Ok(Self::Original),
            other => Err(DosingError::InvalidInput(format!(
                "unknown Schwartz variant '{other}' (expected revised or original)"
            ))),
        }
    }
}

/// Age/sex category, consulted only by the original Schwartz equation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AgeCategory {
    Preterm,
    Term,
    #[default]
    Child,
    AdolescentMale,
    AdolescentFemale,
}

impl AgeCategory {
    /// Original Schwartz `k`, mg/dL calibration.
    pub fn schwartz_k(self) -> f64 {
        match self {
            Self::Preterm => SCHWARTZ_K_PRETERM,
            Self::Term => SCHWARTZ_K_TERM_INFANT,
            Self::Child => SCHWARTZ_K_CHILD,
            Self::AdolescentMale => SCHWARTZ_K_ADOLESCENT_MALE,
            Self::AdolescentFemale => SCHWARTZ_K_ADOLESCENT_FEMALE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Preterm => "Preterm infant",
            Self::Term => "Term infant (<1 year)",
            Self::Child => "Child (1-13 years)",
            Self::AdolescentMale => "Adolescent male (>13 years)",
            Self::AdolescentFemale => "Adolescent female (>13 years)",
        }
    }
}

impl std::fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeCategory {
    type Err = DosingError;

    fn from_str(s: &str) -> DosingResult<Self> {
        let normalised: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalised.as_str() {
            "preterm" => Ok(Self::Preterm),
            "term" | "terminfant" => Ok(Self::Term),
            "child" => Ok(Self::Child),
            "adolescentmale" | "adolescentm" => Ok(Self::AdolescentMale),
            "adolescentfemale" | "adolescentf" => Ok(Self::AdolescentFemale),
            _ => Err(DosingError::InvalidInput(format!(
                "unknown age category '{}' (expected preterm, term, child, adolescent-male or adolescent-female)",
                s.trim()
            ))),
        }
    }
}

/// Patient values entered for one calculation. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PatientRenalParameters {
    pub weight_kg: f64,
    pub height_cm: f64,
    /// Serum creatinine, µmol/L.
    pub serum_creatinine: f64,
    pub formula_variant: SchwartzVariant,
    pub age_category: AgeCategory,
}

impl PatientRenalParameters {
    /// Builds parameters from raw form text.
    ///
    /// Any field without a leading number becomes `0.0`, which the calculators treat as
    /// "insufficient data" rather than an error.
    pub fn from_form(
        weight: &str,
        height: &str,
        creatinine: &str,
        formula_variant: SchwartzVariant,
        age_category: AgeCategory,
    ) -> Self {
        let read = |text: &str| parse_form_number(text).unwrap_or(0.0);
        Self {
            weight_kg: read(weight),
            height_cm: read(height),
            serum_creatinine: read(creatinine),
            formula_variant,
            age_category,
        }
    }
}

/// Estimated GFR and its band. Both are `None` when inputs are insufficient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GfrResult {
    /// mL/min/1.73m², rounded to one decimal.
    pub value: Option<f64>,
    pub band: Option<GfrBand>,
}

impl GfrResult {
    pub fn insufficient() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }

    /// Display stage for the eGFR badge.
    pub fn stage(&self) -> Option<CkdStage> {
        self.value.map(CkdStage::from_gfr)
    }
}

/// Chronic kidney disease stage used to colour the eGFR badge.
///
/// Independent from [`GfrBand`], which drives dose adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CkdStage {
    /// >= 90
    G1,
    /// 60 to < 90
    G2,
    /// 30 to < 60
    G3,
    /// 15 to < 30
    G4,
    /// < 15
    G5,
}

impl CkdStage {
    pub fn from_gfr(value: f64) -> Self {
        if value >= 90.0 {
            Self::G1
        } else if value >= 60.0 {
            Self::G2
        } else if value >= 30.0 {
            Self::G3
        } else if value >= 15.0 {
            Self::G4
        } else {
            Self::G5
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::G1 => "G1 normal or high",
            Self::G2 => "G2 mildly decreased",
            Self::G3 => "G3 moderately decreased",
            Self::G4 => "G4 severely decreased",
            Self::G5 => "G5 kidney failure",
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Estimates eGFR from height and serum creatinine.
///
/// Returns [`GfrResult::insufficient`] when height or creatinine is zero, negative, or not a
/// finite number, or when the ratio overflows. Weight is not used.
pub fn estimate_gfr(params: &PatientRenalParameters) -> GfrResult {
    if !is_positive(params.height_cm) || !is_positive(params.serum_creatinine) {
        return GfrResult::insufficient();
    }

    let coefficient = match params.formula_variant {
        SchwartzVariant::Revised => BEDSIDE_SCHWARTZ_UMOL_COEFFICIENT,
        SchwartzVariant::Original => params.age_category.schwartz_k() * CREATININE_MG_DL_TO_UMOL_L,
    };

    let value = round_to_tenth(coefficient * params.height_cm / params.serum_creatinine);
    if !value.is_finite() {
        return GfrResult::insufficient();
    }

    GfrResult {
        value: Some(value),
        band: Some(GfrBand::from_gfr(value)),
    }
}
