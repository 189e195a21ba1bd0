//! Constants used throughout the dosing engine.
//!
//! Formula coefficients and fixed strings live here so the calculators and their tests agree on
//! a single value.

/// Bedside (revised) Schwartz coefficient calibrated for creatinine in µmol/L.
///
/// 0.413 mL/min/1.73m² per (mg/dL·m) × 88.4.
pub const BEDSIDE_SCHWARTZ_UMOL_COEFFICIENT: f64 = 36.5;

/// Serum creatinine conversion factor, µmol/L per mg/dL.
pub const CREATININE_MG_DL_TO_UMOL_L: f64 = 88.4;

/// Original Schwartz `k` for preterm infants (mg/dL calibration).
pub const SCHWARTZ_K_PRETERM: f64 = 0.33;

/// Original Schwartz `k` for term infants under one year.
pub const SCHWARTZ_K_TERM_INFANT: f64 = 0.45;

/// Original Schwartz `k` for children aged 1-13 years.
pub const SCHWARTZ_K_CHILD: f64 = 0.55;

/// Original Schwartz `k` for adolescent males.
pub const SCHWARTZ_K_ADOLESCENT_MALE: f64 = 0.70;

/// Original Schwartz `k` for adolescent females.
pub const SCHWARTZ_K_ADOLESCENT_FEMALE: f64 = 0.55;

/// Text shown when a drug needs no renal adjustment.
pub const NO_ADJUSTMENT_TEXT: &str = "No adjustment needed";

/// Drug-level maximum text that carries no numeric cap.
pub const SEE_PROTOCOL_MAX_TEXT: &str = "See protocol";

/// Formulary location searched for when no explicit path is configured.
pub const DEFAULT_FORMULARY_PATH: &str = "formulary/formulary.yaml";
