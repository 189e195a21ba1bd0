//! Weight-based dose calculation.
//!
//! Only [`DoseKind::WeightScaled`] rules produce a number. Fixed doses and infusion rates are
//! "not computable" and return `None`, as do non-positive weights, values without a positive
//! leading number, non-positive caps, and results that overflow.
//!
//! Range values such as `"10-15"` use the low end only: parsing stops at the hyphen. The upper
//! bound is never averaged in.
//!
//! Units are not interpreted. The result is the coefficient scaled by body weight, in the same
//! unit family the rule declares; it is milligrams only when the rule's unit is milligrams.

use crate::constants::SEE_PROTOCOL_MAX_TEXT;
use peds_types::{parse_form_number, round_to_tenth, DoseKind, DoseSpec};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// A calculated weight-scaled dose.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DoseResult {
    /// The dose to show: the capped value when `capped`, otherwise the raw dose to one decimal.
    pub dose_mg: f64,
    /// True when the raw dose exceeded the cap.
    pub capped: bool,
    /// The cap that was applied. Present only when `capped`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dose: Option<f64>,
    /// Coefficient × weight before capping or rounding.
    pub raw_dose_mg: f64,
    /// The rule's informational floor, passed through unenforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_dose: Option<f64>,
}

impl DoseResult {
    /// True when the rule declares a minimum and the raw dose falls below it.
    pub fn below_min_dose(&self) -> bool {
        self.min_dose.is_some_and(|min| self.raw_dose_mg < min)
    }
}

/// Calculates a patient-specific dose for one rule, capped at `spec.max_dose`.
pub fn calculate_dose(weight_kg: f64, spec: &DoseSpec) -> Option<DoseResult> {
    calculate_dose_with_cap(weight_kg, spec, spec.max_dose)
}

/// As [`calculate_dose`], with the cap supplied by the caller.
///
/// Used when the cap comes from somewhere other than the rule itself, such as a drug-level
/// maximum parsed by [`parse_max_text`].
pub fn calculate_dose_with_cap(
    weight_kg: f64,
    spec: &DoseSpec,
    cap: Option<f64>,
) -> Option<DoseResult> {
    if !(weight_kg.is_finite() && weight_kg > 0.0) {
        return None;
    }

    if spec.kind != DoseKind::WeightScaled {
        return None;
    }

    let Some(per_kg) = parse_form_number(&spec.value) else {
        tracing::debug!(label = %spec.label, value = %spec.value, "dose value has no leading number");
        return None;
    };

    if !(per_kg.is_finite() && per_kg > 0.0) {
        tracing::debug!(label = %spec.label, value = %spec.value, "dose value is not positive");
        return None;
    }

    if let Some(max) = cap {
        if !(max.is_finite() && max > 0.0) {
            tracing::debug!(label = %spec.label, max, "maximum dose is not positive");
            return None;
        }
    }

    let raw = per_kg * weight_kg;
    if !raw.is_finite() || !round_to_tenth(raw).is_finite() {
        return None;
    }

    let result = match cap {
        Some(max) if raw > max => {
            tracing::debug!(label = %spec.label, raw, max, "dose capped at maximum");
            DoseResult {
                dose_mg: max,
                capped: true,
                max_dose: Some(max),
                raw_dose_mg: raw,
                min_dose: spec.min_dose,
            }
        }
        _ => DoseResult {
            dose_mg: round_to_tenth(raw),
            capped: false,
            max_dose: None,
            raw_dose_mg: raw,
            min_dose: spec.min_dose,
        },
    };

    Some(result)
}

/// Whether a rule's amount is given per administration or per day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseBasis {
    PerDose,
    PerDay,
    Unspecified,
}

/// Dosing basis and frequency read from a rule's unit text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DoseSchedule {
    pub basis: DoseBasis,
    /// Recognised frequency token, e.g. `q6-8h`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<&'static str>,
    /// Administrations per day implied by `frequency`; 1 when unknown.
    pub divisor: u32,
}

/// Frequency tokens in match order; earlier entries win.
const FREQUENCIES: &[(&str, Option<&str>, u32)] = &[
    ("q4h", Some("q4-"), 6),
    ("q4-6h", None, 5),
    ("q6h", Some("q6-"), 4),
    ("q6-8h", None, 3),
    ("q6-12h", None, 3),
    ("q8h", Some("q8-"), 3),
    ("q12h", Some("q12-"), 2),
    ("q12-24h", None, 2),
    ("q24h", None, 1),
];

impl DoseSchedule {
    /// Classifies a unit string such as `"mg/kg/day divided q8h"`.
    ///
    /// `/dose` or a `q..` frequency without "day"/"divided" means per dose; `/day` or "divided"
    /// means per day. Per dose wins when both appear.
    pub fn from_unit(unit: &str) -> Self {
        let per_dose = unit.contains("/dose")
            || (unit.contains('q') && !unit.contains("day") && !unit.contains("divided"));
        let per_day = unit.contains("/day") || unit.contains("divided");

        let basis = if per_dose {
            DoseBasis::PerDose
        } else if per_day {
            DoseBasis::PerDay
        } else {
            DoseBasis::Unspecified
        };

        let lower = unit.to_lowercase();
        let mut frequency = None;
        let mut divisor = 1;
        for (token, excluded, per_day_count) in FREQUENCIES {
            let excluded = excluded.is_some_and(|prefix| lower.contains(prefix));
            if lower.contains(token) && !excluded {
                frequency = Some(*token);
                divisor = *per_day_count;
                break;
            }
        }
        if frequency.is_none() && lower.contains("once daily") {
            frequency = Some("q24h");
        }

        Self {
            basis,
            frequency,
            divisor,
        }
    }

    /// Splits a daily amount into one administration, rounded to one decimal.
    ///
    /// Only per-day rules with more than one administration a day are split.
    pub fn per_dose_amount(&self, daily: f64) -> Option<f64> {
        (self.basis == DoseBasis::PerDay && self.divisor > 1)
            .then(|| round_to_tenth(daily / f64::from(self.divisor)))
    }
}

static MG_PER_KG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mg/kg").expect("valid regex"));
static G_PER_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*g/day").expect("valid regex"));
static MG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mg").expect("valid regex"));
static GRAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*g(r?)").expect("valid regex"));
static MCG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mcg").expect("valid regex"));

fn first_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Turns a drug's free-text maximum into a milligram cap.
///
/// - `"See protocol"` or blank: no cap.
/// - Weight-based (`"20 mg/kg"`): the per-kg figure × `weight_kg`; no cap without a weight.
/// - Otherwise the first of `N g/day` (×1000), `N mg`, `N g` (×1000, not grains), `N mcg`.
pub fn parse_max_text(text: &str, weight_kg: f64) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text == SEE_PROTOCOL_MAX_TEXT {
        return None;
    }

    if text.contains("/kg") {
        if !(weight_kg.is_finite() && weight_kg > 0.0) {
            return None;
        }
        return first_number(&MG_PER_KG, text).map(|per_kg| per_kg * weight_kg);
    }

    if let Some(grams) = first_number(&G_PER_DAY, text) {
        return Some(grams * 1000.0);
    }
    if let Some(mg) = first_number(&MG, text) {
        return Some(mg);
    }
    let grams = GRAMS
        .captures_iter(text)
        .find(|caps| caps.get(2).is_some_and(|gr| gr.as_str().is_empty()))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());
    if let Some(grams) = grams {
        return Some(grams * 1000.0);
    }
    first_number(&MCG, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mg_per_kg(value: &str) -> DoseSpec {
        DoseSpec::weight_scaled("Test", value, "mg/kg")
    }

    #[test]
    fn scales_by_weight_without_cap() {
        let result = calculate_dose(20.0, &mg_per_kg("10")).expect("computable");
        assert_eq!(result.dose_mg, 200.0);
        assert!(!result.capped);
        assert_eq!(result.max_dose, None);
    }

    #[test]
    fn caps_at_max_dose() {
        let spec = mg_per_kg("15").with_max_dose(500.0);
        let result = calculate_dose(50.0, &spec).expect("computable");
        assert_eq!(result.dose_mg, 500.0);
        assert!(result.capped);
        assert_eq!(result.max_dose, Some(500.0));
        assert_eq!(result.raw_dose_mg, 750.0);
    }

    #[test]
    fn dose_equal_to_max_is_not_capped() {
        let spec = mg_per_kg("10").with_max_dose(500.0);
        let result = calculate_dose(50.0, &spec).expect("computable");
        assert_eq!(result.dose_mg, 500.0);
        assert!(!result.capped);
    }

    #[test]
    fn range_uses_low_end() {
        let result = calculate_dose(10.0, &mg_per_kg("10-15")).expect("computable");
        assert_eq!(result.dose_mg, 100.0);
        assert!(!result.capped);
    }

    #[test]
    fn fixed_and_rate_rules_are_not_computable() {
        let fixed = DoseSpec::weight_scaled("Adult", "500", "mg").with_kind(DoseKind::Fixed);
        let rate = DoseSpec::weight_scaled("Infusion", "5", "mcg/kg/min").with_kind(DoseKind::Rate);
        assert_eq!(calculate_dose(70.0, &fixed), None);
        assert_eq!(calculate_dose(70.0, &rate), None);
    }

    #[test]
    fn non_positive_weight_is_not_computable() {
        let spec = mg_per_kg("10");
        assert_eq!(calculate_dose(0.0, &spec), None);
        assert_eq!(calculate_dose(-4.0, &spec), None);
        assert_eq!(calculate_dose(f64::NAN, &spec), None);
    }

    #[test]
    fn unparsable_value_is_not_computable() {
        assert_eq!(calculate_dose(10.0, &mg_per_kg("See age table")), None);
        assert_eq!(calculate_dose(10.0, &mg_per_kg("")), None);
    }

    #[test]
    fn uncapped_dose_is_rounded_to_one_decimal() {
        let result = calculate_dose(7.77, &mg_per_kg("1.5")).expect("computable");
        assert_eq!(result.dose_mg, 11.7);
        assert!((result.raw_dose_mg - 11.655).abs() < 1e-9);
    }

    #[test]
    fn min_dose_is_reported_not_enforced() {
        let spec = mg_per_kg("0.02").with_min_dose(0.1);
        let result = calculate_dose(3.0, &spec).expect("computable");
        assert_eq!(result.dose_mg, 0.1);
        assert!(result.below_min_dose());

        let result = calculate_dose(2.0, &spec).expect("computable");
        assert_eq!(result.dose_mg, 0.0);
        assert_eq!(result.min_dose, Some(0.1));
        assert!(result.below_min_dose());

        let result = calculate_dose(10.0, &spec).expect("computable");
        assert!(!result.below_min_dose());
    }

    #[test]
    fn negative_value_is_not_computable() {
        assert_eq!(calculate_dose(10.0, &mg_per_kg("-5")), None);
        assert_eq!(calculate_dose(10.0, &mg_per_kg("0")), None);
    }

    #[test]
    fn non_positive_cap_is_not_computable() {
        let spec = mg_per_kg("10").with_max_dose(-1.0);
        assert_eq!(calculate_dose(10.0, &spec), None);

        let zero = mg_per_kg("10");
        assert_eq!(calculate_dose_with_cap(10.0, &zero, Some(0.0)), None);
        assert_eq!(calculate_dose_with_cap(10.0, &zero, Some(f64::NAN)), None);
    }

    #[test]
    fn overflowing_dose_is_not_computable() {
        assert_eq!(calculate_dose(10.0, &mg_per_kg("1e308")), None);
        assert_eq!(calculate_dose(f64::MAX, &mg_per_kg("2")), None);
    }

    #[test]
    fn caller_supplied_cap_overrides_rule() {
        let spec = mg_per_kg("40");
        let result = calculate_dose_with_cap(30.0, &spec, Some(1000.0)).expect("computable");
        assert_eq!(result.dose_mg, 1000.0);
        assert!(result.capped);
    }

    #[test]
    fn calculation_is_idempotent() {
        let spec = mg_per_kg("12.5").with_max_dose(300.0);
        assert_eq!(calculate_dose(27.0, &spec), calculate_dose(27.0, &spec));
    }

    #[test]
    fn schedule_recognises_daily_divided_doses() {
        let schedule = DoseSchedule::from_unit("mg/kg/day divided q8h");
        assert_eq!(schedule.basis, DoseBasis::PerDay);
        assert_eq!(schedule.frequency, Some("q8h"));
        assert_eq!(schedule.divisor, 3);
        assert_eq!(schedule.per_dose_amount(900.0), Some(300.0));
    }

    #[test]
    fn schedule_recognises_per_dose_units() {
        let schedule = DoseSchedule::from_unit("mg/kg/dose q6-8h PO");
        assert_eq!(schedule.basis, DoseBasis::PerDose);
        assert_eq!(schedule.frequency, Some("q6-8h"));
        assert_eq!(schedule.per_dose_amount(100.0), None);

        let bare = DoseSchedule::from_unit("mg/kg q12h IV");
        assert_eq!(bare.basis, DoseBasis::PerDose);
        assert_eq!(bare.divisor, 2);
    }

    #[test]
    fn schedule_frequency_table() {
        let cases = [
            ("mg/kg/day q4h", Some("q4h"), 6),
            ("mg/kg/day ÷ q4-6h", Some("q4-6h"), 5),
            ("mg/kg/day ÷ q6h", Some("q6h"), 4),
            ("mg/kg/day ÷ q6-12h", Some("q6-12h"), 3),
            ("mg/kg/day ÷ q12-24h", Some("q12-24h"), 2),
            ("mg/kg/day Q24H", Some("q24h"), 1),
            ("mg/kg/day once daily", Some("q24h"), 1),
            ("mg/kg", None, 1),
        ];
        for (unit, frequency, divisor) in cases {
            let schedule = DoseSchedule::from_unit(unit);
            assert_eq!(schedule.frequency, frequency, "{unit}");
            assert_eq!(schedule.divisor, divisor, "{unit}");
        }
    }

    #[test]
    fn single_daily_dose_is_not_split() {
        let schedule = DoseSchedule::from_unit("mg/kg/day once daily");
        assert_eq!(schedule.basis, DoseBasis::PerDay);
        assert_eq!(schedule.per_dose_amount(500.0), None);
    }

    #[test]
    fn per_dose_split_rounds_to_one_decimal() {
        let schedule = DoseSchedule::from_unit("mg/kg/day divided q8h");
        assert_eq!(schedule.per_dose_amount(100.0), Some(33.3));
    }

    #[test]
    fn max_text_without_cap() {
        assert_eq!(parse_max_text("See protocol", 20.0), None);
        assert_eq!(parse_max_text("  ", 20.0), None);
        assert_eq!(parse_max_text("per levels", 20.0), None);
    }

    #[test]
    fn max_text_weight_based() {
        assert_eq!(parse_max_text("20 mg/kg/day", 15.0), Some(300.0));
        assert_eq!(parse_max_text("20 mg/kg/day", 0.0), None);
        assert_eq!(parse_max_text("0.1 units/kg", 15.0), None);
    }

    #[test]
    fn max_text_absolute_units() {
        assert_eq!(parse_max_text("3 g/day", 0.0), Some(3000.0));
        assert_eq!(parse_max_text("2400 mg/day", 0.0), Some(2400.0));
        assert_eq!(parse_max_text("800 mg PO", 0.0), Some(800.0));
        assert_eq!(parse_max_text("1.2g IV/dose", 0.0), Some(1200.0));
        assert_eq!(parse_max_text("100 mcg", 0.0), Some(100.0));
        assert_eq!(parse_max_text("5 gr", 0.0), None);
    }
}
