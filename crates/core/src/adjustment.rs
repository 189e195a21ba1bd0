//! Renal adjustment resolution.
//!
//! Selects which of a drug's renal instructions applies to the patient's current eGFR band.

use crate::constants::NO_ADJUSTMENT_TEXT;
use peds_types::{AdjustmentKey, GfrBand, RenalAdjustment};
use serde::Serialize;

/// One row of a band-specific adjustment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdjustmentInstruction {
    pub key: AdjustmentKey,
    /// "GFR 30-50", "GFR 10-30", "GFR <10" or "HD".
    pub label: &'static str,
    pub text: String,
    /// True when this row's band is the patient's current band.
    pub is_active: bool,
}

/// A drug's renal adjustment, ready for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedAdjustment {
    NoAdjustment,
    FreeText { text: String },
    Banded { instructions: Vec<AdjustmentInstruction> },
}

impl ResolvedAdjustment {
    /// Display text for the non-banded forms.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::NoAdjustment => Some(NO_ADJUSTMENT_TEXT),
            Self::FreeText { text } => Some(text.as_str()),
            Self::Banded { .. } => None,
        }
    }

    pub fn instructions(&self) -> &[AdjustmentInstruction] {
        match self {
            Self::Banded { instructions } => instructions,
            _ => &[],
        }
    }

    /// The instruction matching the patient's band, if any.
    pub fn active_instruction(&self) -> Option<&AdjustmentInstruction> {
        self.instructions().iter().find(|row| row.is_active)
    }
}

/// Resolves `adjustment` against the patient's band.
///
/// Rows keep the order gfr50, gfr30, gfr10, hd and include only keys present on the drug. The
/// `hd` row is never active. With no band (eGFR unavailable) no row is active.
pub fn resolve_renal_adjustment(
    adjustment: &RenalAdjustment,
    band: Option<GfrBand>,
) -> ResolvedAdjustment {
    match adjustment {
        RenalAdjustment::NotNeeded => ResolvedAdjustment::NoAdjustment,
        RenalAdjustment::FreeText(text) => ResolvedAdjustment::FreeText { text: text.clone() },
        RenalAdjustment::Banded(banded) => {
            let instructions = banded
                .entries()
                .map(|(key, text)| AdjustmentInstruction {
                    key,
                    label: key.label(),
                    text: text.to_owned(),
                    is_active: band.is_some() && key.band() == band,
                })
                .collect();
            ResolvedAdjustment::Banded { instructions }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peds_types::BandedAdjustment;

    fn full_table() -> RenalAdjustment {
        RenalAdjustment::Banded(BandedAdjustment {
            gfr50: Some("Q12h".into()),
            gfr30: Some("Q24h".into()),
            gfr10: Some("Q48h".into()),
            hd: Some("after HD".into()),
        })
    }

    #[test]
    fn null_adjustment_needs_nothing() {
        let resolved = resolve_renal_adjustment(&RenalAdjustment::NotNeeded, Some(GfrBand::Severe));
        assert_eq!(resolved, ResolvedAdjustment::NoAdjustment);
        assert_eq!(resolved.text(), Some("No adjustment needed"));
        assert!(resolved.instructions().is_empty());
    }

    #[test]
    fn free_text_is_returned_verbatim() {
        let adjustment = RenalAdjustment::FreeText("Avoid if CrCl < 30".into());
        let resolved = resolve_renal_adjustment(&adjustment, Some(GfrBand::Moderate));
        assert_eq!(resolved.text(), Some("Avoid if CrCl < 30"));
        assert_eq!(resolved.active_instruction(), None);
    }

    #[test]
    fn only_the_matching_band_is_active() {
        let resolved = resolve_renal_adjustment(&full_table(), Some(GfrBand::Moderate));
        let rows = resolved.instructions();
        assert_eq!(rows.len(), 4);

        let active: Vec<_> = rows.iter().filter(|row| row.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].key, AdjustmentKey::Gfr30);
        assert_eq!(active[0].label, "GFR 10-30");
        assert_eq!(active[0].text, "Q24h");
    }

    #[test]
    fn rows_keep_display_order_and_labels() {
        let resolved = resolve_renal_adjustment(&full_table(), None);
        let labels: Vec<_> = resolved.instructions().iter().map(|row| row.label).collect();
        assert_eq!(labels, vec!["GFR 30-50", "GFR 10-30", "GFR <10", "HD"]);
        assert!(resolved.instructions().iter().all(|row| !row.is_active));
        assert_eq!(resolved.text(), None);
    }

    #[test]
    fn normal_band_activates_nothing() {
        let resolved = resolve_renal_adjustment(&full_table(), Some(GfrBand::Normal));
        assert_eq!(resolved.active_instruction(), None);
    }

    #[test]
    fn mild_and_severe_bands_map_to_their_rows() {
        let mild = resolve_renal_adjustment(&full_table(), Some(GfrBand::Mild));
        assert_eq!(mild.active_instruction().map(|row| row.key), Some(AdjustmentKey::Gfr50));

        let severe = resolve_renal_adjustment(&full_table(), Some(GfrBand::Severe));
        assert_eq!(severe.active_instruction().map(|row| row.key), Some(AdjustmentKey::Gfr10));
    }

    #[test]
    fn absent_keys_are_skipped() {
        let adjustment = RenalAdjustment::Banded(BandedAdjustment {
            gfr30: Some("50% dose".into()),
            hd: Some("Give after HD".into()),
            ..Default::default()
        });
        let resolved = resolve_renal_adjustment(&adjustment, Some(GfrBand::Mild));
        let keys: Vec<_> = resolved.instructions().iter().map(|row| row.key).collect();
        assert_eq!(keys, vec![AdjustmentKey::Gfr30, AdjustmentKey::Hd]);
        assert_eq!(resolved.active_instruction(), None);
    }

    #[test]
    fn resolution_is_idempotent() {
        let table = full_table();
        assert_eq!(
            resolve_renal_adjustment(&table, Some(GfrBand::Severe)),
            resolve_renal_adjustment(&table, Some(GfrBand::Severe))
        );
    }
}
