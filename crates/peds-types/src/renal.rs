//! Renal severity bands and per-drug renal adjustment instructions.

use serde::Serialize;

/// Severity classification of an eGFR value, in mL/min/1.73m².
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GfrBand {
    /// eGFR >= 50
    Normal,
    /// 30 <= eGFR < 50
    Mild,
    /// 10 <= eGFR < 30
    Moderate,
    /// eGFR < 10
    Severe,
}

impl GfrBand {
    pub fn from_gfr(value: f64) -> Self {
        if value >= 50.0 {
            Self::Normal
        } else if value >= 30.0 {
            Self::Mild
        } else if value >= 10.0 {
            Self::Moderate
        } else {
            Self::Severe
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl std::fmt::Display for GfrBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four keys of a structured renal adjustment, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKey {
    Gfr50,
    Gfr30,
    Gfr10,
    Hd,
}

impl AdjustmentKey {
    pub const ALL: [AdjustmentKey; 4] = [Self::Gfr50, Self::Gfr30, Self::Gfr10, Self::Hd];

    /// Key as written in formulary data.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Gfr50 => "gfr50",
            Self::Gfr30 => "gfr30",
            Self::Gfr10 => "gfr10",
            Self::Hd => "hd",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.wire_name() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Gfr50 => "GFR 30-50",
            Self::Gfr30 => "GFR 10-30",
            Self::Gfr10 => "GFR <10",
            Self::Hd => "HD",
        }
    }

    /// The band this key applies to. Dialysis status cannot be derived from eGFR, so `Hd` has
    /// none.
    pub fn band(self) -> Option<GfrBand> {
        match self {
            Self::Gfr50 => Some(GfrBand::Mild),
            Self::Gfr30 => Some(GfrBand::Moderate),
            Self::Gfr10 => Some(GfrBand::Severe),
            Self::Hd => None,
        }
    }
}

/// Band-specific instructions. Each key is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BandedAdjustment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gfr50: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gfr30: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gfr10: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hd: Option<String>,
}

impl BandedAdjustment {
    pub fn get(&self, key: AdjustmentKey) -> Option<&str> {
        match key {
            AdjustmentKey::Gfr50 => self.gfr50.as_deref(),
            AdjustmentKey::Gfr30 => self.gfr30.as_deref(),
            AdjustmentKey::Gfr10 => self.gfr10.as_deref(),
            AdjustmentKey::Hd => self.hd.as_deref(),
        }
    }

    pub fn set(&mut self, key: AdjustmentKey, text: String) {
        let slot = match key {
            AdjustmentKey::Gfr50 => &mut self.gfr50,
            AdjustmentKey::Gfr30 => &mut self.gfr30,
            AdjustmentKey::Gfr10 => &mut self.gfr10,
            AdjustmentKey::Hd => &mut self.hd,
        };
        *slot = Some(text);
    }

    /// Present entries in display order: gfr50, gfr30, gfr10, hd.
    pub fn entries(&self) -> impl Iterator<Item = (AdjustmentKey, &str)> + '_ {
        AdjustmentKey::ALL
            .into_iter()
            .filter_map(move |key| self.get(key).map(|text| (key, text)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// A drug's renal adjustment rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RenalAdjustment {
    /// No renal adjustment needed.
    #[default]
    NotNeeded,
    /// An instruction that is not tied to a specific band; displayed as-is.
    FreeText(String),
    Banded(BandedAdjustment),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries() {
        assert_eq!(GfrBand::from_gfr(50.0), GfrBand::Normal);
        assert_eq!(GfrBand::from_gfr(49.9), GfrBand::Mild);
        assert_eq!(GfrBand::from_gfr(30.0), GfrBand::Mild);
        assert_eq!(GfrBand::from_gfr(29.9), GfrBand::Moderate);
        assert_eq!(GfrBand::from_gfr(10.0), GfrBand::Moderate);
        assert_eq!(GfrBand::from_gfr(9.9), GfrBand::Severe);
    }

    #[test]
    fn adjustment_keys_map_to_bands() {
        assert_eq!(AdjustmentKey::Gfr50.band(), Some(GfrBand::Mild));
        assert_eq!(AdjustmentKey::Gfr30.band(), Some(GfrBand::Moderate));
        assert_eq!(AdjustmentKey::Gfr10.band(), Some(GfrBand::Severe));
        assert_eq!(AdjustmentKey::Hd.band(), None);
        assert_eq!(AdjustmentKey::from_wire_name("gfr30"), Some(AdjustmentKey::Gfr30));
        assert_eq!(AdjustmentKey::from_wire_name("gfr60"), None);
    }

    #[test]
    fn banded_entries_follow_display_order() {
        let mut banded = BandedAdjustment::default();
        assert!(banded.is_empty());
        banded.set(AdjustmentKey::Hd, "after HD".into());
        banded.set(AdjustmentKey::Gfr50, "Q12h".into());

        let keys: Vec<_> = banded.entries().map(|(key, _)| key).collect();
        assert_eq!(keys, vec![AdjustmentKey::Gfr50, AdjustmentKey::Hd]);
        assert!(!banded.is_empty());
    }
}
