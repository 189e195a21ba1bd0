//! Shared data contracts for the paediatric dosing engine.
//!
//! This crate is the leaf of the workspace. It defines the shape of a formulary drug record and
//! its dosing rules, the renal-adjustment vocabulary, and the small numeric helpers every other
//! crate relies on. It performs no calculation beyond parsing and rounding.
//!
//! Key types:
//! - [`DoseSpec`]: one dosing rule for one indication/age group of one drug.
//! - [`RenalAdjustment`]: the per-drug renal instruction set.
//! - [`GfrBand`]: the eGFR severity vocabulary shared by the estimator and the resolver.
//! - [`DrugRecord`]: an immutable formulary entry.

mod dose_spec;
mod drug;
mod number;
mod renal;

pub use dose_spec::{DoseKind, DoseModelError, DoseSpec};
pub use drug::{DoseEntry, DrugRecord};
pub use number::{parse_form_number, round_to_tenth};
pub use renal::{AdjustmentKey, BandedAdjustment, GfrBand, RenalAdjustment};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A trimmed string that always holds at least one non-whitespace character.
///
/// Used for drug identifiers and names, which the formulary looks records up by and which the
/// display layer must never render blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it, or returns [`TextError::Empty`] if nothing is left.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for NonEmptyText {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  acyclovir \n").expect("valid text");
        assert_eq!(text.as_str(), "acyclovir");
    }

    #[test]
    fn non_empty_text_rejects_blank_input() {
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
        assert!(matches!(NonEmptyText::new(""), Err(TextError::Empty)));
    }

    #[test]
    fn non_empty_text_serialises_as_plain_string() {
        let text = NonEmptyText::new("ibuprofen").expect("valid text");
        let json = serde_json::to_string(&text).expect("serialise");
        assert_eq!(json, "\"ibuprofen\"");
    }
}
