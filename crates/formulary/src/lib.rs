//! YAML boundary for the paediatric formulary dataset.
//!
//! This crate translates the on-disk formulary file into the domain records defined in
//! `peds-types`. It owns the wire schema and every shape check on the way in, so the engine
//! only ever sees well-formed [`DrugRecord`](peds_types::DrugRecord)s.
//!
//! The dataset itself is reference data: it is read once, never written back, and carries no
//! clinical validation beyond structure.

pub mod document;

pub use document::FormularyDocument;

/// Errors returned by the `peds-formulary` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FormularyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation error: {0}")]
    Translation(String),

    /// A renal adjustment that is neither null, text, nor a mapping of the known band keys.
    #[error("invalid renal adjustment shape for drug '{drug_id}': {detail}")]
    InvalidAdjustmentShape { drug_id: String, detail: String },
}

/// Type alias for Results that can fail with a [`FormularyError`].
pub type FormularyResult<T> = Result<T, FormularyError>;
