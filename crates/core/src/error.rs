#[derive(Debug, thiserror::Error)]
pub enum DosingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("formulary error: {0}")]
    Formulary(#[from] peds_formulary::FormularyError),
    #[error("duplicate drug id in formulary: {0}")]
    DuplicateDrug(String),
    #[error("unknown drug id: {0}")]
    UnknownDrug(String),
}

pub type DosingResult<T> = std::result::Result<T, DosingError>;
