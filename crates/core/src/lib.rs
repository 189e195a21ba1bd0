//! # Paediatric dosing core
//!
//! The numeric engine behind the paediatric formulary:
//! - eGFR estimation with the revised or original Schwartz equation, and banding
//! - weight-based dose calculation with maximum-dose capping
//! - selection of the renal adjustment that matches the patient's band
//!
//! Every calculation is a pure function of a caller-supplied snapshot of patient values and an
//! immutable drug record. Insufficient or inapplicable input yields `None`, never an error;
//! errors are reserved for configuration and formulary loading.
//!
//! **No presentation concerns**: formatting and display belong in `peds-cli` or another front end.

pub mod adjustment;
pub mod assessment;
pub mod config;
pub mod constants;
pub mod dose;
mod error;
pub mod formulary;
pub mod renal;

pub use adjustment::{resolve_renal_adjustment, AdjustmentInstruction, ResolvedAdjustment};
pub use assessment::{assess_drug, DoseSuggestion, DrugAssessment};
pub use config::EngineConfig;
pub use dose::{calculate_dose, calculate_dose_with_cap, DoseBasis, DoseResult, DoseSchedule};
pub use error::{DosingError, DosingResult};
pub use formulary::Formulary;
pub use renal::{
    estimate_gfr, AgeCategory, CkdStage, GfrResult, PatientRenalParameters, SchwartzVariant,
};

pub use peds_types::{
    parse_form_number, AdjustmentKey, BandedAdjustment, DoseKind, DoseSpec, DrugRecord, GfrBand,
    RenalAdjustment,
};

/// Formulary-backed dosing operations.
#[derive(Clone, Debug)]
pub struct DosingService {
    formulary: Formulary,
    config: EngineConfig,
}

impl DosingService {
    pub fn new(formulary: Formulary, config: EngineConfig) -> Self {
        Self { formulary, config }
    }

    /// Loads the formulary named by `config` and wraps it in a service.
    pub fn from_config(config: EngineConfig) -> DosingResult<Self> {
        let formulary = Formulary::load(config.formulary_path())?;
        Ok(Self::new(formulary, config))
    }

    pub fn formulary(&self) -> &Formulary {
        &self.formulary
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds patient parameters from form text using the configured formula defaults.
    pub fn patient_from_form(
        &self,
        weight: &str,
        height: &str,
        creatinine: &str,
    ) -> PatientRenalParameters {
        PatientRenalParameters::from_form(
            weight,
            height,
            creatinine,
            self.config.default_variant(),
            self.config.default_age_category(),
        )
    }

    /// Assesses one drug for the patient.
    ///
    /// # Errors
    ///
    /// Returns [`DosingError::UnknownDrug`] if `drug_id` is not in the formulary.
    pub fn assess(
        &self,
        params: &PatientRenalParameters,
        drug_id: &str,
    ) -> DosingResult<DrugAssessment> {
        let drug = self.formulary.require(drug_id)?;
        Ok(assess_drug(params, drug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn service() -> DosingService {
        let path = config::resolve_formulary_path(None).expect("bundled formulary");
        let config = EngineConfig::new(path, SchwartzVariant::Revised, AgeCategory::Child)
            .expect("valid config");
        DosingService::from_config(config).expect("load service")
    }

    #[test]
    fn bundled_formulary_loads() {
        let service = service();
        assert!(!service.formulary().is_empty());
        assert!(service.formulary().get("acyclovir").is_some());
    }

    #[test]
    fn assess_unknown_drug_fails() {
        let service = service();
        let params = service.patient_from_form("20", "110", "45");
        let err = service.assess(&params, "not-a-drug").expect_err("unknown drug");
        assert!(matches!(err, DosingError::UnknownDrug(_)));
    }

    #[test]
    fn assess_uses_configured_defaults() {
        let service = service();
        let params = service.patient_from_form("20", "100", "36.5");
        assert_eq!(params.formula_variant, SchwartzVariant::Revised);

        let assessment = service.assess(&params, "acyclovir").expect("assess");
        assert_eq!(assessment.gfr.value, Some(100.0));
        assert_eq!(assessment.gfr.band, Some(GfrBand::Normal));
    }

    #[test]
    fn missing_formulary_file_is_reported() {
        let config = EngineConfig::new(
            PathBuf::from("/nonexistent/formulary.yaml"),
            SchwartzVariant::Revised,
            AgeCategory::Child,
        )
        .expect("valid config");
        let err = DosingService::from_config(config).expect_err("missing file");
        assert!(matches!(err, DosingError::Formulary(_)));
    }
}
