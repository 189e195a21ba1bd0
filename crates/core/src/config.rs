//! Engine runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the engine. The core
//! never reads environment variables itself; callers read them and hand the raw values to the
//! helpers here.

use crate::constants::DEFAULT_FORMULARY_PATH;
use crate::renal::{AgeCategory, SchwartzVariant};
use crate::{DosingError, DosingResult};
use std::path::{Path, PathBuf};

/// Engine configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    formulary_path: PathBuf,
    default_variant: SchwartzVariant,
    default_age_category: AgeCategory,
}

impl EngineConfig {
    pub fn new(
        formulary_path: PathBuf,
        default_variant: SchwartzVariant,
        default_age_category: AgeCategory,
    ) -> DosingResult<Self> {
        if formulary_path.as_os_str().is_empty() {
            return Err(DosingError::InvalidInput(
                "formulary_path cannot be empty".into(),
            ));
        }

        Ok(Self {
            formulary_path,
            default_variant,
            default_age_category,
        })
    }

    pub fn formulary_path(&self) -> &Path {
        &self.formulary_path
    }

    pub fn default_variant(&self) -> SchwartzVariant {
        self.default_variant
    }

    pub fn default_age_category(&self) -> AgeCategory {
        self.default_age_category
    }
}

/// Resolve the formulary file without reading environment variables.
///
/// If `override_path` is provided it must be an existing file. Otherwise this looks for
/// `formulary/formulary.yaml` relative to the current working directory and then walks up from
/// `CARGO_MANIFEST_DIR`.
pub fn resolve_formulary_path(override_path: Option<PathBuf>) -> DosingResult<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path);
        }
        return Err(DosingError::InvalidInput(format!(
            "PEDS_FORMULARY_PATH override is not a file: {}",
            path.display()
        )));
    }

    let cwd_relative = PathBuf::from(DEFAULT_FORMULARY_PATH);
    if cwd_relative.is_file() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DEFAULT_FORMULARY_PATH);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(DosingError::InvalidInput(format!(
        "could not locate {DEFAULT_FORMULARY_PATH}"
    )))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the Schwartz variant from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the revised variant.
pub fn variant_from_env_value(value: Option<String>) -> DosingResult<SchwartzVariant> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<SchwartzVariant>())
        .transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse the default age category from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`AgeCategory::Child`].
pub fn age_category_from_env_value(value: Option<String>) -> DosingResult<AgeCategory> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<AgeCategory>())
        .transpose()?;

    Ok(parsed.unwrap_or_default())
}
