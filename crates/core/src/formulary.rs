//! Immutable in-memory formulary.
//!
//! Drug records are loaded once and then shared read-only. Cloning a [`Formulary`] is cheap and
//! never copies the records.

use crate::{DosingError, DosingResult};
use peds_formulary::FormularyDocument;
use peds_types::DrugRecord;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Drug records indexed by their stable id.
#[derive(Clone, Debug)]
pub struct Formulary {
    drugs: Arc<[DrugRecord]>,
    index: Arc<HashMap<String, usize>>,
}

impl Formulary {
    /// Builds a formulary, keeping the given record order.
    ///
    /// # Errors
    ///
    /// Returns [`DosingError::DuplicateDrug`] if two records share an id.
    pub fn from_records(records: Vec<DrugRecord>) -> DosingResult<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (position, drug) in records.iter().enumerate() {
            if index.insert(drug.id.as_str().to_owned(), position).is_some() {
                return Err(DosingError::DuplicateDrug(drug.id.to_string()));
            }
        }

        Ok(Self {
            drugs: records.into(),
            index: Arc::new(index),
        })
    }

    /// Parses a formulary from YAML text.
    pub fn parse(yaml_text: &str) -> DosingResult<Self> {
        Self::from_records(FormularyDocument::parse(yaml_text)?)
    }

    /// Loads a formulary YAML file.
    pub fn load(path: &Path) -> DosingResult<Self> {
        let formulary = Self::from_records(FormularyDocument::read_file(path)?)?;
        tracing::info!(path = %path.display(), drugs = formulary.len(), "loaded formulary");
        Ok(formulary)
    }

    pub fn get(&self, id: &str) -> Option<&DrugRecord> {
        self.index.get(id).map(|&position| &self.drugs[position])
    }

    /// As [`Formulary::get`], failing with [`DosingError::UnknownDrug`].
    pub fn require(&self, id: &str) -> DosingResult<&DrugRecord> {
        self.get(id)
            .ok_or_else(|| DosingError::UnknownDrug(id.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrugRecord> {
        self.drugs.iter()
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }
}
