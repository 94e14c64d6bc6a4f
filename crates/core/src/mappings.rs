//! Resource ID mapping source.
//!
//! The mapping file is a headed CSV listing resources that already exist on the
//! target server, one per row. Only two columns matter and any others are ignored:
//!
//! ```text
//! resource_type,resource_id
//! Patient,1
//! Patient,2
//! Encounter,17
//! ```
//!
//! The generator only consumes the `Patient` ids, but the whole file is indexed so
//! other resource types remain available to callers.

use crate::constants::{PATIENT_RESOURCE_TYPE, RESOURCE_ID_COLUMN, RESOURCE_TYPE_COLUMN};
use crate::{CoreError, CoreResult};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use vitals_types::NonEmptyText;

/// Resource ids grouped by resource type, in file order.
#[derive(Clone, Debug, Default)]
pub struct ResourceIdIndex {
    by_type: HashMap<String, Vec<NonEmptyText>>,
}

impl ResourceIdIndex {
    /// Read and index a mapping file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MappingOpen`] if the file cannot be opened, and the errors
    /// of [`ResourceIdIndex::from_reader`] for its content.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let file = File::open(path).map_err(|source| CoreError::MappingOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Read and index mapping CSV from any reader.
    ///
    /// Rows of other resource types are indexed when complete and skipped
    /// otherwise; only `Patient` rows are validated.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MappingRead`] for unreadable CSV,
    /// - [`CoreError::MappingColumn`] if a required column is missing,
    /// - [`CoreError::InvalidInput`] if a `Patient` row has a blank id.
    pub fn from_reader<R: Read>(reader: R) -> CoreResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(CoreError::MappingColumn(name))
        };
        let type_idx = column(RESOURCE_TYPE_COLUMN)?;
        let id_idx = column(RESOURCE_ID_COLUMN)?;

        let mut by_type: HashMap<String, Vec<NonEmptyText>> = HashMap::new();
        let mut skipped = 0usize;
        for record in csv_reader.records() {
            let record = record?;
            let resource_type = record.get(type_idx).unwrap_or_default();
            let resource_id = NonEmptyText::new(record.get(id_idx).unwrap_or_default());

            let resource_id = match resource_id {
                Ok(id) if !resource_type.is_empty() => id,
                Err(_) if resource_type == PATIENT_RESOURCE_TYPE => {
                    let line = record.position().map(|p| p.line()).unwrap_or_default();
                    return Err(CoreError::InvalidInput(format!(
                        "mapping file line {line}: blank {RESOURCE_ID_COLUMN}"
                    )));
                }
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            by_type
                .entry(resource_type.to_string())
                .or_default()
                .push(resource_id);
        }

        if skipped > 0 {
            tracing::debug!("skipped {skipped} incomplete non-Patient mapping rows");
        }
        Ok(Self { by_type })
    }

    /// All ids recorded for `resource_type`, in file order (duplicates kept).
    pub fn ids(&self, resource_type: &str) -> &[NonEmptyText] {
        self.by_type
            .get(resource_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Distinct patient ids in order of first appearance.
    pub fn patient_ids(&self) -> Vec<NonEmptyText> {
        let mut seen = HashSet::new();
        self.ids(PATIENT_RESOURCE_TYPE)
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}

/// Load the patient universe for generation.
///
/// # Errors
///
/// Fails if the mapping file is missing or malformed, or if it contains no
/// `Patient` rows (there would be nothing to generate).
pub fn load_patient_ids(path: &Path) -> CoreResult<Vec<NonEmptyText>> {
    let index = ResourceIdIndex::from_path(path)?;
    let patients = index.patient_ids();
    if patients.is_empty() {
        return Err(CoreError::NoPatients {
            path: path.to_path_buf(),
        });
    }
    tracing::debug!(
        "loaded {} patient ids from {}",
        patients.len(),
        path.display()
    );
    Ok(patients)
}
