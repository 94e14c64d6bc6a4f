//! Persisted resource files.
//!
//! A generation pass is stored as two pretty-printed JSON arrays under the output
//! directory, `devices.json` and `observations.json`. Both are rendered in memory
//! before either is written, and each file is written to a sibling temporary file
//! and renamed into place, so a failed run never leaves a truncated array behind.

use crate::constants::{DEVICES_FILENAME, OBSERVATIONS_FILENAME};
use crate::generator::GeneratedBatch;
use crate::{CoreError, CoreResult};
use fhir::resource::{parse_resources, render_resources};
use fhir::{Device, FhirError, FhirResource, Observation, ResourceKind};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Locations of the files written for one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchFiles {
    pub devices: PathBuf,
    pub observations: PathBuf,
}

impl BatchFiles {
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            devices: output_dir.join(DEVICES_FILENAME),
            observations: output_dir.join(OBSERVATIONS_FILENAME),
        }
    }
}

/// Write a generated batch into `output_dir`, creating the directory if needed.
///
/// Existing files are replaced.
///
/// # Errors
///
/// Returns [`CoreError::OutputDirCreation`] if the directory cannot be created,
/// [`CoreError::FileWrite`] if a file cannot be written, and [`CoreError::Fhir`] if
/// rendering fails.
pub fn write_batch(output_dir: &Path, batch: &GeneratedBatch) -> CoreResult<BatchFiles> {
    let devices_json = render_resources(&batch.devices)?;
    let observations_json = render_resources(&batch.observations)?;

    fs::create_dir_all(output_dir).map_err(CoreError::OutputDirCreation)?;

    let files = BatchFiles::in_dir(output_dir);
    write_atomic(&files.devices, devices_json.as_bytes())?;
    write_atomic(&files.observations, observations_json.as_bytes())?;

    tracing::debug!(
        "wrote {} devices to {} and {} observations to {}",
        batch.devices.len(),
        files.devices.display(),
        batch.observations.len(),
        files.observations.display()
    );
    Ok(files)
}

/// Read and strictly parse a persisted list of `T`.
///
/// # Errors
///
/// Returns [`CoreError::FileRead`] if the file cannot be read, and
/// [`CoreError::Fhir`] if its content is not a valid list of `T`.
pub fn read_resources<T: FhirResource>(path: &Path) -> CoreResult<Vec<T>> {
    let text = fs::read_to_string(path).map_err(CoreError::FileRead)?;
    Ok(parse_resources(&text)?)
}

pub fn read_devices(path: &Path) -> CoreResult<Vec<Device>> {
    read_resources(path)
}

pub fn read_observations(path: &Path) -> CoreResult<Vec<Observation>> {
    read_resources(path)
}

/// Read a persisted list as untyped JSON objects, for forwarding to a server.
///
/// Only the array shape is checked. Fields the typed model does not know about
/// are kept as they are.
pub fn read_raw_resources(path: &Path) -> CoreResult<Vec<Value>> {
    let text = fs::read_to_string(path).map_err(CoreError::FileRead)?;
    serde_json::from_str(&text).map_err(|e| CoreError::Fhir(FhirError::from(e)))
}

/// Strictly parse the file at `path` and count its resources.
///
/// When `kind` is `None` it is taken from the first element's `resourceType`.
pub fn validate_file(path: &Path, kind: Option<ResourceKind>) -> CoreResult<(ResourceKind, usize)> {
    let kind = match kind {
        Some(kind) => kind,
        None => {
            let text = fs::read_to_string(path).map_err(CoreError::FileRead)?;
            ResourceKind::detect(&text)?
        }
    };
    let count = match kind {
        ResourceKind::Device => read_devices(path)?.len(),
        ResourceKind::Observation => read_observations(path)?.len(),
    };
    Ok((kind, count))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, bytes).map_err(CoreError::FileWrite)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CoreError::FileWrite(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Generator;
    use chrono::{TimeZone, Utc};
    use fhir::FhirError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;
    use vitals_types::NonEmptyText;

    fn batch() -> GeneratedBatch {
        let patients = vec![
            NonEmptyText::new("1").unwrap(),
            NonEmptyText::new("2").unwrap(),
        ];
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        Generator::new(StdRng::seed_from_u64(21), now).generate(&patients)
    }

    #[test]
    fn write_batch_creates_directory_and_both_files() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("nested").join("fhir_output");
        let batch = batch();

        let files = write_batch(&out, &batch).expect("write batch");
        assert_eq!(files, BatchFiles::in_dir(&out));
        assert!(files.devices.is_file());
        assert!(files.observations.is_file());
        assert!(!out.join("devices.json.tmp").exists());

        let devices = read_devices(&files.devices).expect("read devices");
        let observations = read_observations(&files.observations).expect("read observations");
        assert_eq!(devices, batch.devices);
        assert_eq!(observations, batch.observations);
    }

    #[test]
    fn persisted_files_re_render_byte_for_byte() {
        let temp = TempDir::new().unwrap();
        let files = write_batch(temp.path(), &batch()).expect("write batch");

        let on_disk = fs::read_to_string(&files.observations).unwrap();
        let reparsed: Vec<Observation> = read_resources(&files.observations).unwrap();
        assert_eq!(render_resources(&reparsed).unwrap(), on_disk);

        let on_disk = fs::read_to_string(&files.devices).unwrap();
        let reparsed: Vec<Device> = read_resources(&files.devices).unwrap();
        assert_eq!(render_resources(&reparsed).unwrap(), on_disk);
    }

    #[test]
    fn files_are_two_space_indented_arrays() {
        let temp = TempDir::new().unwrap();
        let files = write_batch(temp.path(), &batch()).expect("write batch");
        let text = fs::read_to_string(&files.devices).unwrap();
        assert!(text.starts_with("[\n  {\n    \"resourceType\": \"Device\""));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn rewriting_replaces_previous_content() {
        let temp = TempDir::new().unwrap();
        let files = write_batch(temp.path(), &batch()).expect("first write");
        write_batch(temp.path(), &GeneratedBatch::default()).expect("overwrite");
        assert_eq!(fs::read_to_string(&files.devices).unwrap(), "[]\n");
    }

    #[test]
    fn reading_a_missing_file_is_a_read_error() {
        let temp = TempDir::new().unwrap();
        let err = read_devices(&temp.path().join("devices.json")).expect_err("missing");
        assert!(matches!(err, CoreError::FileRead(_)));
    }

    #[test]
    fn reading_the_wrong_resource_type_is_rejected() {
        let temp = TempDir::new().unwrap();
        let files = write_batch(temp.path(), &batch()).expect("write batch");
        let err = read_devices(&files.observations).expect_err("observations are not devices");
        assert!(matches!(err, CoreError::Fhir(FhirError::Translation(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = TempDir::new().unwrap();
        let files = write_batch(temp.path(), &batch()).expect("write batch");
        let text = fs::read_to_string(&files.devices).unwrap();
        let tampered = text.replacen("\"manufacturer\"", "\"lotNumber\": \"x\",\n    \"manufacturer\"", 1);
        fs::write(&files.devices, tampered).unwrap();

        let err = read_devices(&files.devices).expect_err("unknown key");
        assert!(err.to_string().contains("lotNumber"), "{err}");
    }

    #[test]
    fn raw_read_keeps_fields_the_model_does_not_know() {
        let temp = TempDir::new().unwrap();
        let files = write_batch(temp.path(), &batch()).expect("write batch");
        let mut values: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&files.observations).unwrap()).unwrap();
        values[0]["meta"] = serde_json::json!({ "versionId": "1" });
        fs::write(&files.observations, serde_json::to_string(&values).unwrap()).unwrap();

        let raw = read_raw_resources(&files.observations).expect("raw read");
        assert_eq!(raw, values);
        assert!(read_observations(&files.observations).is_err());
    }

    #[test]
    fn raw_read_rejects_a_non_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("devices.json");
        fs::write(&path, "{\"resourceType\": \"Device\"}").unwrap();
        let err = read_raw_resources(&path).expect_err("object is not a list");
        assert!(matches!(err, CoreError::Fhir(_)));
    }

    #[test]
    fn validate_file_detects_kind_and_counts() {
        let temp = TempDir::new().unwrap();
        let batch = batch();
        let files = write_batch(temp.path(), &batch).expect("write batch");

        let (kind, count) = validate_file(&files.devices, None).expect("valid devices");
        assert_eq!(kind, ResourceKind::Device);
        assert_eq!(count, batch.devices.len());

        let (kind, count) =
            validate_file(&files.observations, Some(ResourceKind::Observation)).expect("valid");
        assert_eq!(kind, ResourceKind::Observation);
        assert_eq!(count, batch.observations.len());

        assert!(validate_file(&files.observations, Some(ResourceKind::Device)).is_err());
    }
}
