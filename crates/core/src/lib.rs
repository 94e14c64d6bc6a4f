//! # Vitals Core
//!
//! Core logic for the synthetic vitals generator and bulk uploader.
//!
//! This crate contains:
//! - Patient id loading from the resource mapping CSV
//! - Device and Observation generation
//! - Persistence of generated batches as JSON resource lists
//! - Bulk upload to a FHIR server over an injectable transport
//! - Search read-back for checking what a server holds
//!
//! **No process concerns**: environment variables, logging setup and argument
//! parsing belong in the binaries (`vitals-run`, `vitals-cli`).

pub mod config;
pub mod constants;
pub mod error;
pub mod fabricate;
pub mod generator;
pub mod mappings;
pub mod pipeline;
pub mod search;
pub mod storage;
pub mod transport;
pub mod upload;

pub use config::{BasicAuth, CoreConfig, FhirServerConfig};
pub use error::{CoreError, CoreResult};
pub use generator::{generate_batch, GeneratedBatch, GenerationSummary, Generator};
pub use mappings::{load_patient_ids, ResourceIdIndex};
pub use pipeline::{generate_to_disk, upload_file, upload_from_disk};
pub use search::{patient_summary, search_resources, PatientSummary};
pub use storage::{
    read_devices, read_observations, read_raw_resources, validate_file, write_batch, BatchFiles,
};
pub use transport::{FhirTransport, HttpTransport, TransportError, TransportResponse};
pub use upload::{
    upload_batch, upload_concurrent, upload_sequential, BatchReport, UploadOutcome, UploadReport,
    UploadStatus,
};
