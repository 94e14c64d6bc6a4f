//! FHIR R4 wire support for the synthetic vitals generator.
//!
//! This crate provides **wire models** and **format helpers** for the resources the
//! generator fabricates and the uploader submits:
//! - `Device` and `Observation` resources and the datatypes they are built from
//! - the fixed device and vital-sign catalogs (SNOMED CT, LOINC, UCUM)
//! - strict JSON parsing of persisted resource lists
//! - searchset `Bundle` entry extraction for read-back
//!
//! This crate focuses on:
//! - FHIR semantic alignment for the handful of elements the generator emits
//! - serialisation/deserialisation with stable field order
//! - static dispatch from a `resourceType` tag to its parser
//!
//! HTTP transport lives in `vitals-core`; nothing here performs I/O.

pub mod bundle;
pub mod catalog;
pub mod datatypes;
pub mod device;
pub mod observation;
pub mod resource;

// Re-export facades
pub use bundle::Bundle;
pub use device::Device;
pub use observation::Observation;
pub use resource::{FhirResource, ResourceKind};

// Re-export public domain-level types
pub use catalog::{DeviceType, ObservationType, ValueRange, DEVICE_TYPES, OBSERVATION_TYPES};
pub use datatypes::{CodeableConcept, Coding, Quantity, QuantityValue, Reference};

/// Media type used for both request bodies and accepted responses.
pub const FHIR_JSON_CONTENT_TYPE: &str = "application/fhir+json";

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
