//! Constants used throughout the vitals core crate.
//!
//! File names, column names and generation parameters live here so the
//! generator, serializer and binaries agree on them.

/// Default directory for generated resource files when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "fhir_output";

/// Default mapping file location when none is configured.
pub const DEFAULT_MAPPINGS_PATH: &str = "mappings.csv";

/// Filename for the generated device list.
pub const DEVICES_FILENAME: &str = "devices.json";

/// Filename for the generated observation list.
pub const OBSERVATIONS_FILENAME: &str = "observations.json";

/// Mapping file column holding the resource type discriminator.
pub const RESOURCE_TYPE_COLUMN: &str = "resource_type";

/// Mapping file column holding the resource id.
pub const RESOURCE_ID_COLUMN: &str = "resource_id";

/// Resource type whose ids seed generation.
pub const PATIENT_RESOURCE_TYPE: &str = "Patient";

/// Default number of concurrent device uploads.
pub const DEFAULT_UPLOAD_WORKERS: usize = 12;

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Inclusive bounds on devices generated per patient.
pub const DEVICES_PER_PATIENT: (usize, usize) = (1, 3);

/// Inclusive bounds on observations generated per vital-sign type per patient.
pub const OBSERVATIONS_PER_TYPE: (usize, usize) = (2, 4);

/// Maximum whole days an observation timestamp lies in the past.
pub const LOOKBACK_DAYS: i64 = 30;

/// Maximum extra minutes subtracted on top of the day offset.
pub const LOOKBACK_MINUTES: i64 = 1440;
