//! FHIR `Observation` wire model for a single vital-sign reading.

use crate::catalog::{vital_signs_category, ObservationType, UCUM_SYSTEM};
use crate::datatypes::{CodeableConcept, Quantity, QuantityValue, Reference};
use crate::resource::FhirResource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status written on every generated observation.
pub const FINAL_STATUS: &str = "final";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Observation {
    pub resource_type: String,

    pub id: String,

    pub status: String,

    pub category: Vec<CodeableConcept>,

    pub code: CodeableConcept,

    pub subject: Reference,

    /// Device that produced the reading. Always one of the subject's devices.
    pub device: Reference,

    /// ISO-8601 instant with a trailing `Z`, kept as text so files re-render verbatim.
    pub effective_date_time: String,

    pub value_quantity: Quantity,
}

impl Observation {
    /// Assemble a final vital-signs observation of `observation_type`.
    pub fn new(
        id: String,
        observation_type: &ObservationType,
        patient_id: &str,
        device_id: &str,
        effective: DateTime<Utc>,
        value: QuantityValue,
    ) -> Self {
        Self {
            resource_type: Self::RESOURCE_TYPE.to_string(),
            id,
            status: FINAL_STATUS.to_string(),
            category: vec![vital_signs_category()],
            code: CodeableConcept::from_coding(observation_type.code.to_coding()),
            subject: Reference::patient(patient_id),
            device: Reference::device(device_id),
            effective_date_time: format_effective(effective),
            value_quantity: Quantity {
                value,
                unit: observation_type.unit.to_string(),
                system: UCUM_SYSTEM.to_string(),
                code: observation_type.unit_code.to_string(),
            },
        }
    }

    pub fn patient_id(&self) -> Option<&str> {
        self.subject.id_for("Patient")
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device.id_for("Device")
    }

    /// LOINC code of the first coding.
    pub fn loinc_code(&self) -> Option<&str> {
        self.code.coding.first().map(|c| c.code.as_str())
    }

    /// Parsed `effectiveDateTime`, if it is a valid RFC 3339 instant.
    pub fn effective_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.effective_date_time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl FhirResource for Observation {
    const RESOURCE_TYPE: &'static str = "Observation";

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Format an instant as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn format_effective(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
