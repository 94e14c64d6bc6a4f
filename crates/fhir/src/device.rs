//! FHIR `Device` wire model for simulated wearables and home-monitoring devices.
//!
//! Field order in the struct is the field order on disk and on the wire; keep it
//! stable so persisted files re-render byte-for-byte.

use crate::catalog::DeviceType;
use crate::datatypes::{CodeableConcept, Reference};
use crate::resource::FhirResource;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Device {
    pub resource_type: String,

    pub id: String,

    #[serde(rename = "type")]
    pub device_type: CodeableConcept,

    /// Owning patient.
    pub patient: Reference,

    pub manufacturer: String,

    pub model_number: String,

    pub serial_number: String,
}

impl Device {
    /// Assemble a device of a catalog type owned by `patient_id`.
    pub fn new(
        id: String,
        device_type: &DeviceType,
        patient_id: &str,
        manufacturer: String,
        model_number: String,
        serial_number: String,
    ) -> Self {
        Self {
            resource_type: Self::RESOURCE_TYPE.to_string(),
            id,
            device_type: device_type.to_concept(),
            patient: Reference::patient(patient_id),
            manufacturer,
            model_number,
            serial_number,
        }
    }

    /// Id of the owning patient, if the reference is well formed.
    pub fn patient_id(&self) -> Option<&str> {
        self.patient.id_for("Patient")
    }
}

impl FhirResource for Device {
    const RESOURCE_TYPE: &'static str = "Device";

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn id(&self) -> &str {
        &self.id
    }
}
