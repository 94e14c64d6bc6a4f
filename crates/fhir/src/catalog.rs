//! Fixed device and vital-sign catalogs.
//!
//! These values are part of the interoperability contract of the generated data:
//! codes, displays and units must match the SNOMED CT, LOINC and UCUM entries the
//! target FHIR server indexes on. Do not edit them without checking the terminology.

use crate::datatypes::{CodeableConcept, Coding};

pub const SNOMED_SYSTEM: &str = "http://snomed.info/sct";
pub const LOINC_SYSTEM: &str = "http://loinc.org";
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";
pub const OBSERVATION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/observation-category";

pub const VITAL_SIGNS_CODE: &str = "vital-signs";
pub const VITAL_SIGNS_DISPLAY: &str = "Vital Signs";

/// A static coding entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogCode {
    pub system: &'static str,
    pub code: &'static str,
    pub display: &'static str,
}

impl CatalogCode {
    pub fn to_coding(&self) -> Coding {
        Coding {
            system: self.system.to_string(),
            code: self.code.to_string(),
            display: self.display.to_string(),
        }
    }
}

/// A category of simulated device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceType {
    /// Short human label, emitted as `Device.type.text`.
    pub text: &'static str,
    pub code: CatalogCode,
}

impl DeviceType {
    /// `Device.type` for this catalog entry.
    pub fn to_concept(&self) -> CodeableConcept {
        CodeableConcept {
            coding: vec![self.code.to_coding()],
            text: Some(self.text.to_string()),
        }
    }
}

/// Inclusive numeric bounds for a generated value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueRange {
    /// Whole-number values.
    Integer { min: i64, max: i64 },
    /// Values with one decimal place.
    Decimal { min: f64, max: f64 },
}

impl ValueRange {
    /// Bounds expressed in tenths, for sampling one-decimal values without
    /// floating-point drift. `None` for integer ranges.
    pub fn tenths(&self) -> Option<(i64, i64)> {
        match *self {
            ValueRange::Integer { .. } => None,
            ValueRange::Decimal { min, max } => {
                Some(((min * 10.0).round() as i64, (max * 10.0).round() as i64))
            }
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        match *self {
            ValueRange::Integer { min, max } => value >= min as f64 && value <= max as f64,
            ValueRange::Decimal { min, max } => value >= min && value <= max,
        }
    }
}

impl std::fmt::Display for ValueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            ValueRange::Integer { min, max } => write!(f, "{min}-{max}"),
            ValueRange::Decimal { min, max } => write!(f, "{min:.1}-{max:.1}"),
        }
    }
}

/// A vital-sign observation type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservationType {
    pub label: &'static str,
    pub code: CatalogCode,
    /// Human-readable unit, emitted as `valueQuantity.unit`.
    pub unit: &'static str,
    /// UCUM code, emitted as `valueQuantity.code`.
    pub unit_code: &'static str,
    pub range: ValueRange,
}

const fn snomed(code: &'static str, display: &'static str) -> CatalogCode {
    CatalogCode {
        system: SNOMED_SYSTEM,
        code,
        display,
    }
}

const fn loinc(code: &'static str, display: &'static str) -> CatalogCode {
    CatalogCode {
        system: LOINC_SYSTEM,
        code,
        display,
    }
}

pub const DEVICE_TYPES: [DeviceType; 4] = [
    DeviceType {
        text: "Smartwatch",
        code: snomed("706168006", "Smart watch device"),
    },
    DeviceType {
        text: "BP Cuff",
        code: snomed("705051002", "Blood pressure cuff"),
    },
    DeviceType {
        text: "Pulse Oximeter",
        code: snomed("706170002", "Pulse oximeter"),
    },
    DeviceType {
        text: "CGM",
        code: snomed("706171003", "Continuous glucose monitor"),
    },
];

pub const OBSERVATION_TYPES: [ObservationType; 14] = [
    ObservationType {
        label: "Heart rate",
        code: loinc("8867-4", "Heart rate"),
        unit: "beats/minute",
        unit_code: "bpm",
        range: ValueRange::Integer { min: 55, max: 110 },
    },
    ObservationType {
        label: "Respiratory rate",
        code: loinc("9279-1", "Respiratory rate"),
        unit: "breaths/minute",
        unit_code: "breaths/min",
        range: ValueRange::Integer { min: 12, max: 22 },
    },
    ObservationType {
        label: "Systolic blood pressure",
        code: loinc("8480-6", "Systolic blood pressure"),
        unit: "mmHg",
        unit_code: "mm[Hg]",
        range: ValueRange::Integer { min: 100, max: 140 },
    },
    ObservationType {
        label: "Diastolic blood pressure",
        code: loinc("8462-4", "Diastolic blood pressure"),
        unit: "mmHg",
        unit_code: "mm[Hg]",
        range: ValueRange::Integer { min: 60, max: 90 },
    },
    ObservationType {
        label: "Body temperature",
        code: loinc("8310-5", "Body temperature"),
        unit: "Celsius",
        unit_code: "Cel",
        range: ValueRange::Decimal { min: 36.0, max: 38.0 },
    },
    ObservationType {
        label: "Blood oxygen saturation (SpO2)",
        code: loinc("59408-5", "Oxygen saturation in Arterial blood"),
        unit: "%",
        unit_code: "%",
        range: ValueRange::Integer { min: 92, max: 100 },
    },
    ObservationType {
        label: "Heart rate variability",
        code: loinc("80372-6", "HRV (Standard deviation of NN intervals)"),
        unit: "ms",
        unit_code: "ms",
        range: ValueRange::Integer { min: 20, max: 120 },
    },
    ObservationType {
        label: "Skin temperature",
        code: loinc("8328-7", "Skin temperature"),
        unit: "Celsius",
        unit_code: "Cel",
        range: ValueRange::Decimal { min: 32.0, max: 36.0 },
    },
    ObservationType {
        label: "Glucose (CGM)",
        code: loinc("15074-8", "Glucose [Moles/volume] in Capillary blood"),
        unit: "mmol/L",
        unit_code: "mmol/L",
        range: ValueRange::Decimal { min: 3.5, max: 10.0 },
    },
    ObservationType {
        label: "Step count",
        code: loinc("41950-7", "Number of steps in 24 hours"),
        unit: "steps",
        unit_code: "steps",
        range: ValueRange::Integer { min: 1000, max: 20000 },
    },
    ObservationType {
        label: "Calories burned",
        code: loinc("41981-2", "Calories burned"),
        unit: "kcal",
        unit_code: "kcal",
        range: ValueRange::Integer { min: 1500, max: 4000 },
    },
    ObservationType {
        label: "Distance walked/run",
        code: loinc("41953-1", "Distance walked or run in 24 hours"),
        unit: "km",
        unit_code: "km",
        range: ValueRange::Decimal { min: 1.0, max: 20.0 },
    },
    ObservationType {
        label: "Duration of exercise",
        code: loinc("55411-3", "Exercise duration"),
        unit: "minutes",
        unit_code: "min",
        range: ValueRange::Integer { min: 10, max: 120 },
    },
    ObservationType {
        label: "Exercise heart rate",
        code: loinc("55423-8", "Heart rate during exercise"),
        unit: "beats/minute",
        unit_code: "bpm",
        range: ValueRange::Integer { min: 90, max: 170 },
    },
];

/// The `vital-signs` observation category.
pub fn vital_signs_category() -> CodeableConcept {
    CodeableConcept::from_coding(Coding {
        system: OBSERVATION_CATEGORY_SYSTEM.to_string(),
        code: VITAL_SIGNS_CODE.to_string(),
        display: VITAL_SIGNS_DISPLAY.to_string(),
    })
}

/// Look up an observation type by its LOINC code.
pub fn observation_type_by_code(code: &str) -> Option<&'static ObservationType> {
    OBSERVATION_TYPES.iter().find(|t| t.code.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn device_catalog_is_snomed_with_expected_codes() {
        let codes: Vec<_> = DEVICE_TYPES.iter().map(|d| d.code.code).collect();
        assert_eq!(codes, ["706168006", "705051002", "706170002", "706171003"]);
        assert!(DEVICE_TYPES.iter().all(|d| d.code.system == SNOMED_SYSTEM));
    }

    #[test]
    fn observation_catalog_has_fourteen_unique_loinc_codes() {
        assert_eq!(OBSERVATION_TYPES.len(), 14);
        let codes: HashSet<_> = OBSERVATION_TYPES.iter().map(|t| t.code.code).collect();
        assert_eq!(codes.len(), 14);
        assert!(OBSERVATION_TYPES
            .iter()
            .all(|t| t.code.system == LOINC_SYSTEM));
    }

    #[test]
    fn decimal_ranges_are_the_temperature_glucose_and_distance_types() {
        let decimal: Vec<_> = OBSERVATION_TYPES
            .iter()
            .filter(|t| matches!(t.range, ValueRange::Decimal { .. }))
            .map(|t| t.code.code)
            .collect();
        assert_eq!(decimal, ["8310-5", "8328-7", "15074-8", "41953-1"]);
    }

    #[test]
    fn tenths_bounds_are_exact() {
        let glucose = observation_type_by_code("15074-8").expect("glucose");
        assert_eq!(glucose.range.tenths(), Some((35, 100)));
        let heart_rate = observation_type_by_code("8867-4").expect("heart rate");
        assert_eq!(heart_rate.range.tenths(), None);
    }

    #[test]
    fn device_type_concept_carries_text_and_coding() {
        let concept = DEVICE_TYPES[1].to_concept();
        assert_eq!(concept.text.as_deref(), Some("BP Cuff"));
        assert_eq!(concept.coding.len(), 1);
        assert_eq!(concept.coding[0].display, "Blood pressure cuff");
    }

    #[test]
    fn vital_signs_category_matches_hl7_system() {
        let category = vital_signs_category();
        assert_eq!(category.coding[0].system, OBSERVATION_CATEGORY_SYSTEM);
        assert_eq!(category.coding[0].code, "vital-signs");
        assert_eq!(category.coding[0].display, "Vital Signs");
        assert!(category.text.is_none());
    }
}
