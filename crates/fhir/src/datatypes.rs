//! FHIR datatypes shared by the Device and Observation wire models.
//!
//! Only the elements the generator actually emits are modelled. All structs use
//! `#[serde(deny_unknown_fields)]` so a persisted file that drifts from the
//! emitted shape is rejected instead of silently dropping data.

use serde::{Deserialize, Serialize};

/// A single code from a terminology system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coding {
    pub system: String,
    pub code: String,
    pub display: String,
}

/// A concept expressed as one or more codings plus optional plain text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Concept holding a single coding and no text.
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            text: None,
        }
    }
}

/// A literal reference of the form `<ResourceType>/<id>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    /// Build a reference to `resource_type` with the given logical id.
    pub fn to(resource_type: &str, id: &str) -> Self {
        Self {
            reference: format!("{resource_type}/{id}"),
        }
    }

    pub fn patient(id: &str) -> Self {
        Self::to("Patient", id)
    }

    pub fn device(id: &str) -> Self {
        Self::to("Device", id)
    }

    /// Split into `(resource_type, id)`.
    ///
    /// Returns `None` when the reference is not a simple relative literal reference.
    pub fn split(&self) -> Option<(&str, &str)> {
        let (resource_type, id) = self.reference.split_once('/')?;
        if resource_type.is_empty() || id.is_empty() || id.contains('/') {
            return None;
        }
        Some((resource_type, id))
    }

    /// The referenced id, if this reference points at `resource_type`.
    pub fn id_for(&self, resource_type: &str) -> Option<&str> {
        self.split()
            .filter(|(rt, _)| *rt == resource_type)
            .map(|(_, id)| id)
    }
}

/// Numeric part of a quantity.
///
/// Whole numbers serialise without a decimal point; decimals carry their
/// fractional digits. Deserialisation tries the integer form first, so a value
/// written as `37.0` stays a decimal on re-read.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityValue {
    Integer(i64),
    Decimal(f64),
}

impl QuantityValue {
    pub fn as_f64(self) -> f64 {
        match self {
            QuantityValue::Integer(v) => v as f64,
            QuantityValue::Decimal(v) => v,
        }
    }
}

impl std::fmt::Display for QuantityValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityValue::Integer(v) => write!(f, "{v}"),
            QuantityValue::Decimal(v) => write!(f, "{v:?}"),
        }
    }
}

/// A measured amount with UCUM unit coding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Quantity {
    pub value: QuantityValue,
    pub unit: String,
    pub system: String,
    pub code: String,
}
