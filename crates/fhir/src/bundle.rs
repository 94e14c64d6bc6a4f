//! Searchset `Bundle` reading.
//!
//! Search responses come from arbitrary servers and carry many elements this
//! workspace does not model, so unlike the resource wire types this struct is
//! lenient: unknown keys are ignored and entries without a resource are skipped.

use crate::{FhirError, FhirResult};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
pub struct Bundle {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BundleEntry {
    #[serde(default)]
    pub resource: Option<Value>,
}

impl Bundle {
    /// Parse a Bundle from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if `resourceType` is not `Bundle`.
    pub fn parse(json_text: &str) -> FhirResult<Self> {
        let bundle: Bundle = serde_json::from_str(json_text)?;
        if bundle.resource_type != "Bundle" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Bundle', got '{}'",
                bundle.resource_type
            )));
        }
        Ok(bundle)
    }

    /// The `entry[].resource` values, in entry order.
    pub fn into_resources(self) -> Vec<Value> {
        self.entry.into_iter().filter_map(|e| e.resource).collect()
    }
}
