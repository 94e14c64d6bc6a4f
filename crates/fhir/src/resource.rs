//! Resource-type tagging, strict list parsing and static type dispatch.
//!
//! Persisted resource files are JSON arrays of a single resource type. Parsing goes
//! through `serde_path_to_error` so a schema mismatch reports the failing path
//! (for example `[3].valueQuantity.unit`) instead of only a line/column.
//!
//! [`ResourceKind`] maps a `resourceType` tag to a statically defined parser. There
//! is deliberately no runtime model construction: an unknown tag is an error.

use crate::{Device, FhirError, FhirResult, Observation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A FHIR resource that can be persisted and submitted as a create.
pub trait FhirResource: Serialize + DeserializeOwned {
    /// The `resourceType` tag every valid instance carries.
    const RESOURCE_TYPE: &'static str;

    /// The `resourceType` tag of this instance, as read or generated.
    fn resource_type(&self) -> &str;

    /// Logical id of this instance.
    fn id(&self) -> &str;
}

/// Parse a JSON array of resources of type `T`.
///
/// # Errors
///
/// Returns [`FhirError::Translation`] if the JSON does not match the wire schema
/// (unknown keys, wrong types, missing fields), and [`FhirError::InvalidInput`] if
/// any element carries a `resourceType` other than `T::RESOURCE_TYPE`.
pub fn parse_resources<T: FhirResource>(json_text: &str) -> FhirResult<Vec<T>> {
    let mut deserializer = serde_json::Deserializer::from_str(json_text);

    let resources = match serde_path_to_error::deserialize::<_, Vec<T>>(&mut deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(FhirError::Translation(format!(
                "{} schema mismatch at {path}: {source}",
                T::RESOURCE_TYPE
            )));
        }
    };
    deserializer.end()?;

    if let Some((index, bad)) = resources
        .iter()
        .enumerate()
        .find(|(_, r)| r.resource_type() != T::RESOURCE_TYPE)
    {
        return Err(FhirError::InvalidInput(format!(
            "Expected resourceType '{}' at index {index}, got '{}'",
            T::RESOURCE_TYPE,
            bad.resource_type()
        )));
    }

    Ok(resources)
}

/// Render resources as a pretty-printed JSON array (two-space indent, trailing newline).
pub fn render_resources<T: FhirResource>(resources: &[T]) -> FhirResult<String> {
    let mut text = serde_json::to_string_pretty(resources)?;
    text.push('\n');
    Ok(text)
}

/// Resource types this workspace knows how to parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Device,
    Observation,
}

impl ResourceKind {
    /// Resolve a `resourceType` tag.
    pub fn from_tag(tag: &str) -> FhirResult<Self> {
        match tag {
            "Device" => Ok(ResourceKind::Device),
            "Observation" => Ok(ResourceKind::Observation),
            other => Err(FhirError::InvalidInput(format!(
                "unsupported resourceType '{other}'"
            ))),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ResourceKind::Device => Device::RESOURCE_TYPE,
            ResourceKind::Observation => Observation::RESOURCE_TYPE,
        }
    }

    /// Determine the kind of a persisted list from its first element.
    ///
    /// An empty array has no kind and is reported as invalid input.
    pub fn detect(json_text: &str) -> FhirResult<Self> {
        #[derive(Deserialize)]
        struct Tagged {
            #[serde(rename = "resourceType")]
            resource_type: String,
        }

        let tagged: Vec<Tagged> = serde_json::from_str(json_text)?;
        let first = tagged.first().ok_or_else(|| {
            FhirError::InvalidInput("cannot detect resourceType of an empty list".into())
        })?;
        Self::from_tag(&first.resource_type)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}
