//! Read-back of uploaded resources via type-level search.

use crate::transport::FhirTransport;
use crate::{CoreError, CoreResult};
use fhir::{Bundle, Reference};
use serde_json::Value;

/// Search `resource_type` and return the resources of the searchset page.
///
/// # Errors
///
/// Returns [`CoreError::Search`] when the request fails or the server answers
/// with anything other than 200, and [`CoreError::Fhir`] when the body is not a
/// Bundle.
pub async fn search_resources<T>(
    transport: &T,
    resource_type: &str,
    param: &str,
    value: &str,
) -> CoreResult<Vec<Value>>
where
    T: FhirTransport + ?Sized,
{
    let response = transport
        .search(resource_type, param, value)
        .await
        .map_err(|e| CoreError::Search(format!("{resource_type}?{param}={value}: {e}")))?;

    if response.status != 200 {
        return Err(CoreError::Search(format!(
            "{resource_type}?{param}={value}: {} {}",
            response.status, response.body
        )));
    }

    let bundle = Bundle::parse(&response.body)?;
    Ok(bundle.into_resources())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientSummary {
    pub patient_id: String,
    pub devices: usize,
    pub observations: usize,
}

/// Count the devices and observations the server holds for one patient.
pub async fn patient_summary<T>(transport: &T, patient_id: &str) -> CoreResult<PatientSummary>
where
    T: FhirTransport + ?Sized,
{
    let patient = Reference::patient(patient_id).reference;
    let devices = search_resources(transport, "Device", "patient", &patient).await?;
    let observations = search_resources(transport, "Observation", "subject", &patient).await?;

    Ok(PatientSummary {
        patient_id: patient_id.to_string(),
        devices: devices.len(),
        observations: observations.len(),
    })
}
