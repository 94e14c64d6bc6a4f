//! End-to-end stages shared by the binaries.

use crate::config::CoreConfig;
use crate::generator::{generate_batch, GenerationSummary};
use crate::mappings::load_patient_ids;
use crate::storage::{read_raw_resources, write_batch, BatchFiles};
use crate::transport::FhirTransport;
use crate::upload::{
    prepare_all, upload_batch, upload_concurrent, upload_sequential, BatchReport, UploadReport,
};
use crate::CoreResult;
use fhir::ResourceKind;
use std::path::Path;
use std::sync::Arc;

/// Load patients, generate a batch and persist it under the configured output directory.
pub fn generate_to_disk(config: &CoreConfig) -> CoreResult<(GenerationSummary, BatchFiles)> {
    let patients = load_patient_ids(config.mappings_path())?;
    let batch = generate_batch(&patients);
    let files = write_batch(config.output_dir(), &batch)?;

    let summary = batch.summary();
    tracing::info!("{summary}");
    Ok((summary, files))
}

/// Read both persisted files and upload them, devices first.
///
/// The files are forwarded as raw JSON objects, so records that would fail strict
/// validation are still sent.
pub async fn upload_from_disk<T>(config: &CoreConfig, transport: Arc<T>) -> CoreResult<BatchReport>
where
    T: FhirTransport + ?Sized + 'static,
{
    let devices = prepare_all(
        &read_raw_resources(&config.devices_path())?,
        ResourceKind::Device,
    )?;
    let observations = prepare_all(
        &read_raw_resources(&config.observations_path())?,
        ResourceKind::Observation,
    )?;
    upload_batch(transport, devices, observations, config.upload_workers()).await
}

/// Upload a single persisted file of `kind`.
///
/// Devices use the worker pool; observations are sent sequentially.
pub async fn upload_file<T>(
    path: &Path,
    kind: ResourceKind,
    transport: Arc<T>,
    workers: usize,
) -> CoreResult<UploadReport>
where
    T: FhirTransport + ?Sized + 'static,
{
    let requests = prepare_all(&read_raw_resources(path)?, kind)?;
    match kind {
        ResourceKind::Device => upload_concurrent(transport, requests, workers).await,
        ResourceKind::Observation => Ok(upload_sequential(transport.as_ref(), requests).await),
    }
}
