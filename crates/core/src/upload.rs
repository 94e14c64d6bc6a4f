//! Bulk submission of persisted resources to a FHIR server.
//!
//! Every resource is sent as an individual create. Devices fan out across a bounded
//! pool of tasks; observations go one at a time, in order, and only after every
//! device task has been joined. Each submission yields an [`UploadOutcome`] and a
//! failed submission never stops the rest of the batch. There is no retry and no
//! rollback.
//!
//! Resources are forwarded as the JSON objects read from disk. Only the
//! `resourceType` tag and the `id` are looked at.

use crate::transport::FhirTransport;
use crate::{CoreError, CoreResult};
use fhir::{FhirError, ResourceKind};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A resource serialised and ready to send.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    pub resource_type: String,
    pub id: String,
    pub body: Vec<u8>,
}

impl PreparedRequest {
    /// Prepare a raw resource object.
    ///
    /// The endpoint comes from its `resourceType`, or `kind` when the tag is
    /// absent. A missing `id` is recorded as empty.
    pub fn from_value(value: &Value, kind: ResourceKind) -> CoreResult<Self> {
        let resource_type = value
            .get("resourceType")
            .and_then(Value::as_str)
            .unwrap_or(kind.tag())
            .to_string();
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let body = serde_json::to_vec(value).map_err(FhirError::from)?;

        Ok(Self {
            resource_type,
            id,
            body,
        })
    }
}

/// Serialise a whole list up front.
pub fn prepare_all(values: &[Value], kind: ResourceKind) -> CoreResult<Vec<PreparedRequest>> {
    values
        .iter()
        .map(|value| PreparedRequest::from_value(value, kind))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadStatus {
    /// The server answered 200 or 201.
    Posted { status: u16 },
    /// The server answered with any other status.
    Rejected { status: u16, body: String },
    /// No HTTP response was recorded: the request failed or its task died.
    Unreachable { error: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadOutcome {
    pub resource_type: String,
    pub id: String,
    pub status: UploadStatus,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, UploadStatus::Posted { .. })
    }

    /// HTTP status, if a response was received.
    pub fn http_status(&self) -> Option<u16> {
        match self.status {
            UploadStatus::Posted { status } | UploadStatus::Rejected { status, .. } => Some(status),
            UploadStatus::Unreachable { .. } => None,
        }
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            UploadStatus::Posted { status } => {
                write!(f, "Posted {}/{}: {}", self.resource_type, self.id, status)
            }
            UploadStatus::Rejected { status, body } => write!(
                f,
                "Failed to post {}/{}: {} {}",
                self.resource_type, self.id, status, body
            ),
            UploadStatus::Unreachable { error } => write!(
                f,
                "Failed to post {}/{}: {}",
                self.resource_type, self.id, error
            ),
        }
    }
}

/// Outcomes of one upload pass, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub devices: UploadReport,
    pub observations: UploadReport,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.devices.failed() + self.observations.failed()
    }
}

/// Send one create and classify the result. Never fails.
pub async fn submit_one<T>(transport: &T, request: PreparedRequest) -> UploadOutcome
where
    T: FhirTransport + ?Sized,
{
    let PreparedRequest {
        resource_type,
        id,
        body,
    } = request;

    let status = match transport.create(&resource_type, body).await {
        Ok(response) if response.is_created_or_ok() => UploadStatus::Posted {
            status: response.status,
        },
        Ok(response) => UploadStatus::Rejected {
            status: response.status,
            body: response.body,
        },
        Err(err) => UploadStatus::Unreachable {
            error: err.to_string(),
        },
    };

    let outcome = UploadOutcome {
        resource_type,
        id,
        status,
    };
    if outcome.is_success() {
        tracing::info!("{outcome}");
    } else {
        tracing::warn!("{outcome}");
    }
    outcome
}

/// Submit requests on at most `workers` concurrent tasks and wait for all of them.
///
/// A task that dies before reporting is recorded as a failed outcome for its
/// request; the remaining tasks still run to completion.
///
/// # Errors
///
/// Returns [`CoreError::WorkerPoolClosed`] if the pool's semaphore is closed.
/// Per-request failures are outcomes.
pub async fn upload_concurrent<T>(
    transport: Arc<T>,
    requests: Vec<PreparedRequest>,
    workers: usize,
) -> CoreResult<UploadReport>
where
    T: FhirTransport + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();
    let mut task_index = HashMap::with_capacity(requests.len());
    let labels: Vec<(String, String)> = requests
        .iter()
        .map(|r| (r.resource_type.clone(), r.id.clone()))
        .collect();

    for (index, request) in requests.into_iter().enumerate() {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|_| CoreError::WorkerPoolClosed)?;
        let transport = Arc::clone(&transport);
        let handle = tasks.spawn(async move {
            let _permit = permit;
            (index, submit_one(transport.as_ref(), request).await)
        });
        task_index.insert(handle.id(), index);
    }

    let mut slots: Vec<Option<UploadOutcome>> = vec![None; labels.len()];
    let mut task_errors: HashMap<usize, String> = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(err) => {
                if let Some(&index) = task_index.get(&err.id()) {
                    task_errors.insert(index, err.to_string());
                }
            }
        }
    }

    let outcomes = slots
        .into_iter()
        .zip(labels)
        .enumerate()
        .map(|(index, (slot, (resource_type, id)))| {
            slot.unwrap_or_else(|| {
                let error = task_errors
                    .remove(&index)
                    .unwrap_or_else(|| "upload task did not complete".into());
                let outcome = UploadOutcome {
                    resource_type,
                    id,
                    status: UploadStatus::Unreachable {
                        error: format!("upload task failed: {error}"),
                    },
                };
                tracing::warn!("{outcome}");
                outcome
            })
        })
        .collect();

    Ok(UploadReport { outcomes })
}

/// Submit requests one at a time, in order.
pub async fn upload_sequential<T>(transport: &T, requests: Vec<PreparedRequest>) -> UploadReport
where
    T: FhirTransport + ?Sized,
{
    let mut outcomes = Vec::with_capacity(requests.len());
    for request in requests {
        outcomes.push(submit_one(transport, request).await);
    }
    UploadReport { outcomes }
}

/// Upload devices concurrently, then observations sequentially.
///
/// Observations are not started until every device task has finished, so a
/// server that validates references sees each device before the observations
/// pointing at it. References are not checked here.
pub async fn upload_batch<T>(
    transport: Arc<T>,
    devices: Vec<PreparedRequest>,
    observations: Vec<PreparedRequest>,
    workers: usize,
) -> CoreResult<BatchReport>
where
    T: FhirTransport + ?Sized + 'static,
{
    tracing::info!("uploading {} devices on {} workers", devices.len(), workers);
    let devices = upload_concurrent(Arc::clone(&transport), devices, workers).await?;
    tracing::info!(
        "devices done: {} posted, {} failed",
        devices.succeeded(),
        devices.failed()
    );

    tracing::info!("uploading {} observations", observations.len());
    let observations = upload_sequential(transport.as_ref(), observations).await;
    tracing::info!(
        "observations done: {} posted, {} failed",
        observations.succeeded(),
        observations.failed()
    );

    Ok(BatchReport {
        devices,
        observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Generator;
    use crate::transport::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use fhir::{Device, FhirResource, Observation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use vitals_types::NonEmptyText;

    /// In-memory server: answers 201 unless the id is listed as failing or unreachable.
    #[derive(Default)]
    struct FakeServer {
        failing: HashSet<String>,
        panicking: HashSet<String>,
        unreachable: HashSet<String>,
        log: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl FakeServer {
        fn events(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FhirTransport for FakeServer {
        async fn create(
            &self,
            resource_type: &str,
            body: Vec<u8>,
        ) -> Result<TransportResponse, TransportError> {
            let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
            let id = value["id"].as_str().unwrap_or_default().to_string();
            if self.panicking.contains(&id) {
                panic!("transport bug while posting {id}");
            }

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.log
                .lock()
                .unwrap()
                .push(format!("start {resource_type}/{id}"));

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.log
                .lock()
                .unwrap()
                .push(format!("end {resource_type}/{id}"));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.unreachable.contains(&id) {
                return Err(TransportError::Request("connection refused".into()));
            }
            if self.failing.contains(&id) {
                return Ok(TransportResponse::new(500, "internal error"));
            }
            Ok(TransportResponse::new(201, ""))
        }

        async fn search(
            &self,
            _resource_type: &str,
            _param: &str,
            _value: &str,
        ) -> Result<TransportResponse, TransportError> {
            Ok(TransportResponse::new(404, ""))
        }
    }

    fn requests<T: FhirResource>(resources: &[T], kind: ResourceKind) -> Vec<PreparedRequest> {
        let values: Vec<Value> = resources
            .iter()
            .map(|r| serde_json::to_value(r).unwrap())
            .collect();
        prepare_all(&values, kind).unwrap()
    }

    fn batch(patients: &[&str]) -> (Vec<Device>, Vec<Observation>) {
        let patients: Vec<_> = patients
            .iter()
            .map(|p| NonEmptyText::new(p).unwrap())
            .collect();
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let generated = Generator::new(StdRng::seed_from_u64(8), now).generate(&patients);
        (generated.devices, generated.observations)
    }

    fn devices(n: usize) -> Vec<Device> {
        let mut all = Vec::new();
        let mut seed = 0;
        while all.len() < n {
            let now = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
            let patient = NonEmptyText::new(format!("p{seed}")).unwrap();
            let generated = Generator::new(StdRng::seed_from_u64(seed), now).generate(&[patient]);
            all.extend(generated.devices);
            seed += 1;
        }
        all.truncate(n);
        all
    }

    #[tokio::test]
    async fn one_server_error_among_five_devices_does_not_stop_the_batch() {
        let devices = devices(5);
        let server = Arc::new(FakeServer {
            failing: HashSet::from([devices[2].id.clone()]),
            ..FakeServer::default()
        });

        let report = upload_concurrent(Arc::clone(&server), requests(&devices, ResourceKind::Device), 12)
            .await
            .expect("upload");

        assert_eq!(report.len(), 5);
        assert_eq!(report.succeeded(), 4);
        assert_eq!(report.failed(), 1);

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.id, devices[2].id);
        assert_eq!(failure.http_status(), Some(500));
        assert_eq!(
            failure.to_string(),
            format!("Failed to post Device/{}: 500 internal error", devices[2].id)
        );
    }

    #[tokio::test]
    async fn outcomes_keep_input_order_and_success_lines_read_posted() {
        let devices = devices(8);
        let server = Arc::new(FakeServer {
            delay: Duration::from_millis(5),
            ..FakeServer::default()
        });

        let report = upload_concurrent(server, requests(&devices, ResourceKind::Device), 3)
            .await
            .expect("upload");

        let ids: Vec<_> = report.outcomes.iter().map(|o| o.id.clone()).collect();
        let expected: Vec<_> = devices.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, expected);
        assert_eq!(
            report.outcomes[0].to_string(),
            format!("Posted Device/{}: 201", devices[0].id)
        );
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_worker_count() {
        let devices = devices(20);
        let server = Arc::new(FakeServer {
            delay: Duration::from_millis(10),
            ..FakeServer::default()
        });

        upload_concurrent(Arc::clone(&server), requests(&devices, ResourceKind::Device), 4)
            .await
            .expect("upload");

        let peak = server.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak {peak}");
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn network_failures_are_recorded_per_item() {
        let devices = devices(3);
        let server = Arc::new(FakeServer {
            unreachable: HashSet::from([devices[0].id.clone()]),
            ..FakeServer::default()
        });

        let report = upload_concurrent(server, requests(&devices, ResourceKind::Device), 2)
            .await
            .expect("upload");
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes[0].http_status(), None);
        assert!(report.outcomes[0]
            .to_string()
            .contains("connection refused"));
    }

    #[tokio::test]
    async fn observations_start_only_after_every_device_finished() {
        let (devices, observations) = batch(&["p1", "p2"]);
        let server = Arc::new(FakeServer {
            delay: Duration::from_millis(2),
            ..FakeServer::default()
        });

        let report = upload_batch(
            Arc::clone(&server),
            requests(&devices, ResourceKind::Device),
            requests(&observations, ResourceKind::Observation),
            12,
        )
            .await
            .expect("upload");
        assert_eq!(report.devices.succeeded(), devices.len());
        assert_eq!(report.observations.succeeded(), observations.len());
        assert_eq!(report.failed(), 0);

        let events = server.events();
        let last_device_end = events
            .iter()
            .rposition(|e| e.starts_with("end Device/"))
            .unwrap();
        let first_observation_start = events
            .iter()
            .position(|e| e.starts_with("start Observation/"))
            .unwrap();
        assert!(last_device_end < first_observation_start);
    }

    #[tokio::test]
    async fn observations_are_sent_one_at_a_time_in_file_order() {
        let (_, observations) = batch(&["p1"]);
        let server = FakeServer {
            delay: Duration::from_millis(1),
            ..FakeServer::default()
        };

        let report = upload_sequential(&server, requests(&observations, ResourceKind::Observation)).await;
        assert_eq!(report.len(), observations.len());
        assert_eq!(server.peak.load(Ordering::SeqCst), 1);

        let started: Vec<_> = server
            .events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("start Observation/").map(str::to_string))
            .collect();
        let expected: Vec<_> = observations.iter().map(|o| o.id.clone()).collect();
        assert_eq!(started, expected);
    }

    #[tokio::test]
    async fn observation_with_dangling_device_reference_is_still_posted() {
        let (_, mut observations) = batch(&["p1"]);
        observations.truncate(1);
        observations[0].device = fhir::Reference::device("no-such-device");

        let server = Arc::new(FakeServer::default());
        let report = upload_batch(
            Arc::clone(&server),
            Vec::new(),
            requests(&observations, ResourceKind::Observation),
            12,
        )
            .await
            .expect("upload");

        assert!(report.devices.is_empty());
        assert_eq!(report.observations.succeeded(), 1);
        assert_eq!(server.events().len(), 2);
    }

    #[tokio::test]
    async fn a_dead_worker_is_recorded_and_the_batch_still_finishes() {
        let (devices, observations) = batch(&["p1", "p2"]);
        let server = Arc::new(FakeServer {
            panicking: HashSet::from([devices[0].id.clone()]),
            delay: Duration::from_millis(2),
            ..FakeServer::default()
        });

        let report = upload_batch(
            Arc::clone(&server),
            requests(&devices, ResourceKind::Device),
            requests(&observations, ResourceKind::Observation),
            2,
        )
        .await
        .expect("batch completes");

        assert_eq!(report.devices.len(), devices.len());
        assert_eq!(report.devices.failed(), 1);
        assert_eq!(report.devices.succeeded(), devices.len() - 1);
        let dead = &report.devices.outcomes[0];
        assert_eq!(dead.id, devices[0].id);
        assert_eq!(dead.http_status(), None);
        assert!(dead.to_string().contains("upload task failed"), "{dead}");
        assert_eq!(report.observations.succeeded(), observations.len());
    }

    #[test]
    fn prepared_request_forwards_the_raw_object() {
        let value = serde_json::json!({
            "resourceType": "Observation",
            "id": "o1",
            "meta": { "source": "elsewhere" },
            "status": "final"
        });
        let request = PreparedRequest::from_value(&value, ResourceKind::Observation).unwrap();
        assert_eq!(request.resource_type, "Observation");
        assert_eq!(request.id, "o1");
        let sent: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(sent, value);
    }

    #[test]
    fn prepared_request_defaults_missing_tag_and_id() {
        let value = serde_json::json!({ "status": "final" });
        let request = PreparedRequest::from_value(&value, ResourceKind::Device).unwrap();
        assert_eq!(request.resource_type, "Device");
        assert_eq!(request.id, "");
    }

    #[tokio::test]
    async fn records_with_unexpected_fields_are_still_posted() {
        let (_, observations) = batch(&["p1"]);
        let mut values: Vec<Value> = observations
            .iter()
            .map(|o| serde_json::to_value(o).unwrap())
            .collect();
        values[0]["meta"] = serde_json::json!({});

        let server = FakeServer::default();
        let report = upload_sequential(
            &server,
            prepare_all(&values, ResourceKind::Observation).unwrap(),
        )
        .await;
        assert_eq!(report.succeeded(), observations.len());
        assert_eq!(report.failed(), 0);
    }
}
