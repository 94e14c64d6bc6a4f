//! Synthetic Device and Observation generation.
//!
//! For every patient the generator fabricates 1-3 devices and then, for each of the
//! fourteen vital-sign types, 2-4 observations. Each observation references a device
//! drawn from *that patient's* devices, never from the global pool, so the
//! `subject` and `device` references of an observation always agree.
//!
//! Generation is pure in-memory computation. All randomness, including resource ids,
//! comes from the supplied RNG, and "now" is fixed at construction, so a seeded RNG
//! reproduces a batch exactly.

use crate::constants::{
    DEVICES_PER_PATIENT, LOOKBACK_DAYS, LOOKBACK_MINUTES, OBSERVATIONS_PER_TYPE,
};
use crate::fabricate;
use chrono::{DateTime, Duration, Utc};
use fhir::{Device, Observation, ObservationType, QuantityValue, ValueRange};
use fhir::{DEVICE_TYPES, OBSERVATION_TYPES};
use rand::Rng;
use std::fmt;
use vitals_types::NonEmptyText;

/// Everything produced by one generation pass, in generation order.
#[derive(Clone, Debug, Default)]
pub struct GeneratedBatch {
    pub devices: Vec<Device>,
    pub observations: Vec<Observation>,
    pub patient_count: usize,
}

impl GeneratedBatch {
    pub fn summary(&self) -> GenerationSummary {
        GenerationSummary {
            devices: self.devices.len(),
            observations: self.observations.len(),
            patients: self.patient_count,
        }
    }
}

/// Counts reported after generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationSummary {
    pub devices: usize,
    pub observations: usize,
    pub patients: usize,
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generated {} devices and {} observations for {} patients.",
            self.devices, self.observations, self.patients
        )
    }
}

pub struct Generator<R: Rng> {
    rng: R,
    now: DateTime<Utc>,
}

impl<R: Rng> Generator<R> {
    /// Create a generator drawing from `rng`, with timestamps measured back from `now`.
    pub fn new(rng: R, now: DateTime<Utc>) -> Self {
        Self { rng, now }
    }

    /// Generate devices and observations for every patient, in input order.
    pub fn generate(&mut self, patients: &[NonEmptyText]) -> GeneratedBatch {
        let mut batch = GeneratedBatch {
            patient_count: patients.len(),
            ..GeneratedBatch::default()
        };

        for patient in patients {
            let patient_id = patient.as_str();

            let (min_devices, max_devices) = DEVICES_PER_PATIENT;
            let device_count = self.rng.gen_range(min_devices..=max_devices);
            let patient_devices: Vec<Device> = (0..device_count)
                .map(|_| self.generate_device(patient_id))
                .collect();

            for observation_type in OBSERVATION_TYPES.iter() {
                let (min_obs, max_obs) = OBSERVATIONS_PER_TYPE;
                let observation_count = self.rng.gen_range(min_obs..=max_obs);
                for _ in 0..observation_count {
                    let device = &patient_devices[self.rng.gen_range(0..patient_devices.len())];
                    let observation =
                        self.generate_observation(observation_type, patient_id, &device.id);
                    batch.observations.push(observation);
                }
            }

            batch.devices.extend(patient_devices);
        }

        batch
    }

    fn generate_device(&mut self, patient_id: &str) -> Device {
        let device_type = &DEVICE_TYPES[self.rng.gen_range(0..DEVICE_TYPES.len())];
        let id = self.next_id();
        let manufacturer = fabricate::company(&mut self.rng);
        let model_number = fabricate::model_number(&mut self.rng);
        let serial_number = self.next_id();

        Device::new(
            id,
            device_type,
            patient_id,
            manufacturer,
            model_number,
            serial_number,
        )
    }

    fn generate_observation(
        &mut self,
        observation_type: &ObservationType,
        patient_id: &str,
        device_id: &str,
    ) -> Observation {
        let id = self.next_id();
        let effective = self.effective_time();
        let value = self.sample_value(&observation_type.range);

        Observation::new(id, observation_type, patient_id, device_id, effective, value)
    }

    /// A random (version 4) UUID in hyphenated lowercase form.
    fn next_id(&mut self) -> String {
        let bytes: [u8; 16] = self.rng.gen();
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string()
    }

    fn effective_time(&mut self) -> DateTime<Utc> {
        let days = self.rng.gen_range(0..=LOOKBACK_DAYS);
        let minutes = self.rng.gen_range(0..=LOOKBACK_MINUTES);
        self.now - Duration::days(days) - Duration::minutes(minutes)
    }

    fn sample_value(&mut self, range: &ValueRange) -> QuantityValue {
        match *range {
            ValueRange::Integer { min, max } => QuantityValue::Integer(self.rng.gen_range(min..=max)),
            ValueRange::Decimal { .. } => {
                // Sampled in tenths so the value is exactly representable at one decimal place.
                let (lo, hi) = range.tenths().unwrap_or_default();
                let tenths = self.rng.gen_range(lo..=hi);
                QuantityValue::Decimal(tenths as f64 / 10.0)
            }
        }
    }
}

/// Generate a batch with the thread RNG and the current instant.
pub fn generate_batch(patients: &[NonEmptyText]) -> GeneratedBatch {
    Generator::new(rand::thread_rng(), Utc::now()).generate(patients)
}
