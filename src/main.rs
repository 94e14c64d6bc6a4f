use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitals_core::config::{http_timeout_from_env_value, upload_workers_from_env_value};
use vitals_core::constants::{DEFAULT_MAPPINGS_PATH, DEFAULT_OUTPUT_DIR};
use vitals_core::{
    BasicAuth, CoreConfig, FhirServerConfig, HttpTransport, generate_to_disk, upload_from_disk,
};

/// Main entry point for the vitals runner
///
/// Generates a fresh batch of devices and observations for every patient in the
/// mapping file, writes both resource files, then uploads them: devices on a
/// bounded worker pool, observations one at a time once every device is done.
///
/// # Environment Variables
/// - `FHIR_BASE_URL`: FHIR server base URL (required)
/// - `FHIR_USERNAME` / `FHIR_PASSWORD`: Basic auth credentials (required)
/// - `VITALS_MAPPINGS_PATH`: Resource mapping CSV (default: "mappings.csv")
/// - `VITALS_OUTPUT_DIR`: Directory for generated files (default: "fhir_output")
/// - `VITALS_UPLOAD_WORKERS`: Concurrent device uploads (default: 12)
/// - `VITALS_HTTP_TIMEOUT_SECS`: Per-request timeout (default: 30)
///
/// # Returns
/// * `Ok(())` - If generation and upload ran, even when individual uploads failed
/// * `Err(anyhow::Error)` - If configuration, generation or file handling fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vitals_core=info".parse()?)
                .add_directive("vitals_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mappings_path = std::env::var("VITALS_MAPPINGS_PATH")
        .unwrap_or_else(|_| DEFAULT_MAPPINGS_PATH.into());
    let output_dir =
        std::env::var("VITALS_OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.into());
    let workers = upload_workers_from_env_value(std::env::var("VITALS_UPLOAD_WORKERS").ok())?;
    let timeout = http_timeout_from_env_value(std::env::var("VITALS_HTTP_TIMEOUT_SECS").ok())?;

    let base_url = required_env("FHIR_BASE_URL")?;
    let credentials = BasicAuth::new(required_env("FHIR_USERNAME")?, required_env("FHIR_PASSWORD")?)?;
    let server = FhirServerConfig::new(&base_url, credentials, timeout)?;
    let config = CoreConfig::new(PathBuf::from(mappings_path), PathBuf::from(output_dir), workers)?;

    tracing::info!("++ Generating resources from {}", config.mappings_path().display());
    let (summary, files) = generate_to_disk(&config)?;
    println!("{summary}");
    tracing::info!(
        "++ Wrote {} and {}",
        files.devices.display(),
        files.observations.display()
    );

    tracing::info!("++ Uploading to {}", server.base_url());
    let transport = Arc::new(HttpTransport::new(&server)?);
    let report = upload_from_disk(&config, transport).await?;

    println!(
        "Devices: {} posted, {} failed",
        report.devices.succeeded(),
        report.devices.failed()
    );
    println!(
        "Observations: {} posted, {} failed",
        report.observations.succeeded(),
        report.observations.failed()
    );

    Ok(())
}

fn required_env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{name} must be set"))
}
