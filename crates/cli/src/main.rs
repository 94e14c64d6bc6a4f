use clap::{Args, Parser, Subcommand, ValueEnum};
use fhir::{ResourceKind, DEVICE_TYPES, OBSERVATION_TYPES};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vitals_core::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAPPINGS_PATH, DEFAULT_OUTPUT_DIR, DEFAULT_UPLOAD_WORKERS,
};
use vitals_core::{
    generate_to_disk, patient_summary, upload_file, upload_from_disk, validate_file, BasicAuth,
    BatchReport, CoreConfig, FhirServerConfig, HttpTransport, UploadReport,
};

#[derive(Parser)]
#[command(name = "vitals")]
#[command(about = "Synthetic FHIR vital-signs generator and bulk uploader")]
struct Cli {
    /// Resource mapping CSV listing existing patients
    #[arg(long, env = "VITALS_MAPPINGS_PATH", default_value = DEFAULT_MAPPINGS_PATH, global = true)]
    mappings: PathBuf,
    /// Directory holding devices.json and observations.json
    #[arg(long, env = "VITALS_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR, global = true)]
    output_dir: PathBuf,
    /// Concurrent device uploads
    #[arg(long, env = "VITALS_UPLOAD_WORKERS", default_value_t = DEFAULT_UPLOAD_WORKERS, global = true)]
    workers: usize,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ServerArgs {
    /// FHIR base URL, e.g. http://localhost:52773/fhir/r4
    #[arg(long, env = "FHIR_BASE_URL")]
    base_url: String,
    /// Basic auth username
    #[arg(long, env = "FHIR_USERNAME")]
    username: String,
    /// Basic auth password
    #[arg(long, env = "FHIR_PASSWORD", hide_env_values = true)]
    password: String,
    /// Per-request timeout in seconds
    #[arg(long, env = "VITALS_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl ServerArgs {
    fn transport(&self) -> Result<Arc<HttpTransport>, vitals_core::CoreError> {
        let credentials = BasicAuth::new(&self.username, &self.password)?;
        let config = FhirServerConfig::new(
            &self.base_url,
            credentials,
            Duration::from_secs(self.timeout_secs),
        )?;
        Ok(Arc::new(HttpTransport::new(&config)?))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum UploadTarget {
    Devices,
    Observations,
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate devices and observations for every mapped patient
    Generate,
    /// Upload previously generated resources
    Upload {
        /// Which file to upload
        #[arg(value_enum, default_value_t = UploadTarget::All)]
        target: UploadTarget,
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Generate, then upload everything
    Run {
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Strictly parse a persisted resource file
    Validate {
        /// JSON array of Device or Observation resources
        path: PathBuf,
        /// Resource type; detected from the first element when omitted
        #[arg(long)]
        kind: Option<ResourceKind>,
    },
    /// Count a patient's devices and observations on the server
    Search {
        /// Patient logical id
        patient_id: String,
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Print the device and vital-sign catalogs
    Catalog,
}

fn print_report(label: &str, report: &UploadReport) {
    println!(
        "{label}: {} posted, {} failed",
        report.succeeded(),
        report.failed()
    );
}

fn print_batch_report(report: &BatchReport) {
    print_report("Devices", &report.devices);
    print_report("Observations", &report.observations);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("vitals_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = match CoreConfig::new(cli.mappings, cli.output_dir, cli.workers) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(());
        }
    };

    match cli.command {
        Some(Commands::Generate) => match generate_to_disk(&config) {
            Ok((summary, _)) => println!("{}", summary),
            Err(e) => eprintln!("Error generating resources: {}", e),
        },
        Some(Commands::Upload { target, server }) => {
            let transport = match server.transport() {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Error configuring FHIR server: {}", e);
                    return Ok(());
                }
            };
            match target {
                UploadTarget::All => match upload_from_disk(&config, transport).await {
                    Ok(report) => print_batch_report(&report),
                    Err(e) => eprintln!("Error uploading resources: {}", e),
                },
                UploadTarget::Devices => {
                    match upload_file(
                        &config.devices_path(),
                        ResourceKind::Device,
                        transport,
                        config.upload_workers(),
                    )
                    .await
                    {
                        Ok(report) => print_report("Devices", &report),
                        Err(e) => eprintln!("Error uploading devices: {}", e),
                    }
                }
                UploadTarget::Observations => {
                    match upload_file(
                        &config.observations_path(),
                        ResourceKind::Observation,
                        transport,
                        config.upload_workers(),
                    )
                    .await
                    {
                        Ok(report) => print_report("Observations", &report),
                        Err(e) => eprintln!("Error uploading observations: {}", e),
                    }
                }
            }
        }
        Some(Commands::Run { server }) => {
            let transport = match server.transport() {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Error configuring FHIR server: {}", e);
                    return Ok(());
                }
            };
            match generate_to_disk(&config) {
                Ok((summary, _)) => println!("{}", summary),
                Err(e) => {
                    eprintln!("Error generating resources: {}", e);
                    return Ok(());
                }
            }
            match upload_from_disk(&config, transport).await {
                Ok(report) => print_batch_report(&report),
                Err(e) => eprintln!("Error uploading resources: {}", e),
            }
        }
        Some(Commands::Validate { path, kind }) => match validate_file(&path, kind) {
            Ok((kind, count)) => {
                println!("Valid: {} {} resources in {}", count, kind, path.display())
            }
            Err(e) => eprintln!("Invalid {}: {}", path.display(), e),
        },
        Some(Commands::Search { patient_id, server }) => {
            let transport = match server.transport() {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Error configuring FHIR server: {}", e);
                    return Ok(());
                }
            };
            match patient_summary(transport.as_ref(), &patient_id).await {
                Ok(summary) => println!(
                    "Patient/{}: {} devices, {} observations",
                    summary.patient_id, summary.devices, summary.observations
                ),
                Err(e) => eprintln!("Error searching: {}", e),
            }
        }
        Some(Commands::Catalog) => {
            println!("Device types:");
            for device_type in DEVICE_TYPES.iter() {
                println!(
                    "  {} (SNOMED {})",
                    device_type.text, device_type.code.code
                );
            }
            println!("Vital signs:");
            for observation_type in OBSERVATION_TYPES.iter() {
                println!(
                    "  {} (LOINC {}) [{}] {}",
                    observation_type.label,
                    observation_type.code.code,
                    observation_type.unit_code,
                    observation_type.range
                );
            }
        }
        None => {
            println!("Use 'vitals --help' for commands");
        }
    }

    Ok(())
}
