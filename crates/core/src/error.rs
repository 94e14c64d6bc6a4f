use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to open mapping file {}: {source}", .path.display())]
    MappingOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read mapping file: {0}")]
    MappingRead(#[from] csv::Error),
    #[error("mapping file is missing required column '{0}'")]
    MappingColumn(&'static str),
    #[error("mapping file {} contains no Patient rows", .path.display())]
    NoPatients { path: PathBuf },

    #[error("failed to create output directory: {0}")]
    OutputDirCreation(std::io::Error),
    #[error("failed to write resource file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read resource file: {0}")]
    FileRead(std::io::Error),
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
    #[error("upload worker pool closed")]
    WorkerPoolClosed,
    #[error("search failed: {0}")]
    Search(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
