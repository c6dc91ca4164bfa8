use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GeoError {
    #[error("invalid GEO series accession: {0}")]
    InvalidSeriesAccession(String),

    #[error("invalid GEO sample accession: {0}")]
    InvalidSampleAccession(String),

    #[error("invalid annotation field: {0}")]
    #[diagnostic(help("expected one of: age, brca1, arthritis, crohns, mutation-status, disease-state"))]
    InvalidAnnotationField(String),

    #[error("section {section} not found in {path}")]
    SectionNotFound { section: String, path: String },

    #[error("column {column} not found in {table} table")]
    MissingColumn { table: String, column: String },

    #[error("sample {sample} not found in {dataset}")]
    SampleNotFound { dataset: String, sample: String },

    #[error("failed to parse table: {0}")]
    TableParse(String),

    #[error("failed to read cache entry {key}: {message}")]
    CacheRead { key: String, message: String },

    #[error("failed to write cache entry {key}: {message}")]
    CacheWrite { key: String, message: String },

    #[error("dataset not found locally: {0}")]
    DatasetNotFound(String),

    #[error("missing config file geo-tools.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("GEO request failed: {0}")]
    GeoHttp(String),

    #[error("GEO returned status {status}: {message}")]
    GeoStatus { status: u16, message: String },

    #[error("archive extraction failed: {0}")]
    ArchiveExtraction(String),
}
