//! Error types for basis generation, layer lifecycle and config files.

use std::path::PathBuf;

use thiserror::Error;

use crate::layer::FilterbankInit;

/// Errors raised by the basis-matrix generators.
#[derive(Debug, Error)]
pub enum BasisError {
    #[error("Sample rate must be positive")]
    ZeroSampleRate,
    #[error("{what} must be positive")]
    Empty { what: &'static str },
    #[error("Invalid frequency range: fmin {fmin} Hz, fmax {fmax} Hz")]
    FrequencyRange { fmin: f32, fmax: f32 },
    #[error("Filter spread must be positive and finite, got {0}")]
    Spread(f32),
}

/// Errors raised while constructing, building or running a layer.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("Filter count must be positive")]
    ZeroFilters,
    #[error("Init scheme `{0}` requires a sample rate")]
    MissingSampleRate(FilterbankInit),
    #[error("Invalid layer config: {0}")]
    InvalidConfig(String),
    /// The scheme is a valid config value but has no basis generator yet.
    #[error("Init scheme `{0}` is not implemented")]
    UnsupportedInit(FilterbankInit),
    #[error("Expected a rank-4 input shape, got rank {rank}")]
    InputRank { rank: usize },
    #[error("Layer `{name}` is already built")]
    AlreadyBuilt { name: String },
    #[error("Layer `{name}` is not built")]
    NotBuilt { name: String },
    /// A record saved from an unbuilt layer has no basis to restore.
    #[error("Record for layer `{name}` holds no basis")]
    MissingBasis { name: String },
    #[error("Input has {got} frequency bins, layer was built for {expected}")]
    FrequencyMismatch { expected: usize, got: usize },
    #[error("Weights have shape {got:?}, expected {expected:?}")]
    WeightShape { expected: [usize; 2], got: [usize; 2] },
    #[error("Failed to read basis from backend: {0}")]
    TensorData(String),
    #[error(transparent)]
    Basis(#[from] BasisError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that may occur while parsing, loading or saving layer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown initialization scheme name.
    #[error("Unknown init scheme `{value}` (expected mel, log, linear or uni_random)")]
    InvalidInit {
        /// Name that failed to parse.
        value: String,
    },
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to write a config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML serialization error.
        source: toml::ser::Error,
    },
    /// Failed to parse JSON config.
    #[error("Invalid JSON config at {path}: {source}")]
    ParseJson {
        /// JSON file path.
        path: PathBuf,
        /// JSON parse error.
        source: serde_json::Error,
    },
    /// Failed to serialize config to JSON.
    #[error("Failed to serialize config to JSON at {path}: {source}")]
    SerializeJson {
        /// JSON file path.
        path: PathBuf,
        /// JSON serialization error.
        source: serde_json::Error,
    },
}
