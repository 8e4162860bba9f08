//! Learnable filterbank layer for burn models.
//!
//! Reduces the frequency axis of a spectrogram to a smaller set of mel or
//! log-frequency bands through a basis matrix that can be frozen or trained.

/// Basis-matrix generators (mel, log-frequency).
pub mod basis;
/// Error types.
pub mod error;
/// Layer lifecycle, configuration and the filterbank layer.
pub mod layer;
/// Tracing subscriber setup.
pub mod logging;

pub use error::{BasisError, ConfigError, LayerError};
pub use layer::{
    BuiltShape, DataFormat, Filterbank, FilterbankConfig, FilterbankInit, FilterbankLayerConfig,
    FilterbankRecord, Layer, LayerBaseConfig, LayerState,
};
