//! Graph layers and the lifecycle every layer follows.
//!
//! A layer is configured up front, then built exactly once when the shape of its
//! first input becomes known. Building allocates parameters; after that the layer
//! only transforms tensors.

mod config;
mod config_io;
mod filterbank;

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use crate::error::LayerError;

pub use config::{FilterbankConfig, FilterbankInit, FilterbankLayerConfig, LayerBaseConfig};
pub use filterbank::{BuiltShape, Filterbank, FilterbankRecord, LayerState};

/// Hooks a layer exposes to the graph that owns it.
pub trait Layer<B: Backend> {
    /// Serializable description sufficient to recreate an unbuilt layer.
    type Config;

    /// Allocate parameters for `input_shape`. Fails if the layer is already built.
    fn build(&mut self, input_shape: &[usize], device: &B::Device) -> Result<(), LayerError>;

    fn is_built(&self) -> bool;

    /// Output shape for `input_shape`, without building.
    fn compute_output_shape(&self, input_shape: &[usize]) -> Result<[usize; 4], LayerError>;

    /// Forward pass, building from the input shape on first use.
    fn call(&mut self, input: Tensor<B, 4>) -> Result<Tensor<B, 4>, LayerError>;

    fn get_config(&self) -> Self::Config;

    /// Whether input masks may be propagated through this layer unchanged.
    fn supports_masking(&self) -> bool {
        false
    }
}

/// Axis order of 4-D time-frequency tensors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// `(batch, channel, freq, time)`
    #[default]
    ChannelsFirst,
    /// `(batch, freq, time, channel)`
    ChannelsLast,
}

impl DataFormat {
    /// Index of the frequency axis.
    pub fn freq_axis(self) -> usize {
        match self {
            DataFormat::ChannelsFirst => 2,
            DataFormat::ChannelsLast => 1,
        }
    }

    /// `(channels, freq, time)` of a rank-4 shape.
    pub fn channel_freq_time(self, dims: [usize; 4]) -> (usize, usize, usize) {
        match self {
            DataFormat::ChannelsFirst => (dims[1], dims[2], dims[3]),
            DataFormat::ChannelsLast => (dims[3], dims[1], dims[2]),
        }
    }

    /// `dims` with the frequency axis replaced by `n_freq`.
    pub fn with_freq(self, mut dims: [usize; 4], n_freq: usize) -> [usize; 4] {
        dims[self.freq_axis()] = n_freq;
        dims
    }

    /// Reorder to `(batch, channel, time, freq)`. Applying it twice restores the input.
    pub(crate) fn swap_freq_last<B: Backend>(self, tensor: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            DataFormat::ChannelsFirst => tensor.swap_dims(2, 3),
            DataFormat::ChannelsLast => tensor.swap_dims(1, 3),
        }
    }
}

pub(crate) fn rank4(input_shape: &[usize]) -> Result<[usize; 4], LayerError> {
    <[usize; 4]>::try_from(input_shape).map_err(|_| LayerError::InputRank {
        rank: input_shape.len(),
    })
}
