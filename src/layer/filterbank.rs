//! Learnable filterbank layer.
//!
//! Projects the frequency axis of a `(batch, channel, freq, time)` (or
//! channels-last) spectrogram onto `n_fbs` bands through a basis matrix of shape
//! `(n_freq, n_fbs)`. The basis is created at build time from the configured
//! init scheme and registered as a trainable or frozen parameter.

use burn::module::{Ignored, Module, Param, ParamId};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::Array2;
use tracing::debug;

use super::config::{FilterbankConfig, FilterbankInit, FilterbankLayerConfig, LayerBaseConfig};
use super::{Layer, rank4};
use crate::basis;
use crate::error::LayerError;

/// Shape attributes captured from the first input seen at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltShape {
    pub n_ch: usize,
    pub n_freq: usize,
    pub n_time: usize,
}

/// Lifecycle of a layer: the basis exists only once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Unbuilt,
    Built,
}

#[derive(Module, Debug)]
pub struct Filterbank<B: Backend> {
    basis: Option<Param<Tensor<B, 2>>>,
    shape: Ignored<Option<BuiltShape>>,
    config: Ignored<FilterbankConfig>,
    base: Ignored<LayerBaseConfig>,
}

impl<B: Backend> Filterbank<B> {
    /// Create an unbuilt layer. Fails when the configuration is inconsistent.
    pub fn new(config: FilterbankConfig, base: LayerBaseConfig) -> Result<Self, LayerError> {
        let config = config.validated()?;
        debug!(
            layer = %base.name,
            init = %config.init,
            n_fbs = config.n_fbs,
            sr = ?config.sr,
            fmin = config.fmin,
            fmax = ?config.fmax,
            trainable = base.trainable && config.trainable_fb,
            "Created filterbank layer"
        );
        Ok(Self {
            basis: None,
            shape: Ignored(None),
            config: Ignored(config),
            base: Ignored(base),
        })
    }

    /// Recreate an unbuilt layer from an exported configuration.
    ///
    /// The layer carries no basis yet, so `Module::load_record` on it keeps
    /// nothing from a trained record. Restore trained weights with
    /// [`Filterbank::load_trained`], or build first and load afterwards.
    pub fn from_config(config: FilterbankLayerConfig) -> Result<Self, LayerError> {
        Self::new(config.filterbank, config.base)
    }

    /// Validated filterbank attributes, with `fmax` resolved.
    pub fn config(&self) -> &FilterbankConfig {
        &self.config.0
    }

    pub fn base_config(&self) -> &LayerBaseConfig {
        &self.base.0
    }

    pub fn name(&self) -> &str {
        &self.base.0.name
    }

    /// `Built` once a basis is registered.
    pub fn state(&self) -> LayerState {
        if self.basis.is_some() {
            LayerState::Built
        } else {
            LayerState::Unbuilt
        }
    }

    /// Shape attributes captured at build time.
    pub fn built_shape(&self) -> Option<BuiltShape> {
        self.shape.0
    }

    /// Effective trainability of the basis.
    pub fn is_trainable(&self) -> bool {
        self.base.0.trainable && self.config.0.trainable_fb
    }

    /// The registered basis parameter, `(n_freq, n_fbs)`.
    pub fn basis(&self) -> Option<&Param<Tensor<B, 2>>> {
        self.basis.as_ref()
    }

    /// The basis when built and effectively trainable, otherwise empty.
    pub fn trainable_weights(&self) -> Vec<&Param<Tensor<B, 2>>> {
        self.basis
            .iter()
            .filter(|_| self.is_trainable())
            .collect()
    }

    /// The basis when built and frozen, otherwise empty.
    pub fn non_trainable_weights(&self) -> Vec<&Param<Tensor<B, 2>>> {
        self.basis
            .iter()
            .filter(|_| !self.is_trainable())
            .collect()
    }

    /// Current basis values as a `(n_freq, n_fbs)` matrix, or `None` before build.
    pub fn get_weights(&self) -> Result<Option<Array2<f32>>, LayerError> {
        let Some(param) = self.basis.as_ref() else {
            return Ok(None);
        };
        let [n_freq, n_fbs] = param.val().dims();
        let values = param
            .val()
            .into_data()
            .convert::<f32>()
            .into_vec::<f32>()
            .map_err(|err| LayerError::TensorData(format!("{err:?}")))?;
        Array2::from_shape_vec((n_freq, n_fbs), values)
            .map(Some)
            .map_err(|err| LayerError::TensorData(err.to_string()))
    }

    /// Replace the basis of a built layer, keeping its trainable flag and
    /// parameter id.
    pub fn set_weights(&mut self, weights: Array2<f32>) -> Result<(), LayerError> {
        let Some(param) = self.basis.as_ref() else {
            return Err(self.not_built());
        };
        let expected = param.val().dims();
        let (rows, cols) = weights.dim();
        if [rows, cols] != expected {
            return Err(LayerError::WeightShape {
                expected,
                got: [rows, cols],
            });
        }
        let id = param.id;
        let device = param.val().device();
        self.basis = Some(self.basis_param(id, matrix_tensor(weights, &device)));
        Ok(())
    }

    /// Restore the basis saved in `record`, building the layer for
    /// `input_shape` when it is not built yet.
    ///
    /// Fails when the record holds no basis or the saved basis does not fit
    /// the input shape and `n_fbs`.
    pub fn load_trained(
        mut self,
        record: FilterbankRecord<B>,
        input_shape: &[usize],
    ) -> Result<Self, LayerError> {
        let Some(trained) = record.basis else {
            return Err(LayerError::MissingBasis {
                name: self.base.0.name.clone(),
            });
        };
        let dims = rank4(input_shape)?;
        let (n_ch, n_freq, n_time) = self.base.0.data_format.channel_freq_time(dims);
        if let Some(shape) = self.shape.0
            && shape.n_freq != n_freq
        {
            return Err(LayerError::FrequencyMismatch {
                expected: shape.n_freq,
                got: n_freq,
            });
        }
        let expected = [n_freq, self.config.0.n_fbs];
        let got = trained.val().dims();
        if got != expected {
            return Err(LayerError::WeightShape { expected, got });
        }

        let id = trained.id;
        let param = self.basis_param(id, trained.val().detach());
        debug!(
            layer = %self.base.0.name,
            n_freq,
            n_fbs = self.config.0.n_fbs,
            trainable = self.is_trainable(),
            "Restored filterbank basis"
        );
        self.basis = Some(param);
        if self.shape.0.is_none() {
            self.shape = Ignored(Some(BuiltShape {
                n_ch,
                n_freq,
                n_time,
            }));
        }
        Ok(self)
    }

    /// Project a tensor through an already built layer.
    pub fn forward(&self, input: Tensor<B, 4>) -> Result<Tensor<B, 4>, LayerError> {
        let (Some(param), Some(shape)) = (self.basis.as_ref(), self.shape.0) else {
            return Err(self.not_built());
        };
        let data_format = self.base.0.data_format;
        let n_freq = input.dims()[data_format.freq_axis()];
        if n_freq != shape.n_freq {
            return Err(LayerError::FrequencyMismatch {
                expected: shape.n_freq,
                got: n_freq,
            });
        }

        let freq_last = data_format.swap_freq_last(input);
        let [batch, channels, time, _] = freq_last.dims();
        let projected = freq_last
            .reshape([batch * channels * time, n_freq])
            .matmul(param.val())
            .reshape([batch, channels, time, self.config.0.n_fbs]);
        Ok(data_format.swap_freq_last(projected))
    }

    fn basis_matrix(&self, n_freq: usize) -> Result<Array2<f32>, LayerError> {
        let config = &self.config.0;
        let matrix = match config.init {
            FilterbankInit::Mel => {
                let sr = self.sample_rate()?;
                basis::filterbank_mel(
                    sr,
                    n_freq,
                    config.n_fbs,
                    config.fmin,
                    config.fmax.unwrap_or(sr as f32 / 2.0),
                )?
            }
            FilterbankInit::Log => basis::filterbank_log(
                self.sample_rate()?,
                n_freq,
                config.n_fbs,
                config.bins_per_octave,
                config.fmin,
                config.spread,
            )?,
            FilterbankInit::Linear | FilterbankInit::UniRandom => {
                return Err(LayerError::UnsupportedInit(config.init));
            }
        };
        Ok(matrix)
    }

    fn sample_rate(&self) -> Result<u32, LayerError> {
        self.config
            .0
            .sr
            .ok_or(LayerError::MissingSampleRate(self.config.0.init))
    }

    fn basis_param(&self, id: ParamId, tensor: Tensor<B, 2>) -> Param<Tensor<B, 2>> {
        Param::initialized(id, tensor).set_require_grad(self.is_trainable())
    }

    fn not_built(&self) -> LayerError {
        LayerError::NotBuilt {
            name: self.base.0.name.clone(),
        }
    }
}

fn matrix_tensor<B: Backend>(matrix: Array2<f32>, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = matrix.dim();
    let values: Vec<f32> = matrix.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, [rows, cols]), device)
}

impl<B: Backend> Layer<B> for Filterbank<B> {
    type Config = FilterbankLayerConfig;

    fn build(&mut self, input_shape: &[usize], device: &B::Device) -> Result<(), LayerError> {
        if self.is_built() {
            return Err(LayerError::AlreadyBuilt {
                name: self.base.0.name.clone(),
            });
        }
        let dims = rank4(input_shape)?;
        let (n_ch, n_freq, n_time) = self.base.0.data_format.channel_freq_time(dims);
        let matrix = self.basis_matrix(n_freq)?;
        let param = self.basis_param(ParamId::new(), matrix_tensor(matrix, device));
        debug!(
            layer = %self.base.0.name,
            n_ch,
            n_freq,
            n_time,
            n_fbs = self.config.0.n_fbs,
            trainable = self.is_trainable(),
            "Built filterbank basis"
        );
        self.basis = Some(param);
        self.shape = Ignored(Some(BuiltShape {
            n_ch,
            n_freq,
            n_time,
        }));
        Ok(())
    }

    fn is_built(&self) -> bool {
        self.basis.is_some()
    }

    fn compute_output_shape(&self, input_shape: &[usize]) -> Result<[usize; 4], LayerError> {
        let dims = rank4(input_shape)?;
        Ok(self.base.0.data_format.with_freq(dims, self.config.0.n_fbs))
    }

    fn call(&mut self, input: Tensor<B, 4>) -> Result<Tensor<B, 4>, LayerError> {
        if !self.is_built() {
            let device = input.device();
            self.build(&input.dims(), &device)?;
        }
        self.forward(input)
    }

    fn get_config(&self) -> FilterbankLayerConfig {
        FilterbankLayerConfig {
            base: self.base.0.clone(),
            filterbank: self.config.0.clone(),
        }
    }

    fn supports_masking(&self) -> bool {
        true
    }
}
