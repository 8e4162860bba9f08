use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DataFormat;
use crate::basis::LOG_FILTER_SPREAD;
use crate::error::{ConfigError, LayerError};

pub(super) const DEFAULT_LAYER_NAME: &str = "filterbank";
const DEFAULT_BINS_PER_OCTAVE: usize = 12;

/// How the filterbank basis is initialised at build time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterbankInit {
    #[default]
    Mel,
    Log,
    Linear,
    UniRandom,
}

impl FilterbankInit {
    /// Config name of the scheme, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterbankInit::Mel => "mel",
            FilterbankInit::Log => "log",
            FilterbankInit::Linear => "linear",
            FilterbankInit::UniRandom => "uni_random",
        }
    }

    /// Schemes whose filters are placed in Hz and so need the sample rate.
    pub fn requires_sample_rate(self) -> bool {
        matches!(self, FilterbankInit::Mel | FilterbankInit::Log)
    }
}

impl fmt::Display for FilterbankInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterbankInit {
    type Err = ConfigError;

    /// Accepts exactly the names written by serde.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "mel" => Ok(FilterbankInit::Mel),
            "log" => Ok(FilterbankInit::Log),
            "linear" => Ok(FilterbankInit::Linear),
            "uni_random" => Ok(FilterbankInit::UniRandom),
            _ => Err(ConfigError::InvalidInit {
                value: value.to_string(),
            }),
        }
    }
}

/// Filterbank-specific attributes, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterbankConfig {
    /// Number of output bands.
    pub n_fbs: usize,
    /// Whether the basis is updated by gradient descent.
    pub trainable_fb: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sr: Option<u32>,
    #[serde(default)]
    pub init: FilterbankInit,
    #[serde(default)]
    pub fmin: f32,
    /// Resolved to `sr / 2` on construction when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fmax: Option<f32>,
    /// Log scheme only.
    #[serde(default = "default_bins_per_octave")]
    pub bins_per_octave: usize,
    /// Log scheme only; filter width as a fraction of one log bin.
    #[serde(default = "default_spread")]
    pub spread: f32,
}

fn default_bins_per_octave() -> usize {
    DEFAULT_BINS_PER_OCTAVE
}

fn default_spread() -> f32 {
    LOG_FILTER_SPREAD
}

impl FilterbankConfig {
    /// Mel scheme over `[0, sr / 2]` with no sample rate set yet.
    pub fn new(n_fbs: usize, trainable_fb: bool) -> Self {
        Self {
            n_fbs,
            trainable_fb,
            sr: None,
            init: FilterbankInit::default(),
            fmin: 0.0,
            fmax: None,
            bins_per_octave: DEFAULT_BINS_PER_OCTAVE,
            spread: LOG_FILTER_SPREAD,
        }
    }

    /// Required by the mel and log schemes.
    pub fn with_sample_rate(mut self, sr: u32) -> Self {
        self.sr = Some(sr);
        self
    }

    pub fn with_init(mut self, init: FilterbankInit) -> Self {
        self.init = init;
        self
    }

    /// Lowest filter frequency in Hz. For the log scheme, `0` means C1.
    pub fn with_fmin(mut self, fmin: f32) -> Self {
        self.fmin = fmin;
        self
    }

    /// Highest filter frequency in Hz; defaults to Nyquist.
    pub fn with_fmax(mut self, fmax: f32) -> Self {
        self.fmax = Some(fmax);
        self
    }

    pub fn with_bins_per_octave(mut self, bins_per_octave: usize) -> Self {
        self.bins_per_octave = bins_per_octave;
        self
    }

    /// Log-normal filter width in log bins.
    pub fn with_spread(mut self, spread: f32) -> Self {
        self.spread = spread;
        self
    }

    /// Check invariants and resolve `fmax` from the sample rate.
    pub(super) fn validated(mut self) -> Result<Self, LayerError> {
        if self.n_fbs == 0 {
            return Err(LayerError::ZeroFilters);
        }
        if self.init.requires_sample_rate() && self.sr.is_none() {
            return Err(LayerError::MissingSampleRate(self.init));
        }
        if self.sr == Some(0) {
            return Err(LayerError::InvalidConfig(
                "sample rate must be positive".to_string(),
            ));
        }
        if !self.fmin.is_finite() || self.fmin < 0.0 {
            return Err(LayerError::InvalidConfig(format!(
                "fmin must be a non-negative frequency, got {}",
                self.fmin
            )));
        }
        if self.fmax.is_none() {
            self.fmax = self.sr.map(|sr| sr as f32 / 2.0);
        }
        if let Some(fmax) = self.fmax
            && (!fmax.is_finite() || fmax <= self.fmin)
        {
            return Err(LayerError::InvalidConfig(format!(
                "fmax ({fmax}) must be greater than fmin ({})",
                self.fmin
            )));
        }
        if self.bins_per_octave == 0 {
            return Err(LayerError::InvalidConfig(
                "bins_per_octave must be positive".to_string(),
            ));
        }
        if !self.spread.is_finite() || self.spread <= 0.0 {
            return Err(LayerError::InvalidConfig(format!(
                "spread must be positive, got {}",
                self.spread
            )));
        }
        Ok(self)
    }
}

/// Attributes every layer carries regardless of its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerBaseConfig {
    #[serde(default = "default_layer_name")]
    pub name: String,
    /// Layer-wide switch; when false no parameter is trainable.
    #[serde(default = "default_trainable")]
    pub trainable: bool,
    #[serde(default)]
    pub data_format: DataFormat,
}

fn default_layer_name() -> String {
    DEFAULT_LAYER_NAME.to_string()
}

fn default_trainable() -> bool {
    true
}

impl Default for LayerBaseConfig {
    fn default() -> Self {
        Self {
            name: default_layer_name(),
            trainable: default_trainable(),
            data_format: DataFormat::default(),
        }
    }
}

impl LayerBaseConfig {
    /// Name used in logs and error messages.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_trainable(mut self, trainable: bool) -> Self {
        self.trainable = trainable;
        self
    }

    /// Axis layout of the inputs this layer receives.
    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }
}

/// Full exported configuration: base attributes merged with filterbank attributes
/// into one flat mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterbankLayerConfig {
    #[serde(flatten)]
    pub base: LayerBaseConfig,
    #[serde(flatten)]
    pub filterbank: FilterbankConfig,
}
