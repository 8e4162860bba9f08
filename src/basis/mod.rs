//! Basis-matrix generators mapping STFT bins to filterbank bands.
//!
//! Every generator returns a dense `(n_freq, n_filters)` matrix so that a
//! spectrogram frame `x` (length `n_freq`) projects to `x · basis`.

mod logfreq;
mod mel;

pub use logfreq::{C1_HZ, LOG_FILTER_SPREAD, filterbank_log};
pub use mel::{filterbank_mel, hz_to_mel, mel_frequencies, mel_to_hz};

/// Centre frequency in Hz of each bin of a one-sided STFT with `n_freq` bins.
///
/// The FFT length is inferred as `2 * (n_freq - 1)`.
pub fn fft_frequencies(sample_rate: u32, n_freq: usize) -> Vec<f64> {
    if n_freq <= 1 {
        return vec![0.0; n_freq];
    }
    let n_fft = 2 * (n_freq - 1);
    let sr = sample_rate as f64;
    (0..n_freq)
        .map(|bin| bin as f64 * sr / n_fft as f64)
        .collect()
}
