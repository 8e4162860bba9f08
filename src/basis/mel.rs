use ndarray::Array2;

use super::fft_frequencies;
use crate::error::BasisError;

/// Linear region slope of the Slaney mel scale (Hz per mel).
const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1_000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4_f64.ln() / 27.0
}

/// Convert Hz to Slaney mels: linear below 1 kHz, logarithmic above.
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Inverse of [`hz_to_mel`].
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// `count` frequencies in Hz, evenly spaced on the mel scale from `f_min` to `f_max` inclusive.
pub fn mel_frequencies(count: usize, f_min: f64, f_max: f64) -> Vec<f64> {
    if count == 1 {
        return vec![f_min];
    }
    let mel_min = hz_to_mel(f_min);
    let mel_max = hz_to_mel(f_max);
    let denom = count.saturating_sub(1).max(1) as f64;
    (0..count)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / denom))
        .collect()
}

/// Triangular mel filterbank with Slaney area normalisation.
///
/// Returns a `(n_freq, n_mels)` matrix. `f_max` is clamped to Nyquist.
pub fn filterbank_mel(
    sample_rate: u32,
    n_freq: usize,
    n_mels: usize,
    f_min: f32,
    f_max: f32,
) -> Result<Array2<f32>, BasisError> {
    if sample_rate == 0 {
        return Err(BasisError::ZeroSampleRate);
    }
    if n_freq == 0 {
        return Err(BasisError::Empty {
            what: "Frequency bin count",
        });
    }
    if n_mels == 0 {
        return Err(BasisError::Empty { what: "Mel band count" });
    }
    if !f_min.is_finite() || f_min < 0.0 || !f_max.is_finite() {
        return Err(BasisError::FrequencyRange {
            fmin: f_min,
            fmax: f_max,
        });
    }
    let nyquist = sample_rate as f64 * 0.5;
    let lo = f_min as f64;
    let hi = (f_max as f64).min(nyquist);
    if hi <= lo {
        return Err(BasisError::FrequencyRange {
            fmin: f_min,
            fmax: f_max,
        });
    }

    let fft_freqs = fft_frequencies(sample_rate, n_freq);
    let edges = mel_frequencies(n_mels + 2, lo, hi);
    let mut basis = Array2::<f32>::zeros((n_freq, n_mels));
    for band in 0..n_mels {
        let left = edges[band];
        let center = edges[band + 1];
        let right = edges[band + 2];
        let enorm = 2.0 / (right - left);
        for (bin, &freq) in fft_freqs.iter().enumerate() {
            let rising = (freq - left) / (center - left);
            let falling = (right - freq) / (right - center);
            let weight = rising.min(falling);
            if weight > 0.0 {
                basis[[bin, band]] = (weight * enorm) as f32;
            }
        }
    }
    Ok(basis)
}
