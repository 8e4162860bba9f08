use ndarray::Array2;
use tracing::warn;

use super::fft_frequencies;
use crate::error::BasisError;

/// Frequency of the note C1, used when no positive minimum frequency is given.
pub const C1_HZ: f32 = 32.703_196;
/// Default filter width, as a fraction of one log-frequency bin.
pub const LOG_FILTER_SPREAD: f32 = 0.125;

/// Approximate constant-Q filterbank for a fixed-window STFT.
///
/// Filter `i` is a log-normal window centred at `f_min * 2^(i / bins_per_octave)`
/// with width `spread / bins_per_octave` octaves. Each filter is normalised to unit
/// mass, so entries lie in `[0, 1]`. The DC bin never contributes. Returns a
/// `(n_freq, n_bins)` matrix.
pub fn filterbank_log(
    sample_rate: u32,
    n_freq: usize,
    n_bins: usize,
    bins_per_octave: usize,
    f_min: f32,
    spread: f32,
) -> Result<Array2<f32>, BasisError> {
    if sample_rate == 0 {
        return Err(BasisError::ZeroSampleRate);
    }
    if n_freq == 0 {
        return Err(BasisError::Empty {
            what: "Frequency bin count",
        });
    }
    if n_bins == 0 {
        return Err(BasisError::Empty {
            what: "Log bin count",
        });
    }
    if bins_per_octave == 0 {
        return Err(BasisError::Empty {
            what: "Bins per octave",
        });
    }
    if !spread.is_finite() || spread <= 0.0 {
        return Err(BasisError::Spread(spread));
    }
    if !f_min.is_finite() {
        return Err(BasisError::FrequencyRange {
            fmin: f_min,
            fmax: sample_rate as f32 * 0.5,
        });
    }
    let f_min = f64::from(if f_min > 0.0 { f_min } else { C1_HZ });
    let sigma = spread as f64 / bins_per_octave as f64;

    // Skip DC: log2(0) is undefined.
    let log_freqs: Vec<f64> = fft_frequencies(sample_rate, n_freq)
        .into_iter()
        .skip(1)
        .map(f64::log2)
        .collect();

    let mut basis = Array2::<f32>::zeros((n_freq, n_bins));
    if log_freqs.is_empty() {
        warn!("Log filterbank over {n_freq} bin(s) has no non-DC bins; basis is all zero");
        return Ok(basis);
    }

    let mut exponents = vec![0.0_f64; log_freqs.len()];
    for bin in 0..n_bins {
        let log_center = (f_min * 2.0_f64.powf(bin as f64 / bins_per_octave as f64)).log2();
        for (slot, &log_freq) in exponents.iter_mut().zip(log_freqs.iter()) {
            let z = (log_freq - log_center) / sigma;
            *slot = -0.5 * z * z - sigma.log2() - log_freq;
        }
        // Shift by the peak before exponentiating; the L1 normalisation cancels it.
        let peak = exponents
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let mut mass = 0.0_f64;
        for slot in exponents.iter_mut() {
            *slot = (*slot - peak).exp();
            mass += *slot;
        }
        for (offset, &weight) in exponents.iter().enumerate() {
            basis[[offset + 1, bin]] = (weight / mass) as f32;
        }
    }
    Ok(basis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_basis_has_requested_columns_and_unit_mass() {
        let basis = filterbank_log(16_000, 257, 48, 12, 20.0, LOG_FILTER_SPREAD).unwrap();
        assert_eq!(basis.dim(), (257, 48));
        assert!(basis.iter().all(|v| (0.0..=1.0).contains(v)));
        for column in basis.columns() {
            let mass: f32 = column.sum();
            assert!((mass - 1.0).abs() < 1e-4, "mass {mass}");
        }
    }

    #[test]
    fn log_basis_ignores_dc_bin() {
        let basis = filterbank_log(16_000, 257, 12, 12, 100.0, LOG_FILTER_SPREAD).unwrap();
        assert!(basis.row(0).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn log_filter_peaks_near_centre_frequency() {
        let sr = 16_000;
        let n_freq = 1025;
        let basis = filterbank_log(sr, n_freq, 24, 12, 440.0, 1.0).unwrap();
        let freqs = fft_frequencies(sr, n_freq);
        let column = basis.column(12);
        let (peak_bin, _) = column
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert!((freqs[peak_bin] - 880.0).abs() < 10.0, "peak {}", freqs[peak_bin]);
    }

    #[test]
    fn log_basis_falls_back_to_c1_without_fmin() {
        let zero = filterbank_log(22_050, 513, 36, 12, 0.0, LOG_FILTER_SPREAD).unwrap();
        let c1 = filterbank_log(22_050, 513, 36, 12, C1_HZ, LOG_FILTER_SPREAD).unwrap();
        assert_eq!(zero, c1);
    }

    #[test]
    fn log_basis_rejects_invalid_parameters() {
        assert!(matches!(
            filterbank_log(16_000, 257, 12, 0, 20.0, LOG_FILTER_SPREAD),
            Err(BasisError::Empty { .. })
        ));
        assert!(matches!(
            filterbank_log(16_000, 257, 12, 12, 20.0, 0.0),
            Err(BasisError::Spread(_))
        ));
        assert!(matches!(
            filterbank_log(0, 257, 12, 12, 20.0, LOG_FILTER_SPREAD),
            Err(BasisError::ZeroSampleRate)
        ));
    }

    #[test]
    fn single_bin_spectrum_yields_zero_basis() {
        let basis = filterbank_log(16_000, 1, 4, 12, 20.0, LOG_FILTER_SPREAD).unwrap();
        assert_eq!(basis.dim(), (1, 4));
        assert!(basis.iter().all(|v| *v == 0.0));
    }
}
