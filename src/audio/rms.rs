//! Root-mean-square loudness metric.

/// Calculates the root mean square of audio samples.
///
/// The value is in raw sample units, not normalized: a constant signal of
/// amplitude `x` has an RMS of `|x|`, and a full-scale sine wave lands
/// near `i16::MAX / sqrt(2)`.
///
/// An empty slice yields 0.0 — the mean of zero squares over zero samples
/// is defined as silence rather than NaN.
pub fn calculate_rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let s = sample as f64;
            s * s
        })
        .sum();

    (sum_squares / samples.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_is_never_negative() {
        let signals: &[&[i16]] = &[
            &[1, 2, 3],
            &[-1, -2, -3],
            &[0],
            &[i16::MIN, i16::MAX],
            &[-30000, 12345, -7],
        ];
        for signal in signals {
            assert!(calculate_rms(signal) >= 0.0, "rms({:?}) < 0", signal);
        }
    }

    #[test]
    fn rms_of_zeros_is_zero() {
        assert_eq!(calculate_rms(&[0, 0, 0, 0]), 0.0);
    }

    #[test]
    fn rms_of_single_sample_is_its_magnitude() {
        assert_eq!(calculate_rms(&[5]), 5.0);
        assert_eq!(calculate_rms(&[-5]), 5.0);
        assert_eq!(calculate_rms(&[i16::MAX]), i16::MAX as f64);
    }

    #[test]
    fn rms_of_three_four_is_sqrt_twelve_point_five() {
        let rms = calculate_rms(&[3, 4]);
        let expected = 12.5f64.sqrt();
        assert!(
            (rms - expected).abs() < 1e-12,
            "expected {}, got {}",
            expected,
            rms
        );
    }

    #[test]
    fn rms_of_empty_slice_is_zero_not_nan() {
        let rms = calculate_rms(&[]);
        assert_eq!(rms, 0.0);
        assert!(!rms.is_nan());
    }

    #[test]
    fn rms_of_i16_min_does_not_overflow() {
        // -32768 squared does not fit in i16; the f64 accumulation must not wrap.
        let rms = calculate_rms(&[i16::MIN, i16::MIN]);
        assert_eq!(rms, 32768.0);
    }

    #[test]
    fn rms_of_constant_signal_equals_amplitude() {
        let signal = vec![1000i16; 4410];
        assert!((calculate_rms(&signal) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn rms_of_sine_is_amplitude_over_sqrt_two() {
        let amplitude = 20000.0f64;
        let samples: Vec<i16> = (0..44100)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * 441.0 * i as f64 / 44100.0;
                (amplitude * phase.sin()).round() as i16
            })
            .collect();
        let rms = calculate_rms(&samples);
        let expected = amplitude / 2.0f64.sqrt();
        // Whole number of periods, so the estimate is tight.
        assert!(
            (rms - expected).abs() < 1.0,
            "expected ~{}, got {}",
            expected,
            rms
        );
    }
}
