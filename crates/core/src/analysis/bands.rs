use crate::{BandConfig, CityGrooveError, Result};

/// Energy integrated over the three coarse bands of one spectrum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandEnergies {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

/// Partitions spectrum bins into Low `[0, low_max_bin]`, Mid
/// `(low_max_bin, mid_max_bin]` and High `(mid_max_bin, bins)`.
///
/// Boundaries are derived once from the Hz limits and clamped so that all
/// three ranges are non-empty and ordered whatever the configuration says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandSplitter {
    bins: usize,
    low_max_bin: usize,
    mid_max_bin: usize,
}

impl BandSplitter {
    pub fn new(bins: usize, sample_rate: f32, config: &BandConfig) -> Result<Self> {
        if bins < 3 {
            return Err(CityGrooveError::config(format!(
                "band splitting needs at least 3 bins, got {bins}"
            )));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(CityGrooveError::config(format!(
                "sample rate must be a positive number, got {sample_rate}"
            )));
        }

        let nyquist = sample_rate * 0.5;
        let low_max_bin = hz_to_bin(config.low_max_hz, nyquist, bins).clamp(1, bins - 2);
        let mid_max_bin =
            hz_to_bin(config.mid_max_hz, nyquist, bins).clamp(low_max_bin + 1, bins - 1);

        Ok(Self {
            bins,
            low_max_bin,
            mid_max_bin,
        })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Last bin (inclusive) of the Low band.
    pub fn low_max_bin(&self) -> usize {
        self.low_max_bin
    }

    /// Last bin (inclusive) of the Mid band.
    pub fn mid_max_bin(&self) -> usize {
        self.mid_max_bin
    }

    pub fn split(&self, spectrum: &[f32]) -> Result<BandEnergies> {
        if spectrum.len() != self.bins {
            return Err(CityGrooveError::SpectrumLength {
                expected: self.bins,
                actual: spectrum.len(),
            });
        }

        Ok(BandEnergies {
            low: spectrum[..=self.low_max_bin].iter().sum(),
            mid: spectrum[self.low_max_bin + 1..=self.mid_max_bin].iter().sum(),
            high: spectrum[self.mid_max_bin + 1..].iter().sum(),
        })
    }
}

// Rounds half to even, matching the spectrum sources this was tuned against.
fn hz_to_bin(hz: u32, nyquist: f32, bins: usize) -> usize {
    let position = (hz as f32 / nyquist * bins as f32).round_ties_even();
    // Saturating cast: negative or NaN become 0, huge values usize::MAX.
    position as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(low_max_hz: u32, mid_max_hz: u32) -> BandConfig {
        BandConfig {
            low_max_hz,
            mid_max_hz,
            ..BandConfig::default()
        }
    }

    #[test]
    fn derives_bins_from_hz_limits() {
        let splitter = BandSplitter::new(1024, 44_100.0, &config(200, 2000)).unwrap();
        assert_eq!(splitter.low_max_bin(), 9);
        assert_eq!(splitter.mid_max_bin(), 93);
    }

    #[test]
    fn assigns_each_bin_to_exactly_one_band() {
        let splitter = BandSplitter::new(1024, 44_100.0, &config(200, 2000)).unwrap();

        let mut spectrum = vec![0.0; 1024];
        spectrum[9] = 1.0;
        spectrum[10] = 10.0;
        spectrum[93] = 100.0;
        spectrum[94] = 1000.0;
        spectrum[1023] = 10_000.0;

        let bands = splitter.split(&spectrum).unwrap();
        assert_eq!(bands.low, 1.0);
        assert_eq!(bands.mid, 110.0);
        assert_eq!(bands.high, 11_000.0);
    }

    #[test]
    fn clamps_pathological_limits_into_ordered_ranges() {
        // Both limits far above Nyquist.
        let splitter = BandSplitter::new(256, 8_000.0, &config(50_000, 90_000)).unwrap();
        assert_eq!(splitter.low_max_bin(), 254);
        assert_eq!(splitter.mid_max_bin(), 255);

        // Mid limit below the low limit.
        let splitter = BandSplitter::new(256, 48_000.0, &config(5_000, 1_000)).unwrap();
        assert!(splitter.low_max_bin() < splitter.mid_max_bin());

        let bands = splitter.split(&[1.0; 256]).unwrap();
        assert!(bands.low > 0.0 && bands.mid > 0.0 && bands.high > 0.0);
    }

    #[test]
    fn rejects_spectrum_of_another_length() {
        let splitter = BandSplitter::new(512, 48_000.0, &BandConfig::default()).unwrap();
        let err = splitter.split(&[0.0; 256]).unwrap_err();
        assert!(matches!(
            err,
            CityGrooveError::SpectrumLength {
                expected: 512,
                actual: 256
            }
        ));
    }
}
