//! Reference spectrum source.
//!
//! The analysis consumes one magnitude spectrum per tick and does not care
//! where it comes from. [`SpectrumAnalyzer`] is the small collaborator used by
//! the command line host and by tests: it windows a block of PCM samples,
//! runs a real FFT and keeps the magnitudes of the lower half.

use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{CityGrooveError, Result};

/// Window applied to a sample block before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumWindow {
    Rectangular,
    Triangle,
    Hamming,
    Hanning,
    Blackman,
    #[default]
    BlackmanHarris,
}

impl SpectrumWindow {
    /// Window coefficient for sample `index` of a block of `len` samples.
    pub fn coefficient(self, index: usize, len: usize) -> f32 {
        if len <= 1 {
            return 1.0;
        }

        let phase = 2.0 * PI * index as f32 / (len as f32 - 1.0);
        match self {
            Self::Rectangular => 1.0,
            Self::Triangle => 1.0 - (2.0 * index as f32 / (len as f32 - 1.0) - 1.0).abs(),
            Self::Hamming => 0.54 - 0.46 * phase.cos(),
            Self::Hanning => 0.5 - 0.5 * phase.cos(),
            Self::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
            Self::BlackmanHarris => {
                0.35875 - 0.48829 * phase.cos() + 0.14128 * (2.0 * phase).cos()
                    - 0.01168 * (3.0 * phase).cos()
            }
        }
    }
}

/// Turns blocks of `2 × bins` samples into `bins` non-negative magnitudes,
/// linearly spaced from 0 Hz up to (but excluding) Nyquist.
pub struct SpectrumAnalyzer {
    bins: usize,
    window: SpectrumWindow,
    coefficients: Vec<f32>,
    scale: f32,
    plan: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(bins: usize, window: SpectrumWindow) -> Result<Self> {
        if bins == 0 {
            return Err(CityGrooveError::config(
                "spectrum analyzer needs at least one bin",
            ));
        }

        let block = bins * 2;
        let plan = RealFftPlanner::<f32>::new().plan_fft_forward(block);
        let coefficients: Vec<f32> = (0..block)
            .map(|index| window.coefficient(index, block))
            .collect();
        let window_sum: f32 = coefficients.iter().sum();
        let scale = if window_sum > f32::EPSILON {
            1.0 / window_sum
        } else {
            1.0
        };

        Ok(Self {
            bins,
            window,
            coefficients,
            scale,
            input: plan.make_input_vec(),
            spectrum: plan.make_output_vec(),
            scratch: plan.make_scratch_vec(),
            plan,
            magnitudes: vec![0.0; bins],
        })
    }

    /// Number of magnitudes produced per block.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Number of samples expected per block.
    pub fn block_size(&self) -> usize {
        self.bins * 2
    }

    pub fn window(&self) -> SpectrumWindow {
        self.window
    }

    /// Analyses one block and returns the magnitude spectrum. The returned
    /// slice is overwritten by the next call.
    pub fn process(&mut self, samples: &[f32]) -> Result<&[f32]> {
        if samples.len() != self.block_size() {
            return Err(CityGrooveError::InvalidInput(
                "sample block must hold exactly twice as many samples as spectrum bins",
            ));
        }

        for ((slot, sample), weight) in self
            .input
            .iter_mut()
            .zip(samples)
            .zip(&self.coefficients)
        {
            *slot = sample * weight;
        }

        self.plan
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)?;

        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.spectrum) {
            *magnitude = bin.norm() * self.scale;
        }

        Ok(&self.magnitudes)
    }
}

impl fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("bins", &self.bins)
            .field("window", &self.window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_taper_to_the_edges() {
        let len = 1024;
        for window in [
            SpectrumWindow::Triangle,
            SpectrumWindow::Hanning,
            SpectrumWindow::Blackman,
            SpectrumWindow::BlackmanHarris,
        ] {
            assert!(window.coefficient(0, len).abs() < 0.01, "{window:?}");
            assert!(window.coefficient(len - 1, len).abs() < 0.01, "{window:?}");
        }
        assert!((SpectrumWindow::Hamming.coefficient(0, len) - 0.08).abs() < 1e-4);
        assert_eq!(SpectrumWindow::Rectangular.coefficient(17, len), 1.0);
    }

    #[test]
    fn silence_has_an_empty_spectrum() {
        let mut analyzer = SpectrumAnalyzer::new(256, SpectrumWindow::Hanning).unwrap();
        assert_eq!(analyzer.window(), SpectrumWindow::Hanning);
        assert_eq!(analyzer.bins(), 256);
        let spectrum = analyzer.process(&[0.0; 512]).unwrap();
        assert_eq!(spectrum.len(), 256);
        assert!(spectrum.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let bins = 256;
        let sample_rate = 8_192.0_f32;
        let mut analyzer = SpectrumAnalyzer::new(bins, SpectrumWindow::BlackmanHarris).unwrap();
        // Bin width is sample_rate / (2 * bins) = 16 Hz, so 640 Hz is bin 40.
        let samples: Vec<f32> = (0..bins * 2)
            .map(|i| (2.0 * PI * 640.0 * i as f32 / sample_rate).sin())
            .collect();

        let spectrum = analyzer.process(&samples).unwrap();
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index)
            .unwrap();
        assert_eq!(peak, 40);
        assert!(spectrum.iter().all(|value| *value >= 0.0));
    }

    #[test]
    fn rejects_blocks_of_the_wrong_size() {
        let mut analyzer = SpectrumAnalyzer::new(256, SpectrumWindow::Hanning).unwrap();
        assert!(matches!(
            analyzer.process(&[0.0; 256]),
            Err(CityGrooveError::InvalidInput(_))
        ));
    }
}
