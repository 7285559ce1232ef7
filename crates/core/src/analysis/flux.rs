use crate::{CityGrooveError, Result};

/// Positive spectral flux between consecutive spectra.
///
/// Only increases count, so the value follows attack energy and ignores the
/// natural decay of a sound.
#[derive(Debug, Clone)]
pub struct FluxComputer {
    previous: Vec<f32>,
}

impl FluxComputer {
    /// Creates a computer whose previous spectrum is all zeros.
    pub fn new(bins: usize) -> Self {
        Self {
            previous: vec![0.0; bins],
        }
    }

    pub fn bins(&self) -> usize {
        self.previous.len()
    }

    /// Returns the flux of `spectrum` against the stored spectrum and then
    /// stores `spectrum` for the next call.
    pub fn compute(&mut self, spectrum: &[f32]) -> Result<f32> {
        if spectrum.len() != self.previous.len() {
            return Err(CityGrooveError::SpectrumLength {
                expected: self.previous.len(),
                actual: spectrum.len(),
            });
        }

        let flux = spectrum
            .iter()
            .zip(&self.previous)
            .map(|(current, previous)| (current - previous).max(0.0))
            .sum();
        self.previous.copy_from_slice(spectrum);
        Ok(flux)
    }

    pub fn reset(&mut self) {
        self.previous.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_measured_against_silence() {
        let mut flux = FluxComputer::new(4);
        assert_eq!(flux.bins(), 4);
        assert_eq!(flux.compute(&[1.0, 2.0, 0.0, 0.5]).unwrap(), 3.5);
    }

    #[test]
    fn repeated_frame_has_no_flux() {
        let mut flux = FluxComputer::new(4);
        flux.compute(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(flux.compute(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 0.0);
    }

    #[test]
    fn ignores_decreasing_bins() {
        let mut flux = FluxComputer::new(4);
        flux.compute(&[4.0, 4.0, 0.0, 0.0]).unwrap();
        assert_eq!(flux.compute(&[1.0, 5.0, 0.0, 2.0]).unwrap(), 3.0);
    }

    #[test]
    fn length_mismatch_leaves_state_untouched() {
        let mut flux = FluxComputer::new(4);
        flux.compute(&[1.0; 4]).unwrap();
        assert!(flux.compute(&[1.0; 5]).is_err());
        assert_eq!(flux.compute(&[1.0; 4]).unwrap(), 0.0);
    }
}
