/// Result alias that carries the custom [`CityGrooveError`] type.
pub type Result<T> = std::result::Result<T, CityGrooveError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum CityGrooveError {
    /// Static configuration that cannot be used. Raised once at construction,
    /// never per tick.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The spectrum handed to a tick does not have the length the band
    /// boundaries were derived from.
    #[error("spectrum length changed: expected {expected} bins, got {actual}")]
    SpectrumLength { expected: usize, actual: usize },
    /// Per-call input that violates the documented contract.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Failure reported by the FFT backend.
    #[error("fft error: {0}")]
    Fft(String),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

impl CityGrooveError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<realfft::FftError> for CityGrooveError {
    fn from(value: realfft::FftError) -> Self {
        Self::Fft(value.to_string())
    }
}
