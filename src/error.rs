use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),
    #[error("fft window of {window_ms}ms at {sample_rate}Hz rounds to zero samples")]
    WindowTooShort { window_ms: f32, sample_rate: u32 },
    #[error("fft window of {window_ms}ms at {sample_rate}Hz exceeds {max} samples")]
    WindowTooLong { window_ms: f32, sample_rate: u32, max: usize },
    #[error("updates per second must be positive and produce a frame of a sane size, got {0}")]
    InvalidUpdateRate(f32),
    #[error("frequency bin count must be at least 1")]
    InvalidBinCount,
    #[error("{bins} frequency bins requested but the spectrum only has {spectrum_len} values")]
    TooManyBins { bins: usize, spectrum_len: usize },
    #[error("equalizer strength must be within [0, 1], got {0}")]
    InvalidEqualizerStrength(f32),
    #[error("smoothing length must be finite and span at most {max} fft windows, got {ms}ms")]
    InvalidSmoothingLength { ms: f32, max: usize },
    #[error("rolling stats window of {seconds}s at {frame_rate} frames/s must hold between 1 and {max} frames")]
    InvalidRollingWindow { seconds: f32, frame_rate: f32, max: usize },
    #[error("smoothing filter: {0}")]
    SmoothingFilter(String),
    /// `append_data` was handed a chunk that isn't exactly one update frame
    #[error("expected a frame of {expected} samples, got {actual}")]
    FrameLength { expected: usize, actual: usize },
    #[error("sample {index} of the frame is not finite")]
    NonFiniteSample { index: usize },
}

impl AnalyzerError {
    /// true for errors raised while validating a configuration, as opposed to misuse at runtime
    pub fn is_config(&self) -> bool {
        !matches!(
            self,
            AnalyzerError::FrameLength { .. } | AnalyzerError::NonFiniteSample { .. }
        )
    }
}

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
