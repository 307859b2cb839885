//! Streaming spectral features
//!
//! samples -> RingBuffer -> SpectrumExtractor -> TemporalSmoother -> BinTable -> SavitzkyGolay
//!                                                                      \-> RollingEqualizer (side channel)
pub mod analysis;
pub mod bins;
pub mod decode;
pub mod equalizer;
pub mod features;
pub mod ring;
pub mod savgol;
pub mod spectrum;
pub mod temporal;

pub use analysis::{AnalyzerState, StreamAnalyzer};
pub use bins::BinTable;
pub use equalizer::RollingEqualizer;
pub use features::{FeatureFrame, OwnedFeatureFrame};
pub use ring::RingBuffer;
pub use savgol::SavitzkyGolay;
pub use spectrum::SpectrumExtractor;
pub use temporal::{build_smoothing_kernel, TemporalSmoother};

/// Round up to the next even integer. Negative and NaN inputs give 0.
pub fn round_up_to_even(value: f64) -> usize {
    ((value / 2.0).ceil() * 2.0) as usize
}

/// Frequency in Hz of linear spectrum index `index` for a `window_size` sample FFT.
pub fn index_to_frequency(index: usize, sample_rate_hz: u32, window_size: usize) -> f32 {
    (index as f64 * sample_rate_hz as f64 / window_size as f64) as f32
}
