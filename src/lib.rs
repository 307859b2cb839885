//! Streaming spectral features for audio-reactive visuals and lights.
//!
//! Feed raw samples in with [`StreamAnalyzer::append_data`] and poll
//! [`StreamAnalyzer::get_audio_features`] for a temporally smoothed,
//! log-binned view of the spectrum.
pub mod audio;
pub mod config;
pub mod error;

pub use audio::{AnalyzerState, FeatureFrame, OwnedFeatureFrame, StreamAnalyzer};
pub use config::{AnalyzerConfig, Dimensions};
pub use error::{AnalyzerError, AnalyzerResult};
