use serde::Deserialize;
use std::path::PathBuf;

use crate::audio::round_up_to_even;
use crate::error::{AnalyzerError, AnalyzerResult};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,
    /// Longer windows resolve frequency better at the cost of latency
    #[serde(default = "default_fft_window_ms")]
    pub fft_window_ms: f32,
    /// How many frames the producer appends per second. Sets the frame size.
    #[serde(default = "default_updates_per_second")]
    pub updates_per_second: f32,
    /// Zero or negative disables temporal smoothing
    #[serde(default = "default_smoothing_length_ms")]
    pub smoothing_length_ms: f32,
    #[serde(default = "default_frequency_bin_count")]
    pub frequency_bin_count: usize,
    /// 0.0-1.0
    #[serde(default = "default_equalizer_strength")]
    pub equalizer_strength: f32,
    #[serde(default = "default_true")]
    pub apply_frequency_smoothing: bool,
    #[serde(default)]
    pub log_scale: bool,
    #[serde(default = "default_rolling_stats_window_s")]
    pub rolling_stats_window_s: f32,
    /// Assumed rate of feature refreshes, used to size the equalizer history
    #[serde(default = "default_nominal_frame_rate")]
    pub nominal_frame_rate: f32,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub every: Option<usize>,
    #[serde(default)]
    pub equalizer: bool,
    #[serde(default)]
    pub spectrum: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate(),
            fft_window_ms: default_fft_window_ms(),
            updates_per_second: default_updates_per_second(),
            smoothing_length_ms: default_smoothing_length_ms(),
            frequency_bin_count: default_frequency_bin_count(),
            equalizer_strength: default_equalizer_strength(),
            apply_frequency_smoothing: default_true(),
            log_scale: false,
            rolling_stats_window_s: default_rolling_stats_window_s(),
            nominal_frame_rate: default_nominal_frame_rate(),
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_fft_window_ms() -> f32 { 50.0 }
fn default_updates_per_second() -> f32 { 10.0 }
fn default_smoothing_length_ms() -> f32 { 50.0 }
fn default_frequency_bin_count() -> usize { 51 }
fn default_equalizer_strength() -> f32 { 0.2 }
fn default_true() -> bool { true }
fn default_rolling_stats_window_s() -> f32 { 20.0 }
fn default_nominal_frame_rate() -> f32 { 30.0 }

/// Sizes derived from an [`AnalyzerConfig`]. Fixed for the lifetime of an analyzer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    /// FFT window length in samples (always even)
    pub window_size: usize,
    /// the window length actually used, after rounding to whole samples
    pub window_ms: f32,
    /// number of magnitudes in a spectrum, `window_size / 2`
    pub spectrum_len: usize,
    /// samples per `append_data` call
    pub frame_size: usize,
    pub windows_to_buffer: usize,
    pub bin_count: usize,
    pub rolling_capacity: usize,
    /// odd width of the cross-bin polynomial filter. only used when it exceeds 3
    pub filter_width: usize,
}

/// Largest FFT window or update frame, in samples
pub const MAX_WINDOW_SIZE: usize = 1 << 20;
/// Longest temporal smoothing span, in FFT windows
pub const MAX_SMOOTHING_WINDOWS: usize = 1024;
/// Most frames the rolling equalizer may remember
pub const MAX_ROLLING_FRAMES: usize = 1 << 16;

impl AnalyzerConfig {
    /// Validate the configuration and derive every buffer size from it.
    pub fn dimensions(&self) -> AnalyzerResult<Dimensions> {
        let rate = self.sample_rate_hz;
        if rate == 0 {
            return Err(AnalyzerError::InvalidSampleRate(rate));
        }

        let window_samples = rate as f64 * self.fft_window_ms as f64 / 1000.0;
        if window_samples > MAX_WINDOW_SIZE as f64 {
            return Err(AnalyzerError::WindowTooLong {
                window_ms: self.fft_window_ms,
                sample_rate: rate,
                max: MAX_WINDOW_SIZE,
            });
        }
        let window_size = round_up_to_even(window_samples);
        if window_size == 0 || !self.fft_window_ms.is_finite() {
            return Err(AnalyzerError::WindowTooShort {
                window_ms: self.fft_window_ms,
                sample_rate: rate,
            });
        }
        let spectrum_len = window_size / 2;
        let window_ms = 1000.0 * window_size as f32 / rate as f32;

        let frame_samples = rate as f64 / self.updates_per_second as f64;
        if !(self.updates_per_second > 0.0)
            || !self.updates_per_second.is_finite()
            || frame_samples > MAX_WINDOW_SIZE as f64
        {
            return Err(AnalyzerError::InvalidUpdateRate(self.updates_per_second));
        }
        let frame_size = round_up_to_even(frame_samples);
        if frame_size == 0 {
            return Err(AnalyzerError::InvalidUpdateRate(self.updates_per_second));
        }
        let windows_to_buffer = window_size.div_ceil(frame_size).max(1);

        let smoothing_ms = self.smoothing_length_ms;
        if !smoothing_ms.is_finite() || smoothing_ms / window_ms > MAX_SMOOTHING_WINDOWS as f32 {
            return Err(AnalyzerError::InvalidSmoothingLength {
                ms: smoothing_ms,
                max: MAX_SMOOTHING_WINDOWS,
            });
        }

        let bin_count = self.frequency_bin_count;
        if bin_count == 0 {
            return Err(AnalyzerError::InvalidBinCount);
        }
        if bin_count > spectrum_len {
            return Err(AnalyzerError::TooManyBins {
                bins: bin_count,
                spectrum_len,
            });
        }

        if !(0.0..=1.0).contains(&self.equalizer_strength) {
            return Err(AnalyzerError::InvalidEqualizerStrength(self.equalizer_strength));
        }

        let rolling = (self.rolling_stats_window_s * self.nominal_frame_rate).round();
        if !(1.0..=MAX_ROLLING_FRAMES as f32).contains(&rolling) {
            return Err(AnalyzerError::InvalidRollingWindow {
                seconds: self.rolling_stats_window_s,
                frame_rate: self.nominal_frame_rate,
                max: MAX_ROLLING_FRAMES,
            });
        }

        let filter_width = round_up_to_even(0.03 * bin_count as f64).saturating_sub(1);

        Ok(Dimensions {
            window_size,
            window_ms,
            spectrum_len,
            frame_size,
            windows_to_buffer,
            bin_count,
            rolling_capacity: rolling as usize,
            filter_width,
        })
    }
}

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_rounds_to_even_samples() {
        let config = AnalyzerConfig {
            sample_rate_hz: 48000,
            fft_window_ms: 50.0,
            ..Default::default()
        };
        let dims = config.dimensions().unwrap();
        assert_eq!(dims.window_size, 2400);
        assert_eq!(dims.spectrum_len, 1200);
        assert_eq!(dims.frame_size, 4800);
        assert_eq!(dims.windows_to_buffer, 1);
        assert_eq!(dims.rolling_capacity, 600);
        assert!((dims.window_ms - 50.0).abs() < 1e-4);
    }

    #[test]
    fn odd_sample_counts_round_up() {
        let config = AnalyzerConfig {
            sample_rate_hz: 44100,
            fft_window_ms: 50.0,
            updates_per_second: 30.0,
            ..Default::default()
        };
        let dims = config.dimensions().unwrap();
        // 2205 -> 2206, 1470 stays
        assert_eq!(dims.window_size, 2206);
        assert_eq!(dims.frame_size, 1470);
        assert_eq!(dims.windows_to_buffer, 2);
    }

    #[test]
    fn filter_width_tracks_bin_count() {
        let mut config = AnalyzerConfig {
            sample_rate_hz: 48000,
            ..Default::default()
        };
        assert_eq!(config.dimensions().unwrap().filter_width, 1);
        config.frequency_bin_count = 200;
        assert_eq!(config.dimensions().unwrap().filter_width, 5);
    }

    #[test]
    fn rejects_invalid_configs() {
        let base = AnalyzerConfig::default();

        let zero_rate = AnalyzerConfig { sample_rate_hz: 0, ..base.clone() };
        assert_eq!(zero_rate.dimensions(), Err(AnalyzerError::InvalidSampleRate(0)));

        let tiny_window = AnalyzerConfig { fft_window_ms: 0.0, ..base.clone() };
        assert!(matches!(
            tiny_window.dimensions(),
            Err(AnalyzerError::WindowTooShort { .. })
        ));

        let too_many = AnalyzerConfig { frequency_bin_count: 5000, ..base.clone() };
        assert_eq!(
            too_many.dimensions(),
            Err(AnalyzerError::TooManyBins { bins: 5000, spectrum_len: 1103 })
        );

        let no_bins = AnalyzerConfig { frequency_bin_count: 0, ..base.clone() };
        assert_eq!(no_bins.dimensions(), Err(AnalyzerError::InvalidBinCount));

        let strong = AnalyzerConfig { equalizer_strength: 1.5, ..base.clone() };
        assert!(strong.dimensions().unwrap_err().is_config());

        let no_updates = AnalyzerConfig { updates_per_second: 0.0, ..base.clone() };
        assert!(matches!(
            no_updates.dimensions(),
            Err(AnalyzerError::InvalidUpdateRate(_))
        ));

        let no_history = AnalyzerConfig { rolling_stats_window_s: 0.0, ..base };
        assert!(matches!(
            no_history.dimensions(),
            Err(AnalyzerError::InvalidRollingWindow { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_smoothing() {
        for ms in [f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
            let config = AnalyzerConfig { smoothing_length_ms: ms, ..Default::default() };
            let err = config.dimensions().unwrap_err();
            assert!(matches!(err, AnalyzerError::InvalidSmoothingLength { .. }), "{}ms", ms);
        }

        // 1024 windows of 50ms is fine, anything past it is not
        let longest = AnalyzerConfig {
            sample_rate_hz: 48000,
            smoothing_length_ms: 51_200.0,
            ..Default::default()
        };
        assert!(longest.dimensions().is_ok());
        let too_long = AnalyzerConfig { smoothing_length_ms: 1.0e9, ..longest };
        assert!(matches!(
            too_long.dimensions(),
            Err(AnalyzerError::InvalidSmoothingLength { max: MAX_SMOOTHING_WINDOWS, .. })
        ));

        // negative still just disables smoothing
        let off = AnalyzerConfig { smoothing_length_ms: -5.0, ..Default::default() };
        assert!(off.dimensions().is_ok());
    }

    #[test]
    fn rejects_oversized_buffers() {
        let base = AnalyzerConfig::default();

        for ms in [1.0e7, f32::INFINITY] {
            let huge_window = AnalyzerConfig { fft_window_ms: ms, ..base.clone() };
            assert!(matches!(
                huge_window.dimensions(),
                Err(AnalyzerError::WindowTooLong { max: MAX_WINDOW_SIZE, .. })
            ));
        }
        let nan_window = AnalyzerConfig { fft_window_ms: f32::NAN, ..base.clone() };
        assert!(matches!(
            nan_window.dimensions(),
            Err(AnalyzerError::WindowTooShort { .. })
        ));

        let glacial = AnalyzerConfig { updates_per_second: 1.0e-6, ..base.clone() };
        assert!(matches!(
            glacial.dimensions(),
            Err(AnalyzerError::InvalidUpdateRate(_))
        ));

        for seconds in [1.0e6, f32::INFINITY, f32::NAN] {
            let forever = AnalyzerConfig { rolling_stats_window_s: seconds, ..base.clone() };
            assert!(matches!(
                forever.dimensions(),
                Err(AnalyzerError::InvalidRollingWindow { max: MAX_ROLLING_FRAMES, .. })
            ));
        }
        let day = AnalyzerConfig { rolling_stats_window_s: 2184.0, ..base };
        assert_eq!(day.dimensions().unwrap().rolling_capacity, 65520);
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [analyzer]
            sample_rate_hz = 48000
            frequency_bin_count = 32
            log_scale = true

            [output]
            every = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.analyzer.sample_rate_hz, 48000);
        assert_eq!(config.analyzer.frequency_bin_count, 32);
        assert!(config.analyzer.log_scale);
        assert_eq!(config.analyzer.fft_window_ms, 50.0);
        assert!(config.analyzer.apply_frequency_smoothing);
        assert_eq!(config.output.every, Some(3));
        assert!(!config.output.spectrum);
    }
}
