use crate::config::{AnalyzerConfig, Dimensions};
use crate::error::{AnalyzerError, AnalyzerResult};

use super::bins::{frequency_axis, BinTable};
use super::equalizer::RollingEqualizer;
use super::features::FeatureFrame;
use super::ring::RingBuffer;
use super::savgol::SavitzkyGolay;
use super::spectrum::SpectrumExtractor;
use super::temporal::{build_smoothing_kernel, TemporalSmoother};

const POST_FILTER_ORDER: usize = 3;

/// Whether the cached features reflect every appended frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyzerState {
    Clean,
    Dirty,
}

/// Streams raw samples in and hands smoothed, log-binned spectral features out.
///
/// `append_data` only buffers. The pipeline runs lazily, at most once per
/// append cycle, when `get_audio_features` finds new data. Not thread safe:
/// callers with a separate producer and consumer must serialize access.
pub struct StreamAnalyzer {
    config: AnalyzerConfig,
    dims: Dimensions,
    state: AnalyzerState,

    samples: RingBuffer,
    extractor: SpectrumExtractor,
    smoother: TemporalSmoother,
    bins: BinTable,
    equalizer: RollingEqualizer,
    post_filter: Option<SavitzkyGolay>,

    frequencies: Vec<f32>,
    bin_centres: Vec<f32>,
    /// scratch for the newest FFT window
    window: Vec<f32>,
    spectrum: Vec<f32>,
    energies: Vec<f32>,
    /// scratch for the post filter
    filtered: Vec<f32>,
    strongest_frequency: f32,
}

impl StreamAnalyzer {
    pub fn new(config: AnalyzerConfig) -> AnalyzerResult<Self> {
        let dims = config.dimensions()?;
        let rate = config.sample_rate_hz;

        let frequencies = frequency_axis(dims.spectrum_len, rate, dims.window_size);
        let bins = BinTable::new(&frequencies, dims.bin_count);
        let bin_centres = bins
            .centres()
            .iter()
            .map(|c| if c.is_finite() { *c } else { 0.0 })
            .collect();

        let kernel = build_smoothing_kernel(dims.window_ms, config.smoothing_length_ms);
        let smoother = TemporalSmoother::new(kernel, dims.spectrum_len);

        let post_filter = if config.apply_frequency_smoothing && dims.filter_width > 3 {
            Some(SavitzkyGolay::new(dims.filter_width, POST_FILTER_ORDER)?)
        } else {
            None
        };

        log::info!(
            "Using FFT window of {} samples ({:.1}ms) at {}Hz, {} samples per update, {} bins",
            dims.window_size,
            dims.window_ms,
            rate,
            dims.frame_size,
            dims.bin_count
        );
        log::debug!(
            "buffering {} frames, smoothing over {} spectra, rolling stats over {} frames, post filter {:?}",
            dims.windows_to_buffer,
            smoother.kernel().len(),
            dims.rolling_capacity,
            post_filter.as_ref().map(|f| f.window())
        );

        Ok(Self {
            samples: RingBuffer::new(dims.windows_to_buffer, dims.frame_size, 0.0),
            extractor: SpectrumExtractor::new(dims.window_size, rate, config.log_scale),
            smoother,
            bins,
            equalizer: RollingEqualizer::new(
                dims.rolling_capacity,
                dims.bin_count,
                config.equalizer_strength,
            ),
            post_filter,
            frequencies,
            bin_centres,
            window: vec![0.0; dims.window_size],
            spectrum: vec![0.0; dims.spectrum_len],
            energies: vec![0.0; dims.bin_count],
            filtered: vec![0.0; dims.bin_count],
            strongest_frequency: 0.0,
            state: AnalyzerState::Clean,
            config,
            dims,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dims
    }

    pub fn state(&self) -> AnalyzerState {
        self.state
    }

    /// Samples `append_data` expects per call
    pub fn frame_size(&self) -> usize {
        self.dims.frame_size
    }

    /// Buffer exactly one frame of finite samples. The next `get_audio_features` recomputes.
    ///
    /// A rejected frame leaves the analyzer untouched.
    pub fn append_data(&mut self, samples: &[f32]) -> AnalyzerResult<()> {
        if samples.len() != self.dims.frame_size {
            return Err(AnalyzerError::FrameLength {
                expected: self.dims.frame_size,
                actual: samples.len(),
            });
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalyzerError::NonFiniteSample { index });
        }

        self.samples.push(samples);
        self.invalidate();

        Ok(())
    }

    /// Mark the cached features stale
    pub fn invalidate(&mut self) {
        self.state = AnalyzerState::Dirty;
    }

    /// Run the pipeline if anything changed since the last refresh.
    pub fn refresh(&mut self) {
        if self.state == AnalyzerState::Clean {
            return;
        }

        self.update_features();
        self.update_rolling_stats();
        self.post_process();

        self.state = AnalyzerState::Clean;
    }

    /// Latest features. Cached between appends, so polling is cheap.
    ///
    /// Before any data arrives the spectrum and energies are all zero. Until
    /// the sample buffer has filled the window is zero-padded at the front.
    pub fn get_audio_features(&mut self) -> FeatureFrame<'_> {
        self.refresh();
        self.features()
    }

    /// Cached features, without refreshing
    pub fn features(&self) -> FeatureFrame<'_> {
        FeatureFrame {
            frequencies: &self.frequencies,
            spectrum: &self.spectrum,
            bin_centres: &self.bin_centres,
            bin_energies: &self.energies,
        }
    }

    /// Long-run per-bin means for normalizing `bin_energies` externally. Never applied here.
    pub fn equalizer_means(&self) -> &[f32] {
        self.equalizer.means()
    }

    /// Frequency of the strongest spectrum value at the last refresh
    pub fn strongest_frequency(&self) -> f32 {
        self.strongest_frequency
    }

    /// Number of spectra computed so far
    pub fn fft_count(&self) -> u64 {
        self.extractor.count()
    }

    fn update_features(&mut self) {
        self.samples.copy_most_recent(&mut self.window);
        self.extractor.process(&self.window, &mut self.spectrum);
        // finite samples can still overflow the FFT or the kernel sum
        sanitize(&mut self.spectrum);
        self.smoother.smooth(&mut self.spectrum);
        sanitize(&mut self.spectrum);

        let strongest = self
            .spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.strongest_frequency = self.frequencies.get(strongest).copied().unwrap_or(0.0);

        self.bins.aggregate(&self.spectrum, &mut self.energies);
        sanitize(&mut self.energies);

        log::trace!(
            "spectrum #{}: strongest {:.1}Hz",
            self.extractor.count(),
            self.strongest_frequency
        );
    }

    fn update_rolling_stats(&mut self) {
        self.equalizer.update(&self.energies);
    }

    fn post_process(&mut self) {
        if let Some(filter) = &self.post_filter {
            filter.apply(&self.energies, &mut self.filtered);
            self.energies.copy_from_slice(&self.filtered);
        }

        sanitize(&mut self.energies);
    }
}

/// NaN, infinite and negative values become 0
fn sanitize(values: &mut [f32]) {
    for v in values.iter_mut() {
        if !(*v > 0.0) || !v.is_finite() {
            *v = 0.0;
        }
    }
}
