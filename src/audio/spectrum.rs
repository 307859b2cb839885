use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Turns the newest window of samples into a pink-noise compensated magnitude spectrum.
///
/// The FFT is planned once and every buffer is allocated up front, so
/// `process` does no allocation.
pub struct SpectrumExtractor {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// rises with frequency to undo the typical 1/f roll-off of music
    power_normalization: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    log_scale: bool,
    count: u64,
}

impl SpectrumExtractor {
    pub fn new(window_size: usize, sample_rate_hz: u32, log_scale: bool) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            window: hamming_window(window_size),
            power_normalization: pink_noise_compensation(window_size / 2, sample_rate_hz),
            buffer: vec![Complex::new(0.0, 0.0); window_size],
            scratch,
            log_scale,
            count: 0,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window.len()
    }

    pub fn spectrum_len(&self) -> usize {
        self.power_normalization.len()
    }

    /// number of spectra computed so far
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn power_normalization(&self) -> &[f32] {
        &self.power_normalization
    }

    /// `samples` must be one full window. Writes `window_size / 2` values to `out`.
    pub fn process(&mut self, samples: &[f32], out: &mut [f32]) {
        self.magnitude_spectrum(samples, out);

        for (value, weight) in out.iter_mut().zip(&self.power_normalization) {
            *value *= weight;
        }

        self.count += 1;
    }

    /// Hamming windowed FFT magnitudes of bins `0..window_size / 2`.
    ///
    /// With `log_scale` the magnitudes are converted to dB relative to 1.0 and floored at 0.
    pub fn magnitude_spectrum(&mut self, samples: &[f32], out: &mut [f32]) {
        debug_assert_eq!(samples.len(), self.window.len());

        for ((slot, &sample), &w) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (value, bin) in out.iter_mut().zip(&self.buffer) {
            let magnitude = bin.norm();
            *value = if self.log_scale {
                (20.0 * magnitude.max(f32::MIN_POSITIVE).log10()).max(0.0)
            } else {
                magnitude
            };
        }
    }
}

fn hamming_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| {
            0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()
        })
        .collect()
}

/// Geometric ramp from 1 at DC up to log2(nyquist) at the top of the spectrum.
fn pink_noise_compensation(len: usize, sample_rate_hz: u32) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let top = (sample_rate_hz as f64 / 2.0).log2().log2();
    (0..len)
        .map(|i| (top * i as f64 / (len - 1) as f64).exp2() as f32)
        .collect()
}
