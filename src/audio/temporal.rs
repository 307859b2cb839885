use super::ring::RingBuffer;
use super::round_up_to_even;

/// Weights for averaging the last few spectra, oldest first.
///
/// The rising half of a Gaussian truncated at two sigma, so the newest spectrum
/// weighs most. Normalized to a mean of 1. Empty when `smoothing_ms` is not positive.
pub fn build_smoothing_kernel(window_ms: f32, smoothing_ms: f32) -> Vec<f32> {
    if !(smoothing_ms > 0.0) || !(window_ms > 0.0) {
        return Vec::new();
    }

    let buffer_len = round_up_to_even((smoothing_ms / window_ms) as f64) + 1;
    let sigma = buffer_len as f32 / 3.0;
    let radius = (2.0 * sigma + 0.5) as usize;

    let mut kernel: Vec<f32> = (0..=radius)
        .map(|i| {
            let x = (radius - i) as f32;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();

    let mean = kernel.iter().sum::<f32>() / kernel.len() as f32;
    for w in kernel.iter_mut() {
        *w /= mean;
    }

    log::debug!("smoothing kernel: {} frames, {:?}", kernel.len(), kernel);

    kernel
}

/// Kernel-weighted average over the last `kernel.len()` spectra. An empty kernel disables it.
pub struct TemporalSmoother {
    kernel: Vec<f32>,
    /// None when smoothing is disabled
    history: Option<RingBuffer>,
}

impl TemporalSmoother {
    pub fn new(kernel: Vec<f32>, spectrum_len: usize) -> Self {
        let history = if kernel.is_empty() {
            None
        } else {
            Some(RingBuffer::new(kernel.len(), spectrum_len, 0.0))
        };

        Self { kernel, history }
    }

    pub fn is_enabled(&self) -> bool {
        self.history.is_some()
    }

    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }

    /// true once enough spectra have been seen to produce smoothed output
    pub fn is_warm(&self) -> bool {
        self.history.as_ref().is_some_and(|h| h.is_full())
    }

    /// Record the raw `spectrum` and replace it with the smoothed one.
    ///
    /// Until the history holds a full kernel's worth of spectra the raw spectrum passes through.
    pub fn smooth(&mut self, spectrum: &mut [f32]) {
        let Some(history) = self.history.as_mut() else {
            return;
        };

        history.push(spectrum);
        if !history.is_full() {
            return;
        }

        spectrum.fill(0.0);
        for (row, &weight) in history.recent_rows(self.kernel.len()).zip(&self.kernel) {
            for (out, &value) in spectrum.iter_mut().zip(row) {
                *out += weight * value;
            }
        }

        let frames = self.kernel.len() as f32;
        for out in spectrum.iter_mut() {
            *out /= frames;
        }
    }
}
