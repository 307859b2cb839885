use super::ring::RingBuffer;

/// Long-run per-bin means with a floor pulled toward the global mean.
///
/// Nothing here rescales the primary energies. `means` is handed out for
/// callers that want to divide by it.
pub struct RollingEqualizer {
    history: RingBuffer,
    strength: f32,
    means: Vec<f32>,
    floor: f32,
}

impl RollingEqualizer {
    /// Each mean is floored at `(1 - strength)` times the mean of all bin means.
    pub fn new(capacity: usize, bin_count: usize, strength: f32) -> Self {
        Self {
            history: RingBuffer::new(capacity, bin_count, 0.0),
            strength,
            means: vec![1.0; bin_count],
            floor: 0.0,
        }
    }

    pub fn update(&mut self, energies: &[f32]) {
        self.history.push(energies);

        self.means.fill(0.0);
        let frames = self.history.len();
        for row in self.history.recent_rows(frames) {
            for (mean, &value) in self.means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in self.means.iter_mut() {
            *mean /= frames as f32;
        }

        let global = self.means.iter().sum::<f32>() / self.means.len() as f32;
        self.floor = (1.0 - self.strength) * global;
        for mean in self.means.iter_mut() {
            *mean = mean.max(self.floor);
        }
    }

    /// Equalized per-bin means. All ones until the first update.
    pub fn means(&self) -> &[f32] {
        &self.means
    }

    /// floor applied on the last update
    pub fn floor(&self) -> f32 {
        self.floor
    }

    pub fn frames(&self) -> usize {
        self.history.len()
    }
}
