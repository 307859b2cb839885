use serde::Serialize;

/// Output of one analyzer refresh, borrowed from the analyzer's buffers.
///
/// All four slices have fixed lengths for the analyzer's lifetime.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct FeatureFrame<'a> {
    /// Hz of each spectrum value (`window_size / 2` long, never changes)
    pub frequencies: &'a [f32],
    /// Smoothed, pink-noise compensated magnitudes. Non-negative and finite.
    pub spectrum: &'a [f32],
    /// Hz at the centre of each bin. Empty bins read as 0.
    pub bin_centres: &'a [f32],
    /// Mean magnitude per bin, low frequencies first. Non-negative and finite.
    pub bin_energies: &'a [f32],
}

impl FeatureFrame<'_> {
    pub fn to_owned(&self) -> OwnedFeatureFrame {
        OwnedFeatureFrame {
            frequencies: self.frequencies.to_vec(),
            spectrum: self.spectrum.to_vec(),
            bin_centres: self.bin_centres.to_vec(),
            bin_energies: self.bin_energies.to_vec(),
        }
    }

    /// index of the loudest bin, if any bin has energy
    pub fn loudest_bin(&self) -> Option<usize> {
        self.bin_energies
            .iter()
            .enumerate()
            .filter(|(_, e)| **e > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }
}

/// A [`FeatureFrame`] detached from the analyzer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OwnedFeatureFrame {
    pub frequencies: Vec<f32>,
    pub spectrum: Vec<f32>,
    pub bin_centres: Vec<f32>,
    pub bin_energies: Vec<f32>,
}
