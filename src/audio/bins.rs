use std::ops::Range;

use super::index_to_frequency;

/// Maps linear spectrum indices onto `bin_count` log2-spaced bins.
///
/// Low frequencies get narrow bins and high frequencies wide ones, roughly
/// following how energy in music (and hearing) is spread across octaves.
/// Built once, never mutated.
#[derive(Debug, Clone)]
pub struct BinTable {
    /// bin id of every spectrum index
    bin_of: Vec<usize>,
    /// spectrum indices of every bin. ids never decrease so these are contiguous
    members: Vec<Range<usize>>,
    /// mean frequency of each bin's indices. NaN for empty bins
    centres: Vec<f32>,
}

impl BinTable {
    /// `frequencies[i]` is the frequency of spectrum index `i`
    pub fn new(frequencies: &[f32], bin_count: usize) -> Self {
        let bin_of = log_spaced_bin_ids(frequencies.len(), bin_count);

        Self::from_bin_ids(bin_of, bin_count, frequencies)
    }

    /// Build the lookup tables from an explicit, non-decreasing index -> bin assignment.
    ///
    /// Panics if an id goes backwards or is not below `bin_count`.
    pub(crate) fn from_bin_ids(bin_of: Vec<usize>, bin_count: usize, frequencies: &[f32]) -> Self {
        assert_eq!(bin_of.len(), frequencies.len());
        assert!(
            bin_of.windows(2).all(|w| w[0] <= w[1]),
            "bin ids must never decrease"
        );
        assert!(
            bin_of.iter().all(|&b| b < bin_count),
            "bin ids must be below {}",
            bin_count
        );

        let mut members = Vec::with_capacity(bin_count);
        let mut start = 0;
        for bin in 0..bin_count {
            let end = start + bin_of[start..].iter().take_while(|&&b| b == bin).count();
            members.push(start..end);
            start = end;
        }

        let centres = members
            .iter()
            .map(|range| mean(&frequencies[range.clone()]))
            .collect();

        Self {
            bin_of,
            members,
            centres,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.members.len()
    }

    pub fn spectrum_len(&self) -> usize {
        self.bin_of.len()
    }

    pub fn bin_of(&self, index: usize) -> usize {
        self.bin_of[index]
    }

    pub fn members(&self, bin: usize) -> Range<usize> {
        self.members[bin].clone()
    }

    /// Raw centre frequencies. Empty bins are NaN.
    pub fn centres(&self) -> &[f32] {
        &self.centres
    }

    /// Mean magnitude of each bin's indices. Empty bins come out as NaN.
    pub fn aggregate(&self, spectrum: &[f32], energies: &mut [f32]) {
        debug_assert_eq!(spectrum.len(), self.bin_of.len());

        for (energy, range) in energies.iter_mut().zip(&self.members) {
            *energy = mean(&spectrum[range.clone()]);
        }
    }
}

fn mean(values: &[f32]) -> f32 {
    // empty slices give 0/0 = NaN
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    (sum / values.len() as f64) as f32
}

/// Assign every index of a `len` long spectrum to one of `bin_count` bins.
///
/// A log2 sequence falling from `len` to 1 is flipped and rescaled so bin ids
/// climb quickly at low indices and slowly at high ones. Each id is then capped
/// by its own index so no low index jumps ahead to a high bin, shifted to start
/// at 0, and clamped to the last bin.
pub fn log_spaced_bin_ids(len: usize, bin_count: usize) -> Vec<usize> {
    assert!(bin_count > 0);
    if len <= 1 {
        return vec![0; len];
    }

    let start = (len as f64).log2();
    let step = -start / (len - 1) as f64;
    let raw: Vec<f64> = (0..len)
        .map(|i| (start + i as f64 * step).exp2() - 1.0)
        .collect();
    let max = raw.iter().copied().fold(f64::MIN, f64::max);
    let scale = len as f64 / bin_count as f64;

    let ids: Vec<i64> = raw
        .iter()
        .map(|r| ((max - r) / scale).round_ties_even() as i64)
        .collect();
    let min_id = ids.iter().copied().min().unwrap_or(0);

    ids.iter()
        .enumerate()
        .map(|(i, &id)| {
            let shifted = (id - min_id) as usize;
            shifted.min(i).min(bin_count - 1)
        })
        .collect()
}

/// Frequencies of every linear spectrum index.
pub fn frequency_axis(spectrum_len: usize, sample_rate_hz: u32, window_size: usize) -> Vec<f32> {
    (0..spectrum_len)
        .map(|i| index_to_frequency(i, sample_rate_hz, window_size))
        .collect()
}
