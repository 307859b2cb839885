use ringbuf::traits::{Consumer, RingBuffer as _};
use ringbuf::HeapRb;

/// Fixed-capacity circular buffer of equal-width rows of `f32`.
///
/// Used for raw sample frames, the temporal smoothing history and the rolling
/// bin-energy history. Backed by a pre-filled `HeapRb` of `rows * width`
/// values; pushing a row overwrites the oldest one. Every push is exactly one
/// row, so the ring's two slices always split on a row boundary.
pub struct RingBuffer {
    width: usize,
    capacity: usize,
    values: HeapRb<f32>,
    /// rows pushed so far, saturating at `capacity`
    filled: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize, width: usize, fill: f32) -> Self {
        assert!(capacity > 0 && width > 0, "ring buffer needs at least one non-empty row");

        let mut values = HeapRb::<f32>::new(capacity * width);
        values.push_iter_overwrite(std::iter::repeat(fill).take(capacity * width));

        Self {
            width,
            capacity,
            values,
            filled: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// number of rows pushed, at most `capacity`
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.capacity
    }

    /// total scalars held, including fill values that haven't been overwritten yet
    pub fn total_values(&self) -> usize {
        self.capacity * self.width
    }

    /// Overwrite the oldest row. `row` must be exactly `width` long.
    pub fn push(&mut self, row: &[f32]) {
        assert_eq!(row.len(), self.width, "ring rows are {} wide", self.width);

        self.values.push_slice_overwrite(row);
        self.filled = (self.filled + 1).min(self.capacity);
    }

    /// The newest `n` pushed rows, oldest first. `n` is capped at `len()`.
    pub fn recent_rows(&self, n: usize) -> impl Iterator<Item = &[f32]> + '_ {
        let n = n.min(self.filled);
        let (oldest, newest) = self.values.as_slices();
        oldest
            .chunks_exact(self.width)
            .chain(newest.chunks_exact(self.width))
            .skip(self.capacity - n)
    }

    /// Copy the last `out.len()` scalars in chronological order into `out`.
    ///
    /// Before enough rows have been pushed the front of `out` holds the fill value.
    pub fn copy_most_recent(&self, out: &mut [f32]) {
        let n = out.len();
        let total = self.total_values();
        assert!(n <= total, "asked for {} values from a ring of {}", n, total);

        let (oldest, newest) = self.values.as_slices();
        if n <= newest.len() {
            out.copy_from_slice(&newest[newest.len() - n..]);
        } else {
            let from_oldest = n - newest.len();
            out[..from_oldest].copy_from_slice(&oldest[oldest.len() - from_oldest..]);
            out[from_oldest..].copy_from_slice(newest);
        }
    }
}
