use nalgebra::DMatrix;

use crate::error::{AnalyzerError, AnalyzerResult};

/// Savitzky-Golay smoothing: a least-squares polynomial fit over a sliding window.
///
/// Points within half a window of either edge are taken from a fit over the
/// first (or last) full window, so the output has the same length as the input.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    /// `window x window`, row-major. row `j` evaluates the fit at window position `j`
    projection: Vec<f32>,
}

impl SavitzkyGolay {
    pub fn new(window: usize, order: usize) -> AnalyzerResult<Self> {
        if window % 2 == 0 {
            return Err(AnalyzerError::SmoothingFilter(format!(
                "window must be odd, got {}",
                window
            )));
        }
        if window <= order {
            return Err(AnalyzerError::SmoothingFilter(format!(
                "window {} is too short for a degree {} polynomial",
                window, order
            )));
        }

        let half = (window / 2) as f64;
        let vandermonde =
            DMatrix::<f64>::from_fn(window, order + 1, |r, c| (r as f64 - half).powi(c as i32));
        let gram = vandermonde.transpose() * &vandermonde;
        let inverse = gram.try_inverse().ok_or_else(|| {
            AnalyzerError::SmoothingFilter("polynomial fit is singular".to_string())
        })?;
        let hat = &vandermonde * inverse * vandermonde.transpose();

        let mut projection = Vec::with_capacity(window * window);
        for r in 0..window {
            for c in 0..window {
                projection.push(hat[(r, c)] as f32);
            }
        }

        Ok(Self { window, projection })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Smooth `input` into `out`. Both must be at least one window long.
    pub fn apply(&self, input: &[f32], out: &mut [f32]) {
        let n = input.len();
        assert!(n >= self.window, "need {} values, got {}", self.window, n);
        debug_assert_eq!(n, out.len());

        let half = self.window / 2;
        for (i, value) in out.iter_mut().enumerate() {
            let start = i.saturating_sub(half).min(n - self.window);
            let row = i - start;
            let weights = &self.projection[row * self.window..(row + 1) * self.window];

            *value = weights
                .iter()
                .zip(&input[start..start + self.window])
                .map(|(w, x)| w * x)
                .sum();
        }
    }
}
