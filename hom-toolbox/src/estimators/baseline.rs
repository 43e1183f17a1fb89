//! Noise baseline estimation from the gaps between correlation peaks.

use crate::errors::Error;
use crate::estimators::{windows, IntegrationRequest};

/// Estimates the per-bin noise baseline of a correlation histogram.
///
/// For every side-peak pair `k` and `k + 1` (k = 1..=num_side_peaks, on
/// both sides of the center) the counts strictly between the two peaks are
/// averaged, inset by `2 * peak_width` from each peak so that the peak
/// skirts cannot leak into the estimate. The baseline is the mean of the
/// per-gap means.
///
/// Fails with `BaselineUndefined` when `4 * peak_width > separation`, in
/// which case the inset windows have no interior, or when every gap window
/// falls outside the histogram. Callers can retry without baseline
/// subtraction.
pub fn estimate(y: &[f64], request: &IntegrationRequest) -> Result<f64, Error> {
    let width = request.peak_width;
    if 4 * width > request.separation {
        return Err(Error::BaselineUndefined(format!(
            "peaks too wide for baseline windows: 4 x peak_width ({}) exceeds separation ({})",
            4 * width,
            request.separation
        )));
    }

    let c = request.central_index as i64;
    let sep = request.separation as i64;
    let w = width as i64;

    let mut gap_means = Vec::with_capacity(2 * request.num_side_peaks);
    for k in 1..=request.num_side_peaks as i64 {
        // Between side peaks k and k + 1, right of the center.
        let right = windows::clamped(c + k * sep + 2 * w, c + (k + 1) * sep - 2 * w, y.len());
        if let Some(m) = windows::mean(y, right) {
            gap_means.push(m);
        }
        // Mirror gap left of the center.
        let left = windows::clamped(c - (k + 1) * sep + 2 * w, c - k * sep - 2 * w, y.len());
        if let Some(m) = windows::mean(y, left) {
            gap_means.push(m);
        }
    }

    if gap_means.is_empty() {
        return Err(Error::BaselineUndefined(String::from(
            "all baseline windows fall outside the histogram",
        )));
    }
    Ok(gap_means.iter().sum::<f64>() / gap_means.len() as f64)
}
