//! Baseline estimation, windowed peak integration and the derived
//! photon-statistics estimators.

pub mod baseline;
pub mod g2;
pub mod hom;
pub(crate) mod windows;

use crate::errors::Error;
use crate::peak_locator::PeakGeometry;

/// Integration parameters for the estimators.
///
/// ## Parameters
///    - central_index: Bin index of the zero-delay peak
///    - peak_width: Full peak width in bins; integration windows span
///      `[center - peak_width / 2, center + peak_width / 2)`
///    - separation: Spacing between side peaks in bins
///    - num_side_peaks: Number of side peaks used on each side of the
///      center for normalisation and baseline estimation
///    - subtract_baseline: Estimate and subtract the inter-peak baseline
///    - skip_first_side_peak: Exclude the side peaks nearest the center
///      from the reference set (their area is reduced in HOM setups where
///      the interferometer delay partially overlaps them)
///
/// Typically seeded from [`PeakGeometry`] via `from_geometry` and then
/// adjusted by the user; every field may be overridden freely.
#[derive(Debug, Copy, Clone)]
pub struct IntegrationRequest {
    pub central_index: usize,
    pub peak_width: usize,
    pub separation: usize,
    pub num_side_peaks: usize,
    pub subtract_baseline: bool,
    pub skip_first_side_peak: bool,
}

impl IntegrationRequest {
    pub fn from_geometry(geometry: &PeakGeometry, num_side_peaks: usize) -> Self {
        Self {
            central_index: geometry.central_index,
            peak_width: geometry.peak_width,
            separation: geometry.separation,
            num_side_peaks,
            subtract_baseline: true,
            skip_first_side_peak: false,
        }
    }
}

/// Result from the g2 and single-histogram HOM estimators.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CorrelationResult {
    /// g2(0) or HOM visibility.
    pub statistic: f64,
    /// Propagated 1-sigma shot-noise uncertainty.
    pub uncertainty: f64,
}

/// Relative shot-noise uncertainty of an integrated count, `sqrt(x) / x`.
///
/// Non-positive integrals (empty windows, over-subtracted baselines) carry
/// no usable error information and map to 0 so that degenerate-but-defined
/// cases stay free of NaN.
pub(crate) fn relative_error(integral: f64) -> f64 {
    if integral > 0.0 {
        integral.sqrt() / integral
    } else {
        0.0
    }
}

/// Side peaks are indexed `k = 1..=num_side_peaks`, or from `k = 2` when
/// the first one is skipped; the same convention is used for side-peak
/// integration everywhere. Fails when the resulting set is empty.
pub(crate) fn side_peak_range(request: &IntegrationRequest) -> Result<std::ops::RangeInclusive<i64>, Error> {
    let start: i64 = if request.skip_first_side_peak { 2 } else { 1 };
    let end = request.num_side_peaks as i64;
    if end < start {
        return Err(Error::DegenerateGeometry(format!(
            "no side peaks to normalise against (num_side_peaks = {})",
            request.num_side_peaks
        )));
    }
    Ok(start..=end)
}

/// Background-subtracted integral of the peak window centered on `center`.
///
/// The per-bin baseline level is scaled by the window width so that it is
/// subtracted in the same units as the raw sum.
pub(crate) fn integrate_peak(y: &[f64], center: i64, request: &IntegrationRequest, bg: f64) -> f64 {
    let window = windows::centered(center, request.peak_width as i64, y.len());
    windows::sum(y, window) - bg * request.peak_width as f64
}

/// Mean background-subtracted side-peak area over both sides of the
/// center, the normalisation reference for g2 and HOM.
///
/// A zero or negative reference makes the statistic undefined and is
/// reported as `DegenerateGeometry` instead of propagating NaN.
pub(crate) fn side_peak_reference(
    y: &[f64],
    request: &IntegrationRequest,
    bg: f64,
) -> Result<f64, Error> {
    let range = side_peak_range(request)?;
    let center = request.central_index as i64;
    let separation = request.separation as i64;

    let mut total = 0.0;
    let mut count = 0usize;
    for k in range {
        total += integrate_peak(y, center - k * separation, request, bg);
        total += integrate_peak(y, center + k * separation, request, bg);
        count += 2;
    }

    let reference = total / count as f64;
    if reference <= 0.0 {
        return Err(Error::DegenerateGeometry(format!(
            "side-peak reference is not positive ({:.3})",
            reference
        )));
    }
    Ok(reference)
}
