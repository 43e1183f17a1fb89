//! Automatic discovery of the repeating peak comb in a correlation
//! histogram.

mod detect;

use crate::errors::Error;
use crate::Histogram;

/// Width measurements deliberately over-capture the peak down to its
/// skirts; the skirts are then rejected as noise by the window arithmetic,
/// not by the measurement itself.
const WIDTH_REL_HEIGHT: f64 = 0.99;
/// Candidates must be at least this wide at half prominence. Real
/// correlation peaks always are; single-bin noise spikes never are.
const MIN_CANDIDATE_WIDTH: f64 = 4.0;

/// Geometry of a histogram's periodic peak structure.
///
/// `peak_width` is the full measured width of a peak; integration windows
/// built from it span `[center - peak_width / 2, center + peak_width / 2)`
/// and baseline windows are inset by `2 * peak_width` from each
/// neighbouring peak. Baseline estimation therefore needs
/// `4 * peak_width <= separation`, otherwise the inter-peak gaps have no
/// usable interior.
///
/// `locate` output is a starting point: callers are expected to let users
/// override any of these fields before integrating.
#[derive(Debug, Clone)]
pub struct PeakGeometry {
    /// Bin indices of the detected peaks, strictly increasing.
    pub peak_indices: Vec<usize>,
    /// Histogram counts at each detected peak.
    pub peak_heights: Vec<f64>,
    /// Bin index of the zero-delay peak.
    pub central_index: usize,
    /// Full peak width, in bins.
    pub peak_width: usize,
    /// Modal spacing between consecutive side peaks, in bins.
    pub separation: usize,
}

/// Infers the peak comb geometry of a correlation histogram.
///
/// ## Algorithm
///
/// Candidate peaks need a prominence of at least half the histogram's
/// global maximum and a width of at least 4 bins; of those, only peaks at
/// least half as tall as the tallest candidate are kept (secondary noise
/// bumps can pass the prominence cut without being part of the comb). The
/// comb width is the rounded mean of the full widths measured at 99 %
/// relative height.
///
/// The spacing between consecutive kept peaks is regular except for
/// exactly one anomalous gap: the one spanning the zero-delay position,
/// where the central peak is suppressed (antibunched) or distorted and so
/// fails the height cut. That gap is identified as the one exceeding the
/// mean gap by more than one standard deviation. The separation is the
/// mean of the regular gaps, and the central index is reconstructed as the
/// last peak before the anomalous gap plus one separation, rather than
/// trusting any detected peak near the center.
///
/// ## Errors
///
/// * `NoPeaksFound` if fewer than two peaks survive the cuts.
/// * `AmbiguousCenter` if the gap distribution has no outlier, e.g. a
///   perfectly uniform comb. The caller should fall back to manual
///   geometry; guessing a center here would be wrong more often than not.
pub fn locate(histogram: &Histogram) -> Result<PeakGeometry, Error> {
    let y = histogram.counts();
    let global_max = y.iter().cloned().fold(0.0_f64, f64::max);

    let mut cand = detect::find_peaks(y, global_max / 2.0, MIN_CANDIDATE_WIDTH);
    if cand.peaks.len() < 2 {
        return Err(Error::NoPeaksFound);
    }

    let tallest = cand.peaks.iter().map(|&p| y[p]).fold(0.0_f64, f64::max);
    let heights: Vec<f64> = cand.peaks.iter().map(|&p| y[p]).collect();
    cand.retain(|i| heights[i] >= tallest / 2.0);
    if cand.peaks.len() < 2 {
        return Err(Error::NoPeaksFound);
    }

    let full_widths = detect::widths(y, &cand, WIDTH_REL_HEIGHT);
    let peak_width = (full_widths.iter().sum::<f64>() / full_widths.len() as f64).round() as usize;

    let gaps = peak_gaps(&cand.peaks);
    let outlier = central_gap(&gaps).ok_or(Error::AmbiguousCenter)?;

    let (mean, sd) = mean_std(&gaps);
    let regular: Vec<f64> = gaps.iter().copied().filter(|&g| g <= mean + sd).collect();
    let separation = (regular.iter().sum::<f64>() / regular.len() as f64).round() as usize;

    let central_index = cand.peaks[outlier] + separation;

    Ok(PeakGeometry {
        peak_heights: cand.peaks.iter().map(|&p| y[p]).collect(),
        peak_indices: cand.peaks,
        central_index,
        peak_width,
        separation,
    })
}

/// Spacings between consecutive peak indices.
pub(crate) fn peak_gaps(peaks: &[usize]) -> Vec<f64> {
    peaks.windows(2).map(|w| (w[1] - w[0]) as f64).collect()
}

/// Index of the first gap exceeding the mean gap by more than one standard
/// deviation, i.e. the gap spanning the zero-delay position. `None` when
/// the spacing is uniform and no gap stands out.
pub(crate) fn central_gap(gaps: &[f64]) -> Option<usize> {
    let (mean, sd) = mean_std(gaps);
    gaps.iter().position(|&g| g > mean + sd)
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
