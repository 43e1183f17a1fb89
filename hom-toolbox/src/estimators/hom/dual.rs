use ndarray::Array1;
use tracing::warn;

use crate::errors::Error;
use crate::estimators::{baseline, side_peak_reference, windows, IntegrationRequest};
use crate::peak_locator::{self, PeakGeometry};
use crate::Histogram;

/// Parameters for the two-channel HOM visibility estimator.
///
/// ## Parameters
///    - num_side_peaks: Number of side peaks per side used for the
///      reference areas, the baseline and the plateau anchor
///    - subtract_baseline: Estimate and subtract each channel's inter-peak
///      baseline from the whole curve before normalising
///    - geometry: Manual comb geometry; when `None` the geometry is
///      inferred from the orthogonal channel
#[derive(Debug, Copy, Clone)]
pub struct DualHomParams {
    pub num_side_peaks: usize,
    pub subtract_baseline: bool,
    pub geometry: Option<ManualGeometry>,
}

/// User-supplied comb geometry overriding automatic inference.
#[derive(Debug, Copy, Clone)]
pub struct ManualGeometry {
    pub central_index: usize,
    pub separation: usize,
    pub peak_width: usize,
}

/// Result from the two-channel HOM visibility estimator.
///
/// The normalised curves have their side-peak plateau at 1 and are ready
/// for plotting; `ortho_scale` and `para_scale` are the total factors each
/// baseline-subtracted curve was divided by.
#[derive(Debug, Clone)]
pub struct DualHomResult {
    pub visibility: f64,
    pub uncertainty: f64,
    pub ortho: Array1<f64>,
    pub para: Array1<f64>,
    pub ortho_scale: f64,
    pub para_scale: f64,
}

/// Computes the HOM visibility from a pair of coincidence histograms
/// recorded with orthogonal and parallel polarisation.
///
/// ## Algorithm description
///
/// Both channels are brought onto a common footing before the central
/// windows are compared:
///
/// 1. The comb geometry is inferred from each channel with
///    [`peak_locator::locate`]. A disagreement between the channels is
///    logged and the orthogonal geometry wins; a [`ManualGeometry`]
///    override takes precedence over both.
/// 2. Each channel's baseline is estimated on its own raw histogram and
///    subtracted from the whole curve (when `subtract_baseline` is set).
/// 3. Each curve is divided by its own mean side-peak area, then rescaled
///    once more so the side-peak plateau sits at exactly 1. The plateau
///    level is measured on the detected peaks flanking the comb's central
///    gap, leaving out the immediate neighbours of the gap on either side.
/// 4. The visibility compares the central windows of the two normalised
///    curves, with the orthogonal dip standing in for the
///    distinguishable-photon reference:
///
///    ```text
///    V = (cent_ortho - cent_para) / cent_ortho
///    ```
///
///    This expression and its error propagation
///    `err_V = (1 - V) * sqrt((err_ortho / cent_ortho)^2 + (err_para / cent_para)^2)`
///    are the documented experimental convention and are reproduced
///    exactly; the central-window shot noise is taken on the
///    baseline-subtracted counts before plateau rescaling.
pub fn hom_dual(
    ortho: &Histogram,
    para: &Histogram,
    params: &DualHomParams,
) -> Result<DualHomResult, Error> {
    let geom_ortho = peak_locator::locate(ortho)?;
    let geom_para = peak_locator::locate(para)?;
    if !geometry_matches(&geom_ortho, &geom_para) {
        warn!(
            ortho_center = geom_ortho.central_index,
            para_center = geom_para.central_index,
            ortho_separation = geom_ortho.separation,
            para_separation = geom_para.separation,
            "ortho and para histograms disagree on the comb geometry; using ortho"
        );
    }

    let (central_index, separation, peak_width) = match params.geometry {
        Some(m) => (m.central_index, m.separation, m.peak_width),
        None => (
            geom_ortho.central_index,
            geom_ortho.separation,
            geom_ortho.peak_width,
        ),
    };
    let request = IntegrationRequest {
        central_index,
        peak_width,
        separation,
        num_side_peaks: params.num_side_peaks,
        subtract_baseline: params.subtract_baseline,
        skip_first_side_peak: false,
    };
    crate::estimators::side_peak_range(&request)?;

    let channel_ortho = NormalizedChannel::build(ortho, &geom_ortho, &request)?;
    let channel_para = NormalizedChannel::build(para, &geom_para, &request)?;

    let (center, width) = (central_index as i64, peak_width as i64);

    let cent_ortho = channel_ortho.central_sum(center, width);
    let cent_para = channel_para.central_sum(center, width);
    if cent_ortho <= 0.0 {
        return Err(Error::DegenerateGeometry(format!(
            "orthogonal central window integrates to {:.3}; visibility is undefined",
            cent_ortho
        )));
    }

    let err_ortho = channel_ortho.central_shot_noise(center, width);
    let err_para = channel_para.central_shot_noise(center, width);

    let visibility = (cent_ortho - cent_para) / cent_ortho;
    let uncertainty = (1.0 - visibility)
        * (safe_ratio(err_ortho, cent_ortho).powi(2) + safe_ratio(err_para, cent_para).powi(2))
            .sqrt();

    Ok(DualHomResult {
        visibility,
        uncertainty,
        ortho: Array1::from(channel_ortho.curve),
        para: Array1::from(channel_para.curve),
        ortho_scale: channel_ortho.scale,
        para_scale: channel_para.scale,
    })
}

/// One channel after baseline subtraction and joint normalisation.
struct NormalizedChannel {
    /// Normalised curve, side-peak plateau at 1.
    curve: Vec<f64>,
    /// Total factor the baseline-subtracted curve was divided by.
    scale: f64,
    /// Side-peak reference of the baseline-subtracted curve, used to
    /// convert raw shot noise into normalised units.
    reference: f64,
    /// Baseline-subtracted curve before any rescaling, for shot-noise
    /// estimates.
    subtracted: Vec<f64>,
}

impl NormalizedChannel {
    fn build(
        histogram: &Histogram,
        geometry: &PeakGeometry,
        request: &IntegrationRequest,
    ) -> Result<Self, Error> {
        let bg = if request.subtract_baseline {
            baseline::estimate(histogram.counts(), request)?
        } else {
            0.0
        };
        let subtracted: Vec<f64> = histogram.counts().iter().map(|v| v - bg).collect();

        let reference = side_peak_reference(&subtracted, request, 0.0)?;
        let normalized: Vec<f64> = subtracted.iter().map(|v| v / reference).collect();

        let plateau = plateau_level(
            &normalized,
            &geometry.peak_indices,
            request.num_side_peaks,
        )?;
        let curve = normalized.iter().map(|v| v / plateau).collect();

        Ok(Self {
            curve,
            scale: reference * plateau,
            reference,
            subtracted,
        })
    }

    fn central_sum(&self, center: i64, width: i64) -> f64 {
        let window = windows::centered(center, width, self.curve.len());
        windows::sum(&self.curve, window)
    }

    /// `sqrt(N)` of the baseline-subtracted counts in the central window,
    /// expressed in side-peak-reference units.
    fn central_shot_noise(&self, center: i64, width: i64) -> f64 {
        let window = windows::centered(center, width, self.subtracted.len());
        let raw = windows::sum(&self.subtracted, window);
        if raw > 0.0 {
            raw.sqrt() / self.reference
        } else {
            0.0
        }
    }
}

/// Mean height of the detected peaks flanking the comb's central gap,
/// excluding the gap's immediate neighbours, on a normalised curve.
fn plateau_level(
    normalized: &[f64],
    peak_indices: &[usize],
    num_side_peaks: usize,
) -> Result<f64, Error> {
    let gaps = peak_locator::peak_gaps(peak_indices);
    let gap_idx = peak_locator::central_gap(&gaps).ok_or(Error::AmbiguousCenter)? as i64;
    let heights: Vec<f64> = peak_indices.iter().map(|&p| normalized[p]).collect();
    let n = num_side_peaks as i64;

    let left = windows::clamped(gap_idx - n, gap_idx - 2, heights.len());
    let right = windows::clamped(gap_idx + 2, gap_idx + n, heights.len());
    let count = left.len() + right.len();
    if count == 0 {
        return Err(Error::DegenerateGeometry(String::from(
            "too few detected peaks to anchor the plateau normalisation",
        )));
    }

    let level = (windows::sum(&heights, left) + windows::sum(&heights, right)) / count as f64;
    if level <= 0.0 {
        return Err(Error::DegenerateGeometry(format!(
            "plateau anchor level is not positive ({:.3})",
            level
        )));
    }
    Ok(level)
}

fn geometry_matches(a: &PeakGeometry, b: &PeakGeometry) -> bool {
    a.central_index == b.central_index
        && a.separation == b.separation
        && a.peak_width == b.peak_width
}

fn safe_ratio(err: f64, value: f64) -> f64 {
    if value != 0.0 {
        err / value
    } else {
        0.0
    }
}
