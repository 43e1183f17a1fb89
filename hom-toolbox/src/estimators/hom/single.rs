use crate::errors::Error;
use crate::estimators::{
    baseline, integrate_peak, relative_error, side_peak_reference, CorrelationResult,
    IntegrationRequest,
};
use crate::Histogram;

/// Computes the HOM interference visibility from a single coincidence
/// histogram.
///
/// Integration and baseline handling are identical to [`crate::estimators::g2::g2`];
/// only the derived statistic differs. At the output of a balanced
/// interferometer the central peak of a distinguishable-photon source
/// holds half a side-peak area, so the visibility is
///
/// ```text
/// V = 1 - 2 * cent / peak
/// ```
///
/// and `V = 0` for fully distinguishable photons, `V = 1` for perfect
/// two-photon interference.
///
/// The propagated uncertainty keeps `(1 - V)` as the scale factor of the
/// underlying ratio:
///
/// ```text
/// err_V = (1 - V) * sqrt((err_cent / cent)^2 + (err_peak / peak)^2)
/// ```
///
/// This is the convention used for previously published results and is
/// reproduced as-is rather than re-derived. As for g2, a window whose
/// subtracted integral comes out zero or negative contributes no error
/// term and the quoted uncertainty is a lower bound.
///
/// In the common experimental configuration the side peak nearest the
/// center has a reduced area because of the interferometer delay; set
/// `skip_first_side_peak` on the request to leave it out of the reference.
pub fn hom_single(
    histogram: &Histogram,
    request: &IntegrationRequest,
) -> Result<CorrelationResult, Error> {
    crate::estimators::side_peak_range(request)?;
    let y = histogram.counts();

    let bg = if request.subtract_baseline {
        baseline::estimate(y, request)?
    } else {
        0.0
    };

    let cent = integrate_peak(y, request.central_index as i64, request, bg);
    let peak = side_peak_reference(y, request, bg)?;

    let statistic = 1.0 - 2.0 * cent / peak;
    let uncertainty = (1.0 - statistic)
        * (relative_error(cent).powi(2) + relative_error(peak).powi(2)).sqrt();

    Ok(CorrelationResult {
        statistic,
        uncertainty,
    })
}
