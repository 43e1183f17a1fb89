use crate::errors::Error;
use crate::estimators::{
    baseline, integrate_peak, relative_error, side_peak_reference, CorrelationResult,
    IntegrationRequest,
};
use crate::Histogram;

/// Computes the second order coherence at zero delay, g2(0), from a pulsed
/// correlation histogram.
///
/// ## Algorithm description
///
/// The area of the zero-delay peak is integrated over
/// `[central_index - peak_width / 2, central_index + peak_width / 2)` and
/// normalised by the mean area of the side peaks at
/// `central_index ± k * separation`, integrated over windows of the same
/// width. For a Poissonian source every peak has the same area and the
/// ratio is 1; antibunching shows up as a ratio below 1.
///
/// With `subtract_baseline` enabled the inter-peak baseline (see
/// [`baseline::estimate`]) is scaled by the window width and removed from
/// every integral first.
///
/// ## Uncertainty
///
/// Counting is assumed Poissonian, so an integrated area `A` carries a
/// 1-sigma uncertainty of `sqrt(A)`. The relative uncertainties of the
/// central and reference areas are combined in quadrature:
///
/// ```text
/// err_g2 = g2 * sqrt((err_cent / cent)^2 + (err_peak / peak)^2)
/// ```
///
/// Both integrals enter at their background-subtracted value, matching the
/// convention used for previously published results. A window whose
/// subtracted integral comes out zero or negative (the baseline exceeded
/// its counts) contributes no error term, so in that regime the quoted
/// uncertainty is a lower bound.
pub fn g2(histogram: &Histogram, request: &IntegrationRequest) -> Result<CorrelationResult, Error> {
    // An empty side-peak set must surface as a geometry problem, not as a
    // baseline one.
    crate::estimators::side_peak_range(request)?;
    let y = histogram.counts();

    let bg = if request.subtract_baseline {
        baseline::estimate(y, request)?
    } else {
        0.0
    };

    let cent = integrate_peak(y, request.central_index as i64, request, bg);
    let peak = side_peak_reference(y, request, bg)?;

    let statistic = cent / peak;
    let uncertainty =
        statistic * (relative_error(cent).powi(2) + relative_error(peak).powi(2)).sqrt();

    Ok(CorrelationResult {
        statistic,
        uncertainty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Comb of rectangular peaks so areas are exact: height `h` over
    /// `2 * half` bins at each center, on top of a flat pedestal.
    fn box_comb(len: usize, centers: &[(usize, f64)], half: usize, pedestal: f64) -> Histogram {
        let mut y = vec![pedestal; len];
        for &(c, h) in centers {
            for bin in c - half..c + half {
                y[bin] = pedestal + h;
            }
        }
        Histogram::from_counts(&y).unwrap()
    }

    fn request() -> IntegrationRequest {
        IntegrationRequest {
            central_index: 500,
            peak_width: 10,
            separation: 100,
            num_side_peaks: 4,
            subtract_baseline: false,
            skip_first_side_peak: false,
        }
    }

    fn centers(central_height: f64, side_height: f64) -> Vec<(usize, f64)> {
        let mut cs = vec![(500, central_height)];
        for k in 1..=4usize {
            cs.push((500 - k * 100, side_height));
            cs.push((500 + k * 100, side_height));
        }
        cs
    }

    #[test]
    fn identical_peaks_give_exactly_one() {
        let hist = box_comb(1000, &centers(20.0, 20.0), 5, 0.0);
        let res = g2(&hist, &request()).unwrap();
        assert_eq!(res.statistic, 1.0);
        // Every area is A = 200, so err = sqrt(2) * sqrt(A) / A.
        let a = 200.0_f64;
        assert_relative_eq!(res.uncertainty, (2.0 / a).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn antibunched_source_scores_below_one() {
        let hist = box_comb(1000, &centers(2.0, 20.0), 5, 0.0);
        let res = g2(&hist, &request()).unwrap();
        assert_relative_eq!(res.statistic, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn pedestal_is_removed_when_baseline_is_enabled() {
        let mut req = request();
        req.subtract_baseline = true;
        let hist = box_comb(1000, &centers(10.0, 20.0), 5, 3.0);
        let res = g2(&hist, &req).unwrap();
        assert_relative_eq!(res.statistic, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn over_subtracted_center_contributes_no_error_term() {
        let mut req = request();
        req.subtract_baseline = true;
        // Central bins sit below the pedestal, so the subtracted central
        // integral is negative; only the reference term remains in the
        // uncertainty.
        let hist = box_comb(1000, &centers(-2.0, 20.0), 5, 3.0);
        let res = g2(&hist, &req).unwrap();
        assert_relative_eq!(res.statistic, -0.1, epsilon = 1e-12);
        let expected = res.statistic * (200.0_f64.sqrt() / 200.0);
        assert_relative_eq!(res.uncertainty, expected, epsilon = 1e-12);
    }

    #[test]
    fn reruns_are_bit_identical() {
        let hist = box_comb(1000, &centers(7.0, 20.0), 5, 1.0);
        let mut req = request();
        req.subtract_baseline = true;
        let a = g2(&hist, &req).unwrap();
        let b = g2(&hist, &req).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_width_is_defined_and_zero() {
        let mut req = request();
        req.peak_width = 0;
        let hist = box_comb(1000, &centers(20.0, 20.0), 5, 0.0);
        // The central window is empty but the side windows are too; the
        // reference is then non-positive.
        assert!(matches!(g2(&hist, &req), Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn no_side_peaks_is_degenerate() {
        let mut req = request();
        req.num_side_peaks = 0;
        // Even with baseline subtraction enabled the empty reference set
        // must win over the (equally impossible) baseline windows.
        req.subtract_baseline = true;
        let hist = box_comb(1000, &centers(20.0, 20.0), 5, 0.0);
        assert!(matches!(g2(&hist, &req), Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn skipping_the_first_side_peak_drops_it_from_the_reference() {
        // First side peaks deliberately hot; skipping them restores the
        // expected normalisation.
        let mut cs = centers(10.0, 20.0);
        cs[1] = (400, 40.0);
        cs[2] = (600, 40.0);
        let hist = box_comb(1000, &cs, 5, 0.0);

        let mut req = request();
        let with_first = g2(&hist, &req).unwrap();
        req.skip_first_side_peak = true;
        let without_first = g2(&hist, &req).unwrap();

        assert_relative_eq!(without_first.statistic, 0.5, epsilon = 1e-12);
        assert!(with_first.statistic < without_first.statistic);
    }
}
