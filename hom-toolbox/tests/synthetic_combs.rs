//! End-to-end checks of the locate -> integrate pipeline on synthetic
//! pulsed-correlation combs with known geometry.

use approx::assert_relative_eq;

use hom_toolbox::errors::Error;
use hom_toolbox::estimators::hom::{hom_dual, hom_single, DualHomParams};
use hom_toolbox::estimators::{g2::g2, IntegrationRequest};
use hom_toolbox::peak_locator;
use hom_toolbox::Histogram;

const LEN: usize = 4096;
const CENTER: i64 = 1024;
const SEP: i64 = 120;
const SIGMA: f64 = 4.0;
const HEIGHT: f64 = 1000.0;
const PEDESTAL: f64 = 50.0;

/// Gaussian comb on a flat pedestal. Peaks sit at `CENTER + k * SEP` for
/// the given `k` values, each with area `HEIGHT * scale(k) * sigma *
/// sqrt(2 pi)`.
fn gaussian_comb<F: Fn(i64) -> f64>(ks: &[i64], scale: F) -> Histogram {
    let mut y = vec![PEDESTAL; LEN];
    for &k in ks {
        let c = (CENTER + k * SEP) as f64;
        let h = HEIGHT * scale(k);
        for (bin, v) in y.iter_mut().enumerate() {
            let d = bin as f64 - c;
            *v += h * (-d * d / (2.0 * SIGMA * SIGMA)).exp();
        }
    }
    Histogram::from_counts(&y).unwrap()
}

fn side_ks() -> Vec<i64> {
    (1..=6).flat_map(|k| [k, -k]).collect()
}

#[test]
fn locate_recovers_known_geometry() {
    // Antibunched source: no central peak, so the comb has one double gap.
    let hist = gaussian_comb(&side_ks(), |_| 1.0);
    let geom = peak_locator::locate(&hist).unwrap();

    assert!(
        (geom.separation as i64 - SEP).abs() <= 1,
        "separation {} vs {}",
        geom.separation,
        SEP
    );
    assert!(
        (geom.central_index as i64 - CENTER).abs() <= 2,
        "central index {} vs {}",
        geom.central_index,
        CENTER
    );
    // Full width at 99 % relative height of a Gaussian is about
    // 2 * sigma * sqrt(2 ln 100) = 6.07 sigma.
    let expected = 6.07 * SIGMA;
    assert!(
        (geom.peak_width as f64 - expected).abs() <= 3.0,
        "peak width {} vs {:.1}",
        geom.peak_width,
        expected
    );
    assert_eq!(geom.peak_indices.len(), 12);
}

#[test]
fn uniformly_spaced_comb_is_reported_ambiguous() {
    let ks: Vec<i64> = (-6..=6).collect();
    let hist = gaussian_comb(&ks, |_| 1.0);
    assert!(matches!(
        peak_locator::locate(&hist),
        Err(Error::AmbiguousCenter)
    ));
}

#[test]
fn located_geometry_feeds_straight_into_g2() {
    let mut ks = side_ks();
    ks.push(0);
    // Weak central peak: a tenth of the side-peak area.
    let hist = gaussian_comb(&ks, |k| if k == 0 { 0.1 } else { 1.0 });
    // The central peak fails the candidate cuts, so geometry inference
    // still sees the double gap.
    let geom = peak_locator::locate(&gaussian_comb(&side_ks(), |_| 1.0)).unwrap();

    let request = IntegrationRequest::from_geometry(&geom, 5);
    let res = g2(&hist, &request).unwrap();
    assert_relative_eq!(res.statistic, 0.1, epsilon = 0.01);
    assert!(res.uncertainty > 0.0);
}

#[test]
fn equal_area_comb_scores_exactly_one() {
    let mut ks = side_ks();
    ks.push(0);
    let hist = gaussian_comb(&ks, |_| 1.0);
    let request = IntegrationRequest {
        central_index: CENTER as usize,
        peak_width: 24,
        separation: SEP as usize,
        num_side_peaks: 5,
        subtract_baseline: true,
        skip_first_side_peak: false,
    };
    let res = g2(&hist, &request).unwrap();
    // Every window sees an identical peak shape and the pedestal cancels.
    assert_relative_eq!(res.statistic, 1.0, epsilon = 1e-9);
}

#[test]
fn hom_dip_at_half_reference_is_zero_visibility() {
    let mut ks = side_ks();
    ks.push(0);
    let hist = gaussian_comb(&ks, |k| if k == 0 { 0.5 } else { 1.0 });
    let request = IntegrationRequest {
        central_index: CENTER as usize,
        peak_width: 24,
        separation: SEP as usize,
        num_side_peaks: 5,
        subtract_baseline: true,
        skip_first_side_peak: false,
    };
    let res = hom_single(&hist, &request).unwrap();
    assert_relative_eq!(res.statistic, 0.0, epsilon = 1e-9);
}

#[test]
fn estimators_are_pure_functions() {
    let hist = gaussian_comb(&side_ks(), |_| 1.0);
    let request = IntegrationRequest {
        central_index: CENTER as usize,
        peak_width: 24,
        separation: SEP as usize,
        num_side_peaks: 4,
        subtract_baseline: true,
        skip_first_side_peak: true,
    };
    let a = g2(&hist, &request).unwrap();
    let b = g2(&hist, &request).unwrap();
    assert_eq!(a, b);
}

#[test]
fn dual_hom_on_identical_channels_is_blind() {
    let mut ks = side_ks();
    ks.push(0);
    let hist = gaussian_comb(&ks, |k| if k == 0 { 0.2 } else { 1.0 });
    let params = DualHomParams {
        num_side_peaks: 4,
        subtract_baseline: true,
        geometry: None,
    };
    let res = hom_dual(&hist, &hist, &params).unwrap();
    assert_relative_eq!(res.visibility, 0.0, epsilon = 1e-12);
    assert_eq!(res.ortho, res.para);
}
