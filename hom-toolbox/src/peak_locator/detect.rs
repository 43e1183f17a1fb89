//! Candidate peak detection primitives.
//!
//! Local-maxima search, topographic prominence and relative-height width
//! measurement over a raw histogram. These are the building blocks for
//! `peak_locator::locate`; thresholds and tie-break rules live there, not
//! here.

/// Candidate peaks together with the prominence data needed to measure
/// widths at a relative height later on.
pub(super) struct Candidates {
    pub peaks: Vec<usize>,
    pub prominences: Vec<f64>,
    pub left_bases: Vec<usize>,
    pub right_bases: Vec<usize>,
}

impl Candidates {
    /// Drops every candidate for which `keep` returns false, keeping the
    /// four columns in sync.
    pub fn retain<F: FnMut(usize) -> bool>(&mut self, mut keep: F) {
        let mut idx = 0;
        let (peaks, proms) = (&mut self.peaks, &mut self.prominences);
        let (lbs, rbs) = (&mut self.left_bases, &mut self.right_bases);
        let mut kept = 0;
        while idx < peaks.len() {
            if keep(idx) {
                peaks[kept] = peaks[idx];
                proms[kept] = proms[idx];
                lbs[kept] = lbs[idx];
                rbs[kept] = rbs[idx];
                kept += 1;
            }
            idx += 1;
        }
        peaks.truncate(kept);
        proms.truncate(kept);
        lbs.truncate(kept);
        rbs.truncate(kept);
    }
}

/// Indices of all local maxima, with flat tops resolved to their midpoint.
///
/// A sample (or plateau of equal samples) is a maximum when the sample
/// directly before it is strictly lower and the sample directly after it is
/// strictly lower. The first and last bins can never be maxima.
pub(super) fn local_maxima(y: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if y.len() < 3 {
        return peaks;
    }
    let last = y.len() - 1;
    let mut i = 1;
    while i < last {
        if y[i - 1] < y[i] {
            // Scan past a possible flat top.
            let mut ahead = i + 1;
            while ahead < last && y[ahead] == y[i] {
                ahead += 1;
            }
            if y[ahead] < y[i] {
                let right_edge = ahead - 1;
                peaks.push((i + right_edge) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Topographic prominence of each peak, plus the positions of the left and
/// right bases the prominence was measured against.
///
/// For each peak the signal is walked outwards until a strictly higher
/// sample or the histogram border is hit; the lowest point seen on each
/// side is that side's base. The prominence is the peak height above the
/// higher of the two bases.
pub(super) fn prominences(y: &[f64], peaks: &[usize]) -> (Vec<f64>, Vec<usize>, Vec<usize>) {
    let mut proms = Vec::with_capacity(peaks.len());
    let mut left_bases = Vec::with_capacity(peaks.len());
    let mut right_bases = Vec::with_capacity(peaks.len());

    for &peak in peaks {
        let height = y[peak];

        let mut left_min = height;
        let mut left_base = peak;
        let mut i = peak as isize;
        while i >= 0 && y[i as usize] <= height {
            if y[i as usize] < left_min {
                left_min = y[i as usize];
                left_base = i as usize;
            }
            i -= 1;
        }

        let mut right_min = height;
        let mut right_base = peak;
        let mut j = peak;
        while j < y.len() && y[j] <= height {
            if y[j] < right_min {
                right_min = y[j];
                right_base = j;
            }
            j += 1;
        }

        proms.push(height - left_min.max(right_min));
        left_bases.push(left_base);
        right_bases.push(right_base);
    }
    (proms, left_bases, right_bases)
}

/// Width of each peak measured at `rel_height` of its prominence.
///
/// The evaluation height for a peak is
/// `y[peak] - rel_height * prominence`; the width is the distance between
/// the interpolated crossings of that height on either side, searched no
/// further than the peak's bases. `rel_height` close to 1 measures near
/// the base of the peak, 0.5 gives the classic full width at half
/// prominence.
pub(super) fn widths(y: &[f64], cand: &Candidates, rel_height: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(cand.peaks.len());
    for (idx, &peak) in cand.peaks.iter().enumerate() {
        let height = y[peak] - cand.prominences[idx] * rel_height;

        let mut i = peak;
        while i > cand.left_bases[idx] && y[i] > height {
            i -= 1;
        }
        let mut left_ip = i as f64;
        if y[i] < height {
            left_ip += (height - y[i]) / (y[i + 1] - y[i]);
        }

        let mut j = peak;
        while j < cand.right_bases[idx] && y[j] > height {
            j += 1;
        }
        let mut right_ip = j as f64;
        if y[j] < height {
            right_ip -= (height - y[j]) / (y[j - 1] - y[j]);
        }

        out.push(right_ip - left_ip);
    }
    out
}

/// Local maxima filtered by minimum prominence and minimum width.
///
/// The width condition is evaluated at half prominence, which is wide
/// enough to reject single-bin noise spikes without touching genuine
/// correlation peaks.
pub(super) fn find_peaks(y: &[f64], min_prominence: f64, min_width: f64) -> Candidates {
    let peaks = local_maxima(y);
    let (proms, left_bases, right_bases) = prominences(y, &peaks);
    let mut cand = Candidates {
        peaks,
        prominences: proms,
        left_bases,
        right_bases,
    };

    let keep_prom: Vec<bool> = cand.prominences.iter().map(|&p| p >= min_prominence).collect();
    cand.retain(|i| keep_prom[i]);

    let half_widths = widths(y, &cand, 0.5);
    cand.retain(|i| half_widths[i] >= min_width);

    cand
}
