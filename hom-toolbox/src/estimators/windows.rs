//! Half-open integration windows, clamped to the histogram bounds the same
//! way slicing truncates at array edges in the original analysis scripts.

use std::ops::Range;

/// `[start, end)` clamped into `[0, len)`. Collapses to an empty range when
/// the window lies outside the histogram or `end <= start`.
pub(crate) fn clamped(start: i64, end: i64, len: usize) -> Range<usize> {
    let lo = start.max(0).min(len as i64) as usize;
    let hi = end.max(0).min(len as i64) as usize;
    lo..hi.max(lo)
}

/// Peak window `[center - width / 2, center + width / 2)`, with the
/// half-bin of an odd width going to the left edge.
pub(crate) fn centered(center: i64, width: i64, len: usize) -> Range<usize> {
    clamped(center - (width + 1) / 2, center + width / 2, len)
}

pub(crate) fn sum(y: &[f64], window: Range<usize>) -> f64 {
    y[window].iter().sum()
}

/// Mean over the window, or `None` when it clamped to nothing.
pub(crate) fn mean(y: &[f64], window: Range<usize>) -> Option<f64> {
    if window.is_empty() {
        None
    } else {
        let n = window.len() as f64;
        Some(sum(y, window) / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_clamp_at_the_histogram_edges() {
        assert_eq!(clamped(-5, 3, 10), 0..3);
        assert_eq!(clamped(8, 15, 10), 8..10);
        assert_eq!(clamped(-7, -2, 10), 0..0);
        assert_eq!(clamped(12, 20, 10), 10..10);
        assert_eq!(clamped(6, 4, 10), 6..6);
    }

    #[test]
    fn centered_window_is_half_open() {
        assert_eq!(centered(50, 4, 100), 48..52);
        // Odd width rounds the left edge down.
        assert_eq!(centered(50, 5, 100), 47..52);
        assert_eq!(centered(50, 0, 100), 50..50);
        assert_eq!(centered(50, 1, 100), 49..50);
    }

    #[test]
    fn mean_of_empty_window_is_none() {
        let y = vec![2.0; 10];
        assert_eq!(mean(&y, 3..3), None);
        assert_eq!(mean(&y, 2..6), Some(2.0));
    }
}
