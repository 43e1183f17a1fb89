pub mod errors;
pub mod estimators;
pub mod peak_locator;

use num_traits::ToPrimitive;

use crate::errors::Error;

/// A photon coincidence histogram.
///
/// One count per discrete time bin; the bin index is a proxy for the time
/// delay between detector clicks. Counts come out of the correlator as
/// integers but may have been rescaled upstream, so any numeric type is
/// accepted and stored as `f64`. The histogram is immutable once built and
/// every algorithm in this crate treats it as read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    counts: Vec<f64>,
}

impl Histogram {
    /// Builds a histogram from raw counts.
    ///
    /// Fails with `Error::InvalidHistogram` if the input is empty or if any
    /// count is negative or not finite. Downstream code relies on these
    /// checks and never revalidates.
    pub fn from_counts<T: ToPrimitive>(counts: &[T]) -> Result<Self, Error> {
        if counts.is_empty() {
            return Err(Error::InvalidHistogram(String::from("histogram is empty")));
        }
        let mut data = Vec::with_capacity(counts.len());
        for (bin, count) in counts.iter().enumerate() {
            let value = count.to_f64().ok_or_else(|| {
                Error::InvalidHistogram(format!("count in bin {} is not representable as f64", bin))
            })?;
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidHistogram(format!(
                    "count in bin {} is negative or not finite",
                    bin
                )));
            }
            data.push(value);
        }
        Ok(Self { counts: data })
    }

    #[inline]
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
