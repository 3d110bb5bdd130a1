//! Fixed-binning weighted histograms

use serde::{Deserialize, Serialize};

/// Regular binning of an axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    /// Number of in-range bins
    pub bins: usize,

    /// Lower edge of the first bin
    pub low: f64,

    /// Upper edge of the last bin
    pub high: f64,
}
//
impl Binning {
    /// Define a binning of `bins` equal-width bins over [low, high)
    pub const fn new(bins: usize, low: f64, high: f64) -> Self {
        Self { bins, low, high }
    }

    /// Check that this binning makes sense
    pub fn is_valid(&self) -> bool {
        self.bins > 0 && self.low.is_finite() && self.high.is_finite() && self.low < self.high
    }

    /// Width of every bin
    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.bins as f64
    }

    /// Index of the slot which `x` falls into
    ///
    /// Slot 0 is the underflow, slots 1..=bins are the regular bins and slot
    /// bins+1 is the overflow. The upper edge belongs to the overflow, and so
    /// do NaNs, so that no value ever gets lost.
    ///
    pub fn find_bin(&self, x: f64) -> usize {
        if x < self.low {
            0
        } else if x < self.high {
            let bin = (self.bins as f64 * (x - self.low) / (self.high - self.low)) as usize;
            // Rounding can push values right below the upper edge out of range
            1 + bin.min(self.bins - 1)
        } else {
            self.bins + 1
        }
    }

    /// Index of the in-range bin that `x` falls into, clamped to the axis
    ///
    /// Values below the axis map to the first bin, values at or above its
    /// upper edge map to the last one.
    ///
    pub fn find_clamped_bin(&self, x: f64) -> usize {
        self.find_bin(x).clamp(1, self.bins) - 1
    }
}

/// Histogram of weighted values, with underflow and overflow slots
///
/// Every slot tracks its number of entries, its sum of weights and its sum of
/// squared weights, so that statistical uncertainties can be propagated.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// Axis of the histogram
    binning: Binning,

    /// Number of fills per slot
    entries: Vec<u64>,

    /// Sum of weights per slot
    sumw: Vec<f64>,

    /// Sum of squared weights per slot
    sumw2: Vec<f64>,
}
//
impl Histogram {
    /// Create an empty histogram
    pub fn new(binning: Binning) -> Self {
        assert!(binning.is_valid(), "Invalid histogram binning {binning:?}");
        let slots = binning.bins + 2;
        Self {
            binning,
            entries: vec![0; slots],
            sumw: vec![0.; slots],
            sumw2: vec![0.; slots],
        }
    }

    /// Axis of the histogram
    pub fn binning(&self) -> Binning {
        self.binning
    }

    /// Record one value with a certain weight
    pub fn fill(&mut self, x: f64, weight: f64) {
        let slot = self.binning.find_bin(x);
        self.entries[slot] += 1;
        self.sumw[slot] += weight;
        self.sumw2[slot] += weight * weight;
    }

    /// Add the contents of another histogram with the same axis
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(
            self.binning, other.binning,
            "Can only merge histograms with identical binning"
        );
        for (dst, src) in self.entries.iter_mut().zip(&other.entries) {
            *dst += src;
        }
        for (dst, src) in self.sumw.iter_mut().zip(&other.sumw) {
            *dst += src;
        }
        for (dst, src) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *dst += src;
        }
    }

    /// Number of entries in a slot (0 = underflow, bins+1 = overflow)
    pub fn entries(&self, slot: usize) -> u64 {
        self.entries[slot]
    }

    /// Sum of weights in a slot (0 = underflow, bins+1 = overflow)
    pub fn sum_weights(&self, slot: usize) -> f64 {
        self.sumw[slot]
    }

    /// Sum of squared weights in a slot (0 = underflow, bins+1 = overflow)
    pub fn sum_weights2(&self, slot: usize) -> f64 {
        self.sumw2[slot]
    }

    /// Sum of weights below the axis
    pub fn underflow(&self) -> f64 {
        self.sumw[0]
    }

    /// Sum of weights at or above the upper edge of the axis
    pub fn overflow(&self) -> f64 {
        self.sumw[self.binning.bins + 1]
    }

    /// Total number of fills, including underflow and overflow
    pub fn total_entries(&self) -> u64 {
        self.entries.iter().sum()
    }

    /// Total sum of weights, including underflow and overflow
    pub fn total_weight(&self) -> f64 {
        self.sumw.iter().sum()
    }

    /// Sum of weights of the in-range bins
    pub fn integral(&self) -> f64 {
        self.sumw[1..=self.binning.bins].iter().sum()
    }

    /// Statistical uncertainty on the sum of weights of a slot
    pub fn error(&self, slot: usize) -> f64 {
        self.sumw2[slot].sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_bin_edges() {
        let binning = Binning::new(4, 0., 2.);
        assert_eq!(binning.find_bin(-0.1), 0);
        assert_eq!(binning.find_bin(0.), 1);
        assert_eq!(binning.find_bin(0.49), 1);
        assert_eq!(binning.find_bin(0.5), 2);
        assert_eq!(binning.find_bin(1.999), 4);
        assert_eq!(binning.find_bin(2.), 5);
        assert_eq!(binning.find_bin(f64::NAN), 5);
        assert_eq!(binning.find_bin(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn clamped_bins() {
        let binning = Binning::new(3, 1., 4.);
        assert_eq!(binning.find_clamped_bin(-100.), 0);
        assert_eq!(binning.find_clamped_bin(1.), 0);
        assert_eq!(binning.find_clamped_bin(2.5), 1);
        assert_eq!(binning.find_clamped_bin(4.), 2);
        assert_eq!(binning.find_clamped_bin(1e9), 2);
    }

    #[test]
    fn fill_tracks_weights_and_squares() {
        let mut hist = Histogram::new(Binning::new(2, 0., 10.));
        hist.fill(1., 0.5);
        hist.fill(2., 1.5);
        hist.fill(7., 2.);
        assert_eq!(hist.entries(1), 2);
        assert_eq!(hist.sum_weights(1), 2.);
        assert_eq!(hist.sum_weights2(1), 0.25 + 2.25);
        assert_eq!(hist.sum_weights(2), 2.);
        assert_eq!(hist.error(2), 2.);
        assert_eq!(hist.total_entries(), 3);
    }

    #[test]
    fn out_of_range_values_are_kept() {
        let mut hist = Histogram::new(Binning::new(5, -1., 1.));
        hist.fill(-3., 1.);
        hist.fill(1., 2.);
        hist.fill(42., 3.);
        assert_eq!(hist.underflow(), 1.);
        assert_eq!(hist.overflow(), 5.);
        assert_eq!(hist.integral(), 0.);
        assert_eq!(hist.total_weight(), 6.);
        assert_eq!(hist.total_entries(), 3);
    }

    #[test]
    fn merge_adds_slot_by_slot() {
        let binning = Binning::new(3, 0., 3.);
        let mut h1 = Histogram::new(binning);
        let mut h2 = Histogram::new(binning);
        h1.fill(0.5, 1.);
        h2.fill(0.5, 2.);
        h2.fill(5., 4.);
        h1.merge(&h2);
        assert_eq!(h1.sum_weights(1), 3.);
        assert_eq!(h1.sum_weights2(1), 5.);
        assert_eq!(h1.entries(1), 2);
        assert_eq!(h1.overflow(), 4.);
    }

    #[test]
    #[should_panic]
    fn merge_rejects_other_binning() {
        let mut h1 = Histogram::new(Binning::new(3, 0., 3.));
        let h2 = Histogram::new(Binning::new(4, 0., 3.));
        h1.merge(&h2);
    }
}
