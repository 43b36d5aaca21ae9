use std::collections::HashMap;

/// The composite mean/median/mode result.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub median: f64,
    pub mode: Vec<f64>,
}

pub struct Statistics;

impl Statistics {
    /// Arithmetic mean. Empty input yields `0.0`.
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        sum / values.len() as f64
    }

    /// Middle value of the sorted input, or the mean of the two middle values
    /// for even lengths. Empty input yields `0.0`.
    pub fn median(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            sorted[mid]
        } else {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        }
    }

    /// Most frequent value(s), ascending and without duplicates.
    ///
    /// When every value occurs once and there is more than one value, there is
    /// no mode and the result is empty.
    pub fn mode(values: &[f64]) -> Vec<f64> {
        if values.is_empty() {
            return Vec::new();
        }

        let mut counts: HashMap<u64, usize> = HashMap::new();
        for &v in values {
            *counts.entry(frequency_key(v)).or_insert(0) += 1;
        }

        let max_count = counts.values().copied().max().unwrap_or(0);
        if max_count == 1 && values.len() > 1 {
            return Vec::new();
        }

        let mut modes: Vec<f64> = counts
            .into_iter()
            .filter(|&(_, count)| count == max_count)
            .map(|(bits, _)| f64::from_bits(bits))
            .collect();
        modes.sort_by(f64::total_cmp);
        modes
    }

    pub fn summary(values: &[f64]) -> Summary {
        Summary {
            mean: Self::mean(values),
            median: Self::median(values),
            mode: Self::mode(values),
        }
    }
}

// -0.0 and 0.0 are the same value for counting.
fn frequency_key(v: f64) -> u64 {
    if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
}
