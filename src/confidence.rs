//! Confidence scoring for item aggregates.
//!
//! The score expresses how much an item's displayed average can be trusted
//! given how many ratings it has and how spread out they are. The curve is a
//! tunable; the contract is the shape: 0 at zero ratings, strictly
//! increasing with sample count for a fixed distribution, bounded below 1.

/// Saturation exponent applied to the sample count.
const GROWTH_EXPONENT: f64 = 4.0 / 3.0;

/// Half-saturation constant for an ideally tight distribution.
const BASELINE: f64 = 5.0;

/// How strongly rating variance drags the score down.
const SPREAD_WEIGHT: f64 = 0.08;

/// Compute the confidence score for a star histogram (index i = i+1 stars).
/// Returns a value in [0, 1).
pub fn confidence(histogram: &[u64; 5]) -> f64 {
    let count: u64 = histogram.iter().sum();
    if count == 0 {
        return 0.0;
    }

    let n = count as f64;
    let mean = histogram
        .iter()
        .enumerate()
        .map(|(i, c)| (i as f64 + 1.0) * *c as f64)
        .sum::<f64>()
        / n;
    let variance = histogram
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let deviation = (i as f64 + 1.0) - mean;
            deviation * deviation * *c as f64
        })
        .sum::<f64>()
        / n;

    let support = n.powf(GROWTH_EXPONENT);
    support / (support + BASELINE * (1.0 + SPREAD_WEIGHT * variance))
}
