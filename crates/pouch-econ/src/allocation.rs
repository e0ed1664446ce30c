//! Proportional allocation of a rounded total across SKUs.

use rust_decimal::Decimal;

/// Split `total` in proportion to `weights` at the total's own resolution
/// (one yen for whole-yen totals) using the largest-remainder method.
///
/// The parts always sum to `total`. Leftover units go to the largest
/// fractional remainders; ties go to the lower index. With all-zero weights
/// the whole amount lands on the first part.
pub fn allocate_by_weight(total: Decimal, weights: &[u64]) -> Vec<Decimal> {
    if weights.is_empty() {
        return Vec::new();
    }
    let normalized = total.normalize();
    let scale = normalized.scale();
    let units = normalized.mantissa();
    let parts = largest_remainder(units, weights);
    parts
        .into_iter()
        .map(|p| Decimal::from_i128_with_scale(p, scale))
        .collect()
}

fn largest_remainder(units: i128, weights: &[u64]) -> Vec<i128> {
    let sum: i128 = weights.iter().map(|&w| i128::from(w)).sum();
    if sum == 0 {
        let mut parts = vec![0; weights.len()];
        parts[0] = units;
        return parts;
    }
    let mut parts = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (i, &w) in weights.iter().enumerate() {
        let scaled = units * i128::from(w);
        parts.push(scaled.div_euclid(sum));
        remainders.push((scaled.rem_euclid(sum), i));
    }
    let leftover = units - parts.iter().sum::<i128>();
    // Largest remainder first, lower index on ties.
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, i) in remainders.iter().take(leftover.max(0) as usize) {
        parts[i] += 1;
    }
    parts
}
