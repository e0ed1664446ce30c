//! Splitting a fixed total quantity into several SKUs.

use pouch_core::{BagType, PricingPolicy, SkuSplitOption};

/// Split `total` into `sku_count` quantities in whole steps, as equal as
/// possible. Extra steps go to the leading SKUs; the sub-step remainder
/// goes to the first.
fn split_evenly(total: u64, sku_count: usize, step: u64) -> Vec<u64> {
    let n = sku_count as u64;
    let steps = total / step;
    let sub_step = total % step;
    let base = steps / n;
    let extra = steps % n;
    let mut parts: Vec<u64> = (0..n).map(|i| (base + u64::from(i < extra)) * step).collect();
    if let Some(first) = parts.first_mut() {
        *first += sub_step;
    }
    parts
}

/// SKU splits of `total` for a bag type, omitting any split whose smallest
/// SKU would fall below the per-SKU floor.
pub fn calculate_sku_split_options_for(
    total: u64,
    bag_type: BagType,
    policy: &PricingPolicy,
) -> Vec<SkuSplitOption> {
    let step = policy.sku_split.quantity_step.max(1);
    (1..=policy.sku_split.max_sku_count)
        .filter_map(|n| {
            let floor = policy.min_quantity_per_sku(bag_type, n);
            let quantities = split_evenly(total, n, step);
            if quantities.iter().any(|&q| q < floor) {
                return None;
            }
            let is_even = quantities.windows(2).all(|w| w[0] == w[1]);
            Some(SkuSplitOption {
                sku_count: n,
                quantities,
                min_quantity_per_sku: floor,
                is_even,
            })
        })
        .collect()
}

/// SKU splits of `total` using the unit-product floors.
pub fn calculate_sku_split_options(total: u64, policy: &PricingPolicy) -> Vec<SkuSplitOption> {
    calculate_sku_split_options_for(total, BagType::StandUp, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn three_thousand_splits_up_to_six() {
        let opts = calculate_sku_split_options(3000, PricingPolicy::standard());
        assert_eq!(
            opts.iter().map(|o| o.sku_count).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5, 6]
        );
        let four = &opts[3];
        assert_eq!(four.quantities, vec![800, 800, 700, 700]);
        assert!(!four.is_even);
        assert!(opts[2].is_even);
    }

    #[test]
    fn sub_step_remainder_lands_on_first_sku() {
        let opts = calculate_sku_split_options(2050, PricingPolicy::standard());
        assert_eq!(opts[1].quantities, vec![1050, 1000]);
        assert_eq!(opts[1].quantities.iter().sum::<u64>(), 2050);
    }

    #[test]
    fn roll_film_uses_lower_multi_sku_floor() {
        let p = PricingPolicy::standard();
        let unit = calculate_sku_split_options(1200, p);
        assert_eq!(unit.len(), 2);
        let roll = calculate_sku_split_options_for(1200, BagType::RollFilm, p);
        assert_eq!(roll.len(), 4);
        assert_eq!(roll[3].quantities, vec![300; 4]);
        assert_eq!(roll[3].min_quantity_per_sku, 300);
    }

    #[test]
    fn below_floor_gives_nothing() {
        assert!(calculate_sku_split_options(400, PricingPolicy::standard()).is_empty());
    }

    proptest! {
        #[test]
        fn splits_preserve_total_and_floor(total in 0u64..200_000) {
            let p = PricingPolicy::standard();
            for opt in calculate_sku_split_options(total, p) {
                prop_assert_eq!(opt.quantities.len(), opt.sku_count);
                prop_assert_eq!(opt.quantities.iter().sum::<u64>(), total);
                prop_assert!(opt.quantities.iter().all(|&q| q >= opt.min_quantity_per_sku));
                prop_assert!(opt.sku_count <= 10);
            }
        }
    }
}
