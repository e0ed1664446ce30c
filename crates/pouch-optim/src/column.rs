//! Parallel (multi-column) production options.

use pouch_core::{BagType, ColumnProductionOption, Dimensions, PricingPolicy, ValidationError};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

const PERCENT: i64 = 100;

fn round_yen(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Enumerate column counts from 2 up to what fits across the printable
/// width. Lanes keep the requested width; only their number grows.
///
/// Totals are rounded like a quote total, so applying an option charges
/// exactly the listed price. Returns no options (not an error) when fewer
/// than two lanes fit or the order is below the column minimum. Discount rates strictly increase with
/// the column count, so later options are always cheaper per unit.
pub fn calculate_column_production_options(
    total_quantity: u64,
    unit_price: Decimal,
    bag_type: BagType,
    dimensions: &Dimensions,
    policy: &PricingPolicy,
) -> Result<Vec<ColumnProductionOption>, ValidationError> {
    if unit_price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice(unit_price));
    }
    let width = dimensions.width_mm;
    if width == 0 {
        return Err(ValidationError::ZeroExtent("width"));
    }
    let cols = &policy.columns;
    let min_quantity = if bag_type.is_roll_film() {
        cols.min_quantity_roll
    } else {
        cols.min_quantity_unit
    };
    let max_columns = (cols.max_printable_width_mm / width).min(policy.max_column_count());
    if max_columns < 2 || total_quantity < min_quantity {
        debug!(max_columns, total_quantity, "no column production options");
        return Ok(Vec::new());
    }

    let q = Decimal::from(total_quantity);
    let options = (2..=max_columns)
        .filter_map(|c| policy.column_discount_rate(c).map(|rate| (c, rate)))
        .map(|(c, rate)| {
            let columns = Decimal::from(c);
            let unit = unit_price * (Decimal::ONE - rate);
            let quantity = total_quantity * u64::from(c);
            ColumnProductionOption {
                column_count: c,
                column_width_mm: width,
                total_quantity: quantity,
                discount_rate: rate,
                unit_price: unit.round_dp(2),
                total_price: policy.round_to_granularity(unit * Decimal::from(quantity)),
                baseline_total_price: round_yen(columns * q * unit_price),
                savings_rate: rate * Decimal::from(PERCENT),
            }
        })
        .collect();
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dims(width_mm: u32) -> Dimensions {
        Dimensions {
            width_mm,
            height_mm: 300,
            depth_mm: 0,
        }
    }

    #[test]
    fn width_bounds_column_count() {
        let p = PricingPolicy::standard();
        let price = Decimal::new(9120, 2);
        let opts =
            calculate_column_production_options(10_000, price, BagType::StandUp, &dims(200), p)
                .unwrap();
        assert_eq!(
            opts.iter().map(|o| o.column_count).collect::<Vec<_>>(),
            vec![2, 3]
        );
        let two = &opts[0];
        assert_eq!(two.total_quantity, 20_000);
        assert_eq!(two.column_width_mm, 200);
        assert_eq!(two.unit_price, Decimal::new(5472, 2));
        assert_eq!(two.total_price, Decimal::new(1_094_400, 0));
        assert_eq!(two.baseline_total_price, Decimal::new(1_824_000, 0));
        assert_eq!(two.savings_rate, Decimal::new(40, 0));

        let narrow =
            calculate_column_production_options(10_000, price, BagType::StandUp, &dims(100), p)
                .unwrap();
        assert_eq!(narrow.len(), 6);
        assert_eq!(narrow.last().map(|o| o.column_count), Some(7));
    }

    #[test]
    fn single_lane_or_small_order_gives_nothing() {
        let p = PricingPolicy::standard();
        let price = Decimal::new(100, 0);
        assert!(
            calculate_column_production_options(10_000, price, BagType::StandUp, &dims(400), p)
                .unwrap()
                .is_empty()
        );
        assert!(
            calculate_column_production_options(999, price, BagType::StandUp, &dims(200), p)
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            calculate_column_production_options(500, price, BagType::RollFilm, &dims(200), p)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let p = PricingPolicy::standard();
        assert_eq!(
            calculate_column_production_options(
                10_000,
                Decimal::ZERO,
                BagType::StandUp,
                &dims(200),
                p
            ),
            Err(ValidationError::NonPositivePrice(Decimal::ZERO))
        );
    }

    proptest! {
        #[test]
        fn more_columns_more_savings(q in 1000u64..500_000, cents in 100i64..100_000, w in 50u32..=370) {
            let p = PricingPolicy::standard();
            let price = Decimal::new(cents, 2);
            let opts = calculate_column_production_options(q, price, BagType::StandUp, &dims(w), p).unwrap();
            prop_assert!(!opts.is_empty());
            for pair in opts.windows(2) {
                prop_assert!(pair[1].discount_rate > pair[0].discount_rate);
            }
            for o in &opts {
                prop_assert!(o.column_count >= 2);
                prop_assert_eq!(o.total_price % Decimal::new(100, 0), Decimal::ZERO);
                prop_assert!(o.total_price < o.baseline_total_price);
            }
        }
    }
}
