//! One specification priced at several quantities, for buyers weighing
//! unit price against order size.

use pouch_core::{PriceTrend, QuantityComparison, QuantityQuote, QuoteResult, ValidationError};
use rust_decimal::{Decimal, RoundingStrategy};

const PERCENT: i64 = 100;

fn round_yen(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn exact_unit(q: &QuoteResult) -> Decimal {
    q.total_price / Decimal::from(q.quantity.max(1))
}

fn mean(values: &[Decimal]) -> Decimal {
    values.iter().sum::<Decimal>() / Decimal::from(values.len().max(1))
}

/// Unit prices of the upper half against the lower half; a move of more
/// than 5% either way is a trend.
fn price_trend(unit_prices: &[Decimal]) -> PriceTrend {
    if unit_prices.len() < 2 {
        return PriceTrend::Stable;
    }
    let (lower, upper) = unit_prices.split_at(unit_prices.len() / 2);
    let first = mean(lower);
    if first.is_zero() {
        return PriceTrend::Stable;
    }
    let change = (mean(upper) - first) / first;
    let threshold = Decimal::new(5, 2);
    if change < -threshold {
        PriceTrend::Decreasing
    } else if change > threshold {
        PriceTrend::Increasing
    } else {
        PriceTrend::Stable
    }
}

/// Summarise quotes already sorted by ascending quantity.
pub(crate) fn summarize(quotes: &[QuoteResult]) -> Result<QuantityComparison, ValidationError> {
    let smallest = quotes.first().ok_or(ValidationError::NoQuantities)?;
    let base_unit = exact_unit(smallest);
    let hundred = Decimal::from(PERCENT);

    let entries: Vec<QuantityQuote> = quotes
        .iter()
        .map(|q| {
            let at_base = base_unit * Decimal::from(q.quantity);
            QuantityQuote {
                quantity: q.quantity,
                unit_price: q.unit_price,
                total_price: q.total_price,
                discount_rate: q.discount_rate,
                savings_vs_smallest: round_yen(at_base - q.total_price),
                cost_ratio: if at_base.is_zero() {
                    hundred
                } else {
                    (q.total_price / at_base * hundred).round_dp(1)
                },
            }
        })
        .collect();

    let best_value_quantity = quotes
        .iter()
        .min_by(|a, b| {
            exact_unit(a)
                .cmp(&exact_unit(b))
                .then(a.quantity.cmp(&b.quantity))
        })
        .map_or(smallest.quantity, |q| q.quantity);

    let unit_prices: Vec<Decimal> = quotes.iter().map(|q| q.unit_price).collect();
    let highest = unit_prices.iter().copied().max().unwrap_or(Decimal::ZERO);
    let lowest = unit_prices.iter().copied().min().unwrap_or(Decimal::ZERO);
    let unit_price_spread = if highest.is_zero() {
        Decimal::ZERO
    } else {
        ((highest - lowest) / highest * hundred).round_dp(1)
    };

    Ok(QuantityComparison {
        balanced_quantity: entries[entries.len() / 2].quantity,
        quotes: entries,
        best_value_quantity,
        unit_price_spread,
        price_trend: price_trend(&unit_prices),
    })
}
