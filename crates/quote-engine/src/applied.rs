//! Applying a chosen production option on top of a baseline quote.

use pouch_core::{
    AppliedOption, ColumnProductionOption, CostBreakdown, PricingPolicy, QuoteRequest,
    QuoteResult, SkuCost,
};
use pouch_econ::{allocate_by_weight, lead_time_days};
use rust_decimal::Decimal;

/// Re-price a baseline quote for `option.column_count` parallel lanes.
///
/// Every cost line and the delivery charge scale with the lane count. The
/// total is the option's listed price, and the discount line absorbs the
/// difference so the breakdown stays balanced.
pub(crate) fn apply_column(
    req: &QuoteRequest,
    baseline: &QuoteResult,
    option: &ColumnProductionOption,
    policy: &PricingPolicy,
) -> QuoteResult {
    let c = Decimal::from(option.column_count);
    let b = &baseline.breakdown;
    let subtotal = b.subtotal * c;
    let delivery = b.delivery * c;
    let total = option.total_price;
    let breakdown = CostBreakdown {
        material: b.material * c,
        processing: b.processing * c,
        printing: b.printing * c,
        setup: b.setup * c,
        minimum_charge: b.minimum_charge * c,
        subtotal,
        discount: subtotal + delivery - total,
        delivery,
        total,
    };

    let quantity = baseline.quantity * u64::from(option.column_count);
    // Lanes run side by side: same web length, c times the pieces per metre.
    let mut film_usage = baseline.film_usage.clone();
    film_usage.pouches_per_meter *= c;

    let sku_costs = baseline.sku_costs.as_ref().map(|costs| {
        let weights: Vec<u64> = costs.iter().map(|s| s.quantity).collect();
        costs
            .iter()
            .zip(allocate_by_weight(total, &weights))
            .map(|(s, amount)| SkuCost {
                quantity: s.quantity * u64::from(option.column_count),
                amount,
                ..s.clone()
            })
            .collect()
    });

    QuoteResult {
        unit_price: (total / Decimal::from(quantity)).round_dp(2),
        total_price: total,
        quantity,
        breakdown,
        lead_time_days: lead_time_days(
            quantity,
            req.delivery.urgency,
            baseline.post_processing_multiplier,
            policy,
        ),
        film_usage,
        sku_costs,
        applied_option: Some(AppliedOption::Column {
            column_count: option.column_count,
        }),
        original_unit_price: Some(baseline.unit_price),
        original_total_price: Some(baseline.total_price),
        ..baseline.clone()
    }
}

/// Mark a re-quoted SKU split as derived from `baseline`.
pub(crate) fn mark_sku_split(
    mut split: QuoteResult,
    baseline: &QuoteResult,
    sku_count: usize,
) -> QuoteResult {
    split.applied_option = Some(AppliedOption::SkuSplit { sku_count });
    split.original_unit_price = Some(baseline.unit_price);
    split.original_total_price = Some(baseline.total_price);
    split
}
