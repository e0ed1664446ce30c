//! Economic order quantity.
//!
//! Film is secured in whole steps above a per-job minimum and every job
//! carries a fixed setup loss, so an order rarely uses its secured film
//! fully. The economic quantity is what the secured film can actually
//! produce; a small candidate set of practical lot sizes is compared on unit
//! cost under the model `unit_cost(q) = unit_price × Q × film(q) / film(Q) / q`.

use film_geometry::{pitch_mm, pouches_per_meter, secured_meters, theoretical_meters};
use pouch_core::{
    BagType, Dimensions, EconomicQuantitySuggestion, PricingPolicy, QuantityCandidate,
    ValidationError,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::column::calculate_column_production_options;

const PERCENT: i64 = 100;

/// Tuning for [`suggest_economic_quantity`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionOptions {
    /// Number of SKUs the order is split into; raises the film minimum.
    #[serde(default = "default_sku_count")]
    pub sku_count: usize,
    /// Production lot size; the policy lot size when absent.
    #[serde(default)]
    pub lot_size: Option<u64>,
    #[serde(default)]
    pub include_column_options: bool,
}

fn default_sku_count() -> usize {
    1
}

impl Default for SuggestionOptions {
    fn default() -> Self {
        Self {
            sku_count: 1,
            lot_size: None,
            include_column_options: false,
        }
    }
}

fn to_u64(v: Decimal) -> u64 {
    v.to_u64().unwrap_or(u64::MAX)
}

fn percent(v: Decimal) -> Decimal {
    (v * Decimal::from(PERCENT)).round_dp(1)
}

/// Secured-film model for one job shape.
struct FilmModel<'a> {
    pitch: u32,
    ppm: Decimal,
    sku_count: usize,
    policy: &'a PricingPolicy,
}

impl FilmModel<'_> {
    /// Secured metres for `q` pieces, never below the job minimum.
    fn secured(&self, q: u64) -> u64 {
        let film = &self.policy.film;
        let job_min = film.min_secured_per_sku(self.sku_count) * self.sku_count as u64;
        secured_meters(theoretical_meters(q, self.pitch), self.sku_count, film).max(job_min)
    }

    /// Secured metres plus the fixed loss.
    fn total(&self, q: u64) -> u64 {
        self.secured(q).saturating_add(self.policy.film.fixed_loss_meters)
    }

    /// Pieces producible from `meters` of web.
    fn pieces(&self, meters: u64) -> u64 {
        to_u64((Decimal::from(meters) * self.ppm).floor())
    }
}

/// Propose an economic order quantity for `quantity` pieces (metres for roll
/// film) currently priced at `unit_price`.
///
/// `film_usage` is the film the current order consumes including loss; when
/// absent it is the theoretical length rounded up plus the fixed loss. The
/// recommendation is the cheapest candidate whose overrun stays within the
/// policy limit; the requested quantity always qualifies.
pub fn suggest_economic_quantity(
    quantity: u64,
    dimensions: &Dimensions,
    bag_type: BagType,
    film_usage: Option<u64>,
    unit_price: Decimal,
    options: &SuggestionOptions,
    policy: &PricingPolicy,
) -> Result<EconomicQuantitySuggestion, ValidationError> {
    if unit_price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice(unit_price));
    }
    if quantity == 0 {
        return Err(ValidationError::QuantityBelowMinimum {
            min: policy.min_quantity_per_sku(bag_type, options.sku_count.max(1)),
            actual: 0,
        });
    }
    let max_quantity = policy.quantities.max_order_quantity;
    if quantity > max_quantity {
        return Err(ValidationError::QuantityAboveMaximum {
            max: max_quantity,
            actual: quantity,
        });
    }
    let pitch = pitch_mm(bag_type, dimensions)?;
    let model = FilmModel {
        pitch,
        ppm: pouches_per_meter(pitch)?,
        sku_count: options.sku_count.max(1),
        policy,
    };
    let loss = policy.film.fixed_loss_meters;
    let econ = &policy.economic;
    let lot = options.lot_size.unwrap_or(econ.lot_size).max(1);

    let order_film = film_usage
        .unwrap_or_else(|| to_u64(theoretical_meters(quantity, pitch).ceil()) + loss)
        .max(1);
    let job_min_secured = model.secured(0);
    let minimum_film_usage = job_min_secured + loss;
    let minimum_order_quantity = model.pieces(job_min_secured);

    let economic_secured = model.secured(quantity);
    let economic_quantity = model.pieces(economic_secured).max(quantity);
    let economic_film_usage = economic_secured + loss;

    let q = Decimal::from(quantity);
    let order_total = unit_price
        .checked_mul(q)
        .ok_or(ValidationError::PriceOutOfRange(unit_price))?;
    let unit_cost = |candidate: u64, film: u64| -> Result<Decimal, ValidationError> {
        order_total
            .checked_mul(Decimal::from(film))
            .and_then(|v| v.checked_div(Decimal::from(order_film)))
            .and_then(|v| v.checked_div(Decimal::from(candidate)))
            .map(|v| v.round_dp(2))
            .ok_or(ValidationError::PriceOutOfRange(unit_price))
    };
    let overrun = |candidate: u64| -> Decimal {
        Decimal::from(candidate - quantity) / Decimal::from(candidate)
    };

    // Lot candidates beyond the largest accepted order are not offered.
    let next_lot = (quantity / lot)
        .checked_add(1)
        .and_then(|n| n.checked_mul(lot))
        .filter(|&n| n <= max_quantity);
    let double_lot = next_lot
        .and_then(|n| n.checked_mul(2))
        .filter(|&n| n <= max_quantity);
    let mut candidates: Vec<QuantityCandidate> = Vec::with_capacity(4);
    for (label, candidate) in [
        ("requested", Some(quantity)),
        ("economic", Some(economic_quantity)),
        ("next_lot", next_lot),
        ("double_lot", double_lot),
    ] {
        let Some(candidate) = candidate else {
            continue;
        };
        if candidates.iter().any(|c| c.quantity == candidate) {
            continue;
        }
        let film = if candidate == quantity {
            order_film
        } else {
            model.total(candidate)
        };
        candidates.push(QuantityCandidate {
            label: label.to_string(),
            quantity: candidate,
            film_usage_meters: film,
            unit_cost: unit_cost(candidate, film)?,
            overrun_rate: overrun(candidate),
        });
    }

    // Cheapest eligible candidate; the smaller quantity wins ties.
    let recommended = candidates
        .iter()
        .filter(|c| c.overrun_rate <= econ.max_overrun_rate)
        .min_by(|a, b| a.unit_cost.cmp(&b.unit_cost).then(a.quantity.cmp(&b.quantity)))
        .map(|c| c.quantity)
        .unwrap_or(quantity);

    let economic_overrun = overrun(economic_quantity);
    let recommendation_reason = if recommended > quantity {
        format!(
            "maximise film efficiency: {quantity} -> {recommended} ({} extra, {}% overrun)",
            recommended - quantity,
            percent(overrun(recommended))
        )
    } else if economic_quantity == quantity {
        format!("order quantity {quantity} already uses the secured film efficiently")
    } else if economic_overrun <= econ.choice_overrun_rate {
        format!(
            "choice: {quantity} as ordered or {economic_quantity} for film efficiency ({}% overrun)",
            percent(economic_overrun)
        )
    } else {
        format!(
            "keep order quantity {quantity}: {economic_quantity} would overrun by {}%",
            percent(economic_overrun)
        )
    };

    let unit_cost_at_order_qty = unit_price.round_dp(2);
    let unit_cost_at_economic_qty = unit_cost(economic_quantity, economic_film_usage)?;
    let cost_savings = unit_cost_at_order_qty - unit_cost_at_economic_qty;
    let order_efficiency = q / Decimal::from(order_film);
    let economic_efficiency =
        Decimal::from(economic_quantity) / Decimal::from(economic_film_usage);

    let column_options = if options.include_column_options {
        calculate_column_production_options(quantity, unit_price, bag_type, dimensions, policy)?
    } else {
        Vec::new()
    };

    debug!(
        quantity,
        economic_quantity, recommended, order_film, economic_film_usage, "economic quantity"
    );

    Ok(EconomicQuantitySuggestion {
        order_quantity: quantity,
        minimum_order_quantity,
        minimum_film_usage,
        pouches_per_meter: model.ppm.round_dp(4),
        economic_quantity,
        economic_film_usage,
        efficiency_improvement: percent(economic_efficiency / order_efficiency - Decimal::ONE),
        unit_cost_at_order_qty,
        unit_cost_at_economic_qty,
        cost_savings,
        cost_savings_rate: percent(cost_savings / unit_cost_at_order_qty),
        recommended_quantity: recommended,
        recommendation_reason,
        candidates,
        column_options,
    })
}
