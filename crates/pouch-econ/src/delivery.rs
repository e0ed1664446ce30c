//! Shipping charge and production lead time.

use pouch_core::{Catalog, CatalogGapError, PricingPolicy, QuoteRequest, Urgency};
use rust_decimal::Decimal;

const MM2_PER_M2: i64 = 1_000_000;
const G_PER_KG: i64 = 1000;

/// Estimated shipping weight of one unit product, in grams: two film faces
/// of `width × height` with the material's laminate.
pub fn unit_weight_g(req: &QuoteRequest, catalog: &Catalog) -> Result<Decimal, CatalogGapError> {
    let layers = req.film_layers(catalog)?;
    let areal = layers.iter().try_fold(Decimal::ZERO, |acc, layer| {
        Ok::<_, CatalogGapError>(
            acc + Decimal::from(layer.thickness_um) * catalog.density(&layer.material_id)?,
        )
    })?;
    let d = &req.dimensions;
    let faces_mm2 = 2 * u64::from(d.width_mm) * u64::from(d.height_mm);
    let faces_m2 = Decimal::from(faces_mm2) / Decimal::from(MM2_PER_M2);
    Ok(faces_m2 * areal)
}

/// Delivery charge, rounded to the currency granularity.
///
/// Roll film ships per roll. Unit products pay a base plus weight charge
/// unless the net order value reaches the free-shipping threshold.
pub fn delivery_charge(
    req: &QuoteRequest,
    quantity: u64,
    net_price: Decimal,
    catalog: &Catalog,
    policy: &PricingPolicy,
) -> Result<Decimal, CatalogGapError> {
    let location = req.delivery.location;
    if req.bag_type.is_roll_film() {
        let rolls = Decimal::from(req.roll_count());
        return Ok(policy.round_to_granularity(rolls * policy.delivery.per_roll(location)));
    }
    let rate = policy.delivery.rate(location);
    if net_price >= rate.free_threshold {
        return Ok(Decimal::ZERO);
    }
    let weight_kg =
        unit_weight_g(req, catalog)? * Decimal::from(quantity) / Decimal::from(G_PER_KG);
    Ok(policy.round_to_granularity(rate.base + rate.per_kg * weight_kg))
}

/// Working days from order to dispatch.
pub fn lead_time_days(
    quantity: u64,
    urgency: Urgency,
    post_processing_multiplier: Decimal,
    policy: &PricingPolicy,
) -> u32 {
    let lt = &policy.lead_time;
    let mut days = match urgency {
        Urgency::Standard => lt.standard_days,
        Urgency::Express => lt.express_days,
    };
    if quantity >= lt.large_order_quantity {
        days += lt.large_order_extra_days;
    } else if quantity >= lt.medium_order_quantity {
        days += lt.medium_order_extra_days;
    }
    if post_processing_multiplier > Decimal::ONE {
        days += lt.post_processing_extra_days;
    }
    days
}
