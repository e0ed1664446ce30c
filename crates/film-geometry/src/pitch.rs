//! Pitch and film-metre conversion.

use pouch_core::policy::FilmPolicy;
use pouch_core::{BagType, Dimensions, FilmUsage, PitchRule, PricingPolicy, ValidationError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Web length consumed by one roll-film unit (one metre).
const METRE_MM: u32 = 1000;

/// Repeating length of one piece along the web, in millimetres.
pub fn pitch_mm(bag_type: BagType, d: &Dimensions) -> Result<u32, ValidationError> {
    let pitch = match bag_type.pitch_rule() {
        PitchRule::Height => d.height_mm,
        PitchRule::DepthPlusWidth => d.depth_mm.saturating_add(d.width_mm),
        PitchRule::Width => d.width_mm,
        PitchRule::Metre => METRE_MM,
    };
    if pitch == 0 {
        return Err(ValidationError::NonPositivePitch);
    }
    Ok(pitch)
}

pub fn pouches_per_meter(pitch_mm: u32) -> Result<Decimal, ValidationError> {
    if pitch_mm == 0 {
        return Err(ValidationError::NonPositivePitch);
    }
    Ok(Decimal::from(METRE_MM) / Decimal::from(pitch_mm))
}

/// Metres of web for `quantity` pieces, without any loss allowance.
pub fn theoretical_meters(quantity: u64, pitch_mm: u32) -> Decimal {
    Decimal::from(quantity) * Decimal::from(pitch_mm) / Decimal::from(METRE_MM)
}

/// Metres reserved for one SKU: rounded up to the secured step and never
/// below the per-SKU minimum for the job's SKU count.
pub fn secured_meters(theoretical: Decimal, sku_count: usize, film: &FilmPolicy) -> u64 {
    let step = Decimal::from(film.secured_step_meters.max(1));
    let rounded = ((theoretical / step).ceil() * step)
        .to_u64()
        .unwrap_or(u64::MAX);
    rounded.max(film.min_secured_per_sku(sku_count))
}

/// Film detail for one SKU.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuFilm {
    pub theoretical_meters: Decimal,
    pub secured_meters: u64,
}

/// Job-level film usage plus the per-SKU split it was summed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmPlan {
    pub usage: FilmUsage,
    pub per_sku: Vec<SkuFilm>,
}

/// Compute film usage for a job given its per-SKU quantities.
pub fn film_plan(
    bag_type: BagType,
    d: &Dimensions,
    per_sku: &[u64],
    policy: &PricingPolicy,
) -> Result<FilmPlan, ValidationError> {
    let pitch = pitch_mm(bag_type, d)?;
    let ppm = pouches_per_meter(pitch)?;
    let sku_count = per_sku.len().max(1);
    let per_sku: Vec<SkuFilm> = per_sku
        .iter()
        .map(|&q| {
            let theoretical = theoretical_meters(q, pitch);
            SkuFilm {
                theoretical_meters: theoretical,
                secured_meters: secured_meters(theoretical, sku_count, &policy.film),
            }
        })
        .collect();
    let theoretical: Decimal = per_sku.iter().map(|s| s.theoretical_meters).sum();
    let secured: u64 = per_sku.iter().map(|s| s.secured_meters).sum();
    let loss = policy.film.fixed_loss_meters;
    tracing::debug!(pitch, %theoretical, secured, loss, "film plan");
    Ok(FilmPlan {
        usage: FilmUsage {
            pitch_mm: pitch,
            pouches_per_meter: ppm,
            theoretical_meters: theoretical,
            secured_meters: secured,
            loss_meters: loss,
            total_meters: secured.saturating_add(loss),
        },
        per_sku,
    })
}
