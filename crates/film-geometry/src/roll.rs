//! Roll-film weight and length planning.
//!
//! Weight in grams is `width_mm × length_m × Σ(thickness_um × density) / 1000`:
//! one metre of a 1 mm wide, 1 µm thick film of density 1 g/cm³ weighs 1 mg.

use pouch_core::{
    Catalog, EngineError, FilmStructureLayer, PricingPolicy, RollFilmValidation, RollPlan,
    RollWeightResult, RollWeightWarning, ValidationError,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const MG_PER_G: i64 = 1000;

/// Areal weight factor Σ(µm × ρ) of a laminate. Unknown layer materials fail
/// closed.
fn stack_factor(layers: &[FilmStructureLayer], catalog: &Catalog) -> Result<Decimal, EngineError> {
    if layers.is_empty() {
        return Err(ValidationError::EmptyFilmStructure.into());
    }
    layers.iter().try_fold(Decimal::ZERO, |acc, layer| {
        let density = catalog.density(&layer.material_id)?;
        Ok(acc + Decimal::from(layer.thickness_um) * density)
    })
}

/// Weight of a roll of `width_mm` × `length_m` with the given laminate.
pub fn calculate_roll_weight(
    width_mm: u32,
    length_m: u64,
    layers: &[FilmStructureLayer],
    catalog: &Catalog,
) -> Result<RollWeightResult, EngineError> {
    if width_mm == 0 {
        return Err(ValidationError::ZeroExtent("width").into());
    }
    let factor = stack_factor(layers, catalog)?;
    let per_meter = Decimal::from(width_mm) * factor / Decimal::from(MG_PER_G);
    Ok(RollWeightResult {
        total_weight_g: per_meter * Decimal::from(length_m),
        weight_per_meter_g: per_meter,
    })
}

/// Split `total_length` metres over `roll_count` rolls. The remainder is
/// spread one metre each over the leading rolls, so the first roll is the
/// longest and the parts always sum to the input.
pub fn distribute_length_evenly(
    total_length: u64,
    roll_count: u32,
) -> Result<Vec<u64>, ValidationError> {
    if roll_count == 0 {
        return Err(ValidationError::ZeroRollCount);
    }
    let n = u64::from(roll_count);
    let base = total_length / n;
    let remainder = total_length % n;
    Ok((0..n).map(|i| base + u64::from(i < remainder)).collect())
}

/// Plan the rolls of a roll-film job and check each against the weight limit.
///
/// Every roll carries at least one metre: a roll count above the length is
/// rejected rather than planned with empty rolls.
/// Fails with `WeightLimitExceeded` on the first roll above the limit; rolls
/// at or above the warning ratio are reported but accepted.
pub fn validate_roll_film_params(
    length_m: u64,
    roll_count: u32,
    width_mm: u32,
    layers: &[FilmStructureLayer],
    catalog: &Catalog,
    policy: &PricingPolicy,
) -> Result<RollFilmValidation, EngineError> {
    if length_m == 0 {
        return Err(ValidationError::ZeroExtent("length").into());
    }
    if u64::from(roll_count) > length_m {
        return Err(ValidationError::RollCountExceedsLength {
            roll_count,
            length_m,
        }
        .into());
    }
    let lengths = distribute_length_evenly(length_m, roll_count)?;
    let per_meter = calculate_roll_weight(width_mm, 1, layers, catalog)?.weight_per_meter_g;
    let limit = policy.roll.max_roll_weight_g;
    let warn_at = limit * policy.roll.warning_ratio;

    let mut rolls = Vec::with_capacity(lengths.len());
    let mut warnings = Vec::new();
    for (index, length) in lengths.into_iter().enumerate() {
        let weight = per_meter * Decimal::from(length);
        if weight > limit {
            tracing::warn!(roll_index = index, %weight, %limit, "roll exceeds weight limit");
            return Err(EngineError::WeightLimitExceeded {
                roll_index: index,
                weight_g: weight,
                limit_g: limit,
            });
        }
        if weight >= warn_at {
            tracing::warn!(roll_index = index, %weight, %limit, "roll close to weight limit");
            warnings.push(RollWeightWarning {
                roll_index: index,
                weight_g: weight,
                load_ratio: weight / limit,
            });
        }
        rolls.push(RollPlan {
            index,
            length_m: length,
            weight_g: weight,
        });
    }
    Ok(RollFilmValidation { rolls, warnings })
}

/// Smallest roll count for which every evenly distributed roll is within
/// the weight limit.
pub fn minimum_roll_count(
    length_m: u64,
    width_mm: u32,
    layers: &[FilmStructureLayer],
    catalog: &Catalog,
    policy: &PricingPolicy,
) -> Result<u32, EngineError> {
    if length_m == 0 {
        return Err(ValidationError::ZeroExtent("length").into());
    }
    let per_meter = calculate_roll_weight(width_mm, 1, layers, catalog)?.weight_per_meter_g;
    let limit = policy.roll.max_roll_weight_g;
    if per_meter > limit {
        return Err(EngineError::WeightLimitExceeded {
            roll_index: 0,
            weight_g: per_meter,
            limit_g: limit,
        });
    }
    let total = per_meter * Decimal::from(length_m);
    // Lower bound from total weight; uneven splits may need one more.
    let mut n = (total / limit).ceil().to_u64().unwrap_or(1).max(1);
    loop {
        let longest = length_m.div_ceil(n);
        if per_meter * Decimal::from(longest) <= limit {
            return u32::try_from(n).map_err(|_| {
                EngineError::Validation(ValidationError::OptionNotFeasible(format!(
                    "{n} rolls required"
                )))
            });
        }
        n += 1;
    }
}
