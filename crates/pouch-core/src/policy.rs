//! Business policy constants, centralised and loadable from YAML.
//!
//! Every number the calculators depend on lives here exactly once. The
//! defaults are the standard values; a YAML document only needs to name the
//! fields it overrides.

use crate::{BagType, DeliveryLocation, ValidationError};
use once_cell::sync::Lazy;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static STANDARD: Lazy<PricingPolicy> = Lazy::new(PricingPolicy::default);

/// One step of the quantity-discount function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountTier {
    /// Tier applies at quantities >= this value.
    pub min_quantity: u64,
    /// Fractional discount, e.g. 0.20.
    pub rate: Decimal,
}

/// Fixed charges that do not scale with quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupPolicy {
    /// Setup for flat-family pouches.
    pub flat_setup: Decimal,
    /// Setup for every other bag type.
    pub standard_setup: Decimal,
    /// Orders below this quantity are small lots.
    pub small_lot_threshold: u64,
    /// Setup multiplier applied to small lots.
    pub small_lot_factor: Decimal,
    /// Extra charge for small flat-family lots.
    pub small_lot_surcharge: Decimal,
}

impl Default for SetupPolicy {
    fn default() -> Self {
        Self {
            flat_setup: Decimal::new(30_000, 0),
            standard_setup: Decimal::new(40_000, 0),
            small_lot_threshold: 3_000,
            small_lot_factor: Decimal::new(12, 1),
            small_lot_surcharge: Decimal::new(30_000, 0),
        }
    }
}

/// Rates for one printing process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintingRate {
    pub setup_fee: Decimal,
    pub per_color_per_unit: Decimal,
    pub min_charge: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintingPolicy {
    pub digital: PrintingRate,
    pub gravure: PrintingRate,
}

impl Default for PrintingPolicy {
    fn default() -> Self {
        Self {
            digital: PrintingRate {
                setup_fee: Decimal::new(10_000, 0),
                per_color_per_unit: Decimal::new(5, 0),
                min_charge: Decimal::new(5_000, 0),
            },
            gravure: PrintingRate {
                setup_fee: Decimal::new(50_000, 0),
                per_color_per_unit: Decimal::new(2, 0),
                min_charge: Decimal::new(20_000, 0),
            },
        }
    }
}

/// Weight-based shipping for piece goods.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRate {
    pub base: Decimal,
    pub per_kg: Decimal,
    /// Shipping is free once the net order value reaches this amount.
    pub free_threshold: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryPolicy {
    pub domestic: DeliveryRate,
    pub international: DeliveryRate,
    /// Roll film ships per roll, regardless of order value.
    pub roll_domestic_per_roll: Decimal,
    pub roll_international_per_roll: Decimal,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            domestic: DeliveryRate {
                base: Decimal::new(1_500, 0),
                per_kg: Decimal::new(150, 0),
                free_threshold: Decimal::new(50_000, 0),
            },
            international: DeliveryRate {
                base: Decimal::new(5_000, 0),
                per_kg: Decimal::new(500, 0),
                free_threshold: Decimal::new(200_000, 0),
            },
            roll_domestic_per_roll: Decimal::new(15_400, 0),
            roll_international_per_roll: Decimal::new(38_000, 0),
        }
    }
}

impl DeliveryPolicy {
    pub fn rate(&self, location: DeliveryLocation) -> &DeliveryRate {
        match location {
            DeliveryLocation::Domestic => &self.domestic,
            DeliveryLocation::International => &self.international,
        }
    }

    pub fn per_roll(&self, location: DeliveryLocation) -> Decimal {
        match location {
            DeliveryLocation::Domestic => self.roll_domestic_per_roll,
            DeliveryLocation::International => self.roll_international_per_roll,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadTimePolicy {
    pub standard_days: u32,
    pub express_days: u32,
    pub large_order_quantity: u64,
    pub large_order_extra_days: u32,
    pub medium_order_quantity: u64,
    pub medium_order_extra_days: u32,
    pub post_processing_extra_days: u32,
}

impl Default for LeadTimePolicy {
    fn default() -> Self {
        Self {
            standard_days: 14,
            express_days: 7,
            large_order_quantity: 10_000,
            large_order_extra_days: 7,
            medium_order_quantity: 5_000,
            medium_order_extra_days: 3,
            post_processing_extra_days: 2,
        }
    }
}

/// Order and per-SKU quantity floors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantityPolicy {
    /// Pieces per SKU for unit products.
    pub unit_min_per_sku: u64,
    /// Metres for a single-SKU roll-film job.
    pub roll_min_single_sku: u64,
    /// Metres per SKU for a multi-SKU roll-film job.
    pub roll_min_multi_sku: u64,
    pub max_order_quantity: u64,
}

impl Default for QuantityPolicy {
    fn default() -> Self {
        Self {
            unit_min_per_sku: 500,
            roll_min_single_sku: 500,
            roll_min_multi_sku: 300,
            max_order_quantity: 1_000_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionPolicy {
    pub min_width_mm: u32,
    pub min_height_mm: u32,
    pub max_dimension_mm: u32,
}

impl Default for DimensionPolicy {
    fn default() -> Self {
        Self {
            min_width_mm: 50,
            min_height_mm: 50,
            max_dimension_mm: 1_000,
        }
    }
}

/// Film consumption rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmPolicy {
    /// Per-job setup loss, added once regardless of quantity.
    pub fixed_loss_meters: u64,
    /// Secured metres are rounded up to this step.
    pub secured_step_meters: u64,
    pub min_secured_single_sku: u64,
    pub min_secured_multi_sku: u64,
}

impl Default for FilmPolicy {
    fn default() -> Self {
        Self {
            fixed_loss_meters: 400,
            secured_step_meters: 50,
            min_secured_single_sku: 500,
            min_secured_multi_sku: 300,
        }
    }
}

impl FilmPolicy {
    pub fn min_secured_per_sku(&self, sku_count: usize) -> u64 {
        if sku_count <= 1 {
            self.min_secured_single_sku
        } else {
            self.min_secured_multi_sku
        }
    }
}

/// Multi-column production. Discount rates must be confirmed with the
/// business owner; they are configuration, not engineering truth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnPolicy {
    pub max_printable_width_mm: u32,
    /// Column count -> fractional discount. Must strictly increase.
    pub discount_rates: BTreeMap<u32, Decimal>,
    pub min_quantity_unit: u64,
    pub min_quantity_roll: u64,
}

impl Default for ColumnPolicy {
    fn default() -> Self {
        let discount_rates = [(2, 40), (3, 48), (4, 55), (5, 58), (6, 61), (7, 64)]
            .into_iter()
            .map(|(c, pct)| (c, Decimal::new(pct, 2)))
            .collect();
        Self {
            max_printable_width_mm: 740,
            discount_rates,
            min_quantity_unit: 1_000,
            min_quantity_roll: 500,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollPolicy {
    pub max_roll_weight_g: Decimal,
    /// Rolls at or above this fraction of the limit produce a warning.
    pub warning_ratio: Decimal,
}

impl Default for RollPolicy {
    fn default() -> Self {
        Self {
            max_roll_weight_g: Decimal::new(29_000, 0),
            warning_ratio: Decimal::new(9, 1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicPolicy {
    pub lot_size: u64,
    /// Largest overrun (extra / candidate) still recommended outright.
    pub max_overrun_rate: Decimal,
    /// Overruns up to this rate are offered as a choice.
    pub choice_overrun_rate: Decimal,
}

impl Default for EconomicPolicy {
    fn default() -> Self {
        Self {
            lot_size: 1_000,
            max_overrun_rate: Decimal::new(10, 2),
            choice_overrun_rate: Decimal::new(30, 2),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkuSplitPolicy {
    pub max_sku_count: usize,
    pub quantity_step: u64,
}

impl Default for SkuSplitPolicy {
    fn default() -> Self {
        Self {
            max_sku_count: 10,
            quantity_step: 100,
        }
    }
}

/// Every business constant used by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    /// Currency granularity; every breakdown line is a multiple of it.
    pub rounding_granularity: Decimal,
    /// Absolute floor on the net order price.
    pub minimum_order_price: Decimal,
    /// Yen per mm² of film before multipliers.
    pub material_rate_per_mm2: Decimal,
    /// Quantity-discount steps, ascending.
    pub quantity_tiers: Vec<DiscountTier>,
    pub setup: SetupPolicy,
    pub printing: PrintingPolicy,
    pub delivery: DeliveryPolicy,
    pub lead_time: LeadTimePolicy,
    pub quantities: QuantityPolicy,
    pub dimensions: DimensionPolicy,
    pub film: FilmPolicy,
    pub columns: ColumnPolicy,
    pub roll: RollPolicy,
    pub economic: EconomicPolicy,
    pub sku_split: SkuSplitPolicy,
    pub quote_validity_days: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        let quantity_tiers = [(5_000, 10), (10_000, 20), (20_000, 30), (50_000, 40)]
            .into_iter()
            .map(|(min_quantity, pct)| DiscountTier {
                min_quantity,
                rate: Decimal::new(pct, 2),
            })
            .collect();
        Self {
            rounding_granularity: Decimal::new(100, 0),
            minimum_order_price: Decimal::new(160_000, 0),
            material_rate_per_mm2: Decimal::new(15, 4),
            quantity_tiers,
            setup: SetupPolicy::default(),
            printing: PrintingPolicy::default(),
            delivery: DeliveryPolicy::default(),
            lead_time: LeadTimePolicy::default(),
            quantities: QuantityPolicy::default(),
            dimensions: DimensionPolicy::default(),
            film: FilmPolicy::default(),
            columns: ColumnPolicy::default(),
            roll: RollPolicy::default(),
            economic: EconomicPolicy::default(),
            sku_split: SkuSplitPolicy::default(),
            quote_validity_days: 30,
        }
    }
}

impl PricingPolicy {
    /// Shared immutable default policy.
    pub fn standard() -> &'static PricingPolicy {
        &STANDARD
    }

    /// Parse a (possibly partial) YAML override and validate it.
    pub fn from_yaml_str(text: &str) -> Result<Self, ValidationError> {
        let policy: PricingPolicy =
            serde_yaml::from_str(text).map_err(|e| ValidationError::InvalidPolicy(e.to_string()))?;
        policy.validate()?;
        tracing::debug!(
            minimum_order_price = %policy.minimum_order_price,
            tiers = policy.quantity_tiers.len(),
            "pricing policy loaded"
        );
        Ok(policy)
    }

    /// Check table invariants the calculators rely on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |msg: String| Err(ValidationError::InvalidPolicy(msg));
        if self.rounding_granularity <= Decimal::ZERO {
            return invalid("rounding_granularity must be > 0".into());
        }
        if self.minimum_order_price < Decimal::ZERO || self.material_rate_per_mm2 < Decimal::ZERO {
            return invalid("monetary constants must be non-negative".into());
        }
        let mut prev: Option<&DiscountTier> = None;
        for tier in &self.quantity_tiers {
            if tier.rate < Decimal::ZERO || tier.rate >= Decimal::ONE {
                return invalid(format!("tier rate {} outside [0,1)", tier.rate));
            }
            if let Some(p) = prev {
                if tier.min_quantity <= p.min_quantity || tier.rate < p.rate {
                    return invalid("quantity tiers must ascend with non-decreasing rates".into());
                }
            }
            prev = Some(tier);
        }
        let mut prev_rate = Decimal::ZERO;
        for (&columns, &rate) in &self.columns.discount_rates {
            if columns < 2 {
                return invalid(format!("column discount defined for {columns} columns"));
            }
            if rate <= prev_rate || rate >= Decimal::ONE {
                return invalid("column discount rates must strictly increase within (0,1)".into());
            }
            prev_rate = rate;
        }
        if self.roll.warning_ratio <= Decimal::ZERO || self.roll.warning_ratio > Decimal::ONE {
            return invalid("roll warning_ratio must be in (0,1]".into());
        }
        if self.roll.max_roll_weight_g <= Decimal::ZERO {
            return invalid("max_roll_weight_g must be > 0".into());
        }
        if self.film.secured_step_meters == 0
            || self.sku_split.quantity_step == 0
            || self.economic.lot_size == 0
        {
            return invalid("step sizes must be > 0".into());
        }
        Ok(())
    }

    /// Quantity-discount rate; a quantity exactly on a threshold takes that tier.
    pub fn discount_rate(&self, quantity: u64) -> Decimal {
        self.quantity_tiers
            .iter()
            .rev()
            .find(|t| quantity >= t.min_quantity)
            .map(|t| t.rate)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn column_discount_rate(&self, columns: u32) -> Option<Decimal> {
        self.columns.discount_rates.get(&columns).copied()
    }

    /// Largest column count with a defined discount.
    pub fn max_column_count(&self) -> u32 {
        self.columns
            .discount_rates
            .keys()
            .next_back()
            .copied()
            .unwrap_or(1)
    }

    /// Per-SKU quantity floor for a product type and SKU count.
    pub fn min_quantity_per_sku(&self, bag_type: BagType, sku_count: usize) -> u64 {
        if bag_type.is_roll_film() {
            if sku_count <= 1 {
                self.quantities.roll_min_single_sku
            } else {
                self.quantities.roll_min_multi_sku
            }
        } else {
            self.quantities.unit_min_per_sku
        }
    }

    /// Round half away from zero to the currency granularity.
    pub fn round_to_granularity(&self, amount: Decimal) -> Decimal {
        let g = self.rounding_granularity;
        (amount / g).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * g
    }
}
