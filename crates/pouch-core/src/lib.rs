#![deny(warnings)]

//! Core domain models and invariants for the pouch quoting engine.
//!
//! This crate defines the serializable request/result types shared by the
//! calculators, the error taxonomy, the read-only catalog and the pricing
//! policy, plus validation helpers that guard every public entry point.

pub mod catalog;
pub mod error;
pub mod policy;

pub use catalog::{BagTypeSpec, Catalog, MaterialSpec};
pub use error::{CatalogGapError, EngineError, ValidationError};
pub use policy::PricingPolicy;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product form. Determines pitch, setup family and quantity floors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BagType {
    /// Three-side-seal flat pouch.
    #[serde(rename = "flat_3_side")]
    FlatThreeSide,
    /// Flat pouch with a reclosable zipper.
    FlatWithZipper,
    StandUp,
    StandUpZipper,
    /// Flat-bottom box pouch.
    Box,
    /// Side-gusset (M-shape) pouch.
    MShape,
    /// Centre-seal (T-shape) pouch.
    TShape,
    Spout,
    /// Film sold by the metre on rolls.
    RollFilm,
}

/// How the repeating length of one piece along the web is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PitchRule {
    Height,
    DepthPlusWidth,
    Width,
    /// One unit is one metre of web.
    Metre,
}

impl BagType {
    pub const ALL: [BagType; 9] = [
        BagType::FlatThreeSide,
        BagType::FlatWithZipper,
        BagType::StandUp,
        BagType::StandUpZipper,
        BagType::Box,
        BagType::MShape,
        BagType::TShape,
        BagType::Spout,
        BagType::RollFilm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BagType::FlatThreeSide => "flat_3_side",
            BagType::FlatWithZipper => "flat_with_zipper",
            BagType::StandUp => "stand_up",
            BagType::StandUpZipper => "stand_up_zipper",
            BagType::Box => "box",
            BagType::MShape => "m_shape",
            BagType::TShape => "t_shape",
            BagType::Spout => "spout",
            BagType::RollFilm => "roll_film",
        }
    }

    pub fn is_roll_film(self) -> bool {
        self == BagType::RollFilm
    }

    /// Flat family: lower setup and small-lot surcharge.
    pub fn is_flat_family(self) -> bool {
        matches!(self, BagType::FlatThreeSide | BagType::FlatWithZipper)
    }

    pub fn pitch_rule(self) -> PitchRule {
        match self {
            BagType::FlatThreeSide | BagType::FlatWithZipper => PitchRule::Height,
            BagType::Box | BagType::MShape => PitchRule::DepthPlusWidth,
            BagType::RollFilm => PitchRule::Metre,
            BagType::StandUp | BagType::StandUpZipper | BagType::TShape | BagType::Spout => {
                PitchRule::Width
            }
        }
    }
}

/// Laminate family; each family has its own thickness-band multipliers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialFamily {
    Aluminum,
    VaporDeposited,
    Transparent,
    Paper,
}

/// Thickness selection offered per material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThicknessBand {
    Light,
    Medium,
    Heavy,
    Ultra,
}

impl ThicknessBand {
    pub fn as_str(self) -> &'static str {
        match self {
            ThicknessBand::Light => "light",
            ThicknessBand::Medium => "medium",
            ThicknessBand::Heavy => "heavy",
            ThicknessBand::Ultra => "ultra",
        }
    }
}

/// Piece dimensions in millimetres. For roll film `width_mm` is the web
/// width and height/depth are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width_mm: u32,
    #[serde(default)]
    pub height_mm: u32,
    #[serde(default)]
    pub depth_mm: u32,
}

/// One layer of a laminate. Layer order does not affect weight.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilmStructureLayer {
    pub material_id: String,
    pub thickness_um: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintingKind {
    None,
    #[default]
    Digital,
    Gravure,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrintingSpec {
    #[serde(default)]
    pub kind: PrintingKind,
    #[serde(default = "default_colors")]
    pub colors: u8,
    #[serde(default)]
    pub double_sided: bool,
}

fn default_colors() -> u8 {
    1
}

impl Default for PrintingSpec {
    fn default() -> Self {
        Self {
            kind: PrintingKind::Digital,
            colors: 1,
            double_sided: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryLocation {
    #[default]
    Domestic,
    International,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Standard,
    Express,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliverySpec {
    #[serde(default)]
    pub location: DeliveryLocation,
    #[serde(default)]
    pub urgency: Urgency,
}

/// Either one quantity, or one quantity per SKU (design variant).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum QuantitySpec {
    Single { quantity: u64 },
    Skus { sku_count: usize, quantities: Vec<u64> },
}

impl QuantitySpec {
    /// Total pieces (or metres) across all SKUs. A sum that does not fit in
    /// `u64` is reported as above any maximum.
    pub fn total(&self) -> Result<u64, ValidationError> {
        match self {
            QuantitySpec::Single { quantity } => Ok(*quantity),
            QuantitySpec::Skus { quantities, .. } => quantities
                .iter()
                .try_fold(0u64, |acc, &q| acc.checked_add(q))
                .ok_or(ValidationError::QuantityAboveMaximum {
                    max: u64::MAX,
                    actual: u64::MAX,
                }),
        }
    }

    pub fn sku_count(&self) -> usize {
        match self {
            QuantitySpec::Single { .. } => 1,
            QuantitySpec::Skus { sku_count, .. } => *sku_count,
        }
    }

    pub fn is_sku_mode(&self) -> bool {
        matches!(self, QuantitySpec::Skus { .. })
    }

    /// Per-SKU quantities; a single quantity is one SKU.
    pub fn per_sku(&self) -> Vec<u64> {
        match self {
            QuantitySpec::Single { quantity } => vec![*quantity],
            QuantitySpec::Skus { quantities, .. } => quantities.clone(),
        }
    }
}

/// Roll-film specifics. Quantity is then the total length in metres.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollFilmSpec {
    #[serde(default = "default_roll_count")]
    pub roll_count: u32,
    /// Overrides the laminate stack derived from material and thickness.
    #[serde(default)]
    pub film_layers: Option<Vec<FilmStructureLayer>>,
}

fn default_roll_count() -> u32 {
    1
}

impl Default for RollFilmSpec {
    fn default() -> Self {
        Self {
            roll_count: 1,
            film_layers: None,
        }
    }
}

/// Everything the wizard collects for one quotation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub bag_type: BagType,
    pub material_id: String,
    pub thickness: ThicknessBand,
    pub dimensions: Dimensions,
    pub quantity: QuantitySpec,
    #[serde(default)]
    pub printing: PrintingSpec,
    #[serde(default)]
    pub post_processing: Vec<String>,
    #[serde(default)]
    pub delivery: DeliverySpec,
    #[serde(default)]
    pub roll_film: Option<RollFilmSpec>,
    /// Date the quote is issued; drives `valid_until`. The engine never
    /// reads a clock.
    #[serde(default)]
    pub quote_date: Option<NaiveDate>,
}

impl QuoteRequest {
    /// Laminate stack used for weight: explicit roll-film layers win over
    /// the catalog stack.
    pub fn film_layers<'a>(
        &'a self,
        catalog: &'a Catalog,
    ) -> Result<&'a [FilmStructureLayer], CatalogGapError> {
        match self.roll_film.as_ref().and_then(|r| r.film_layers.as_deref()) {
            Some(layers) => Ok(layers),
            None => catalog.film_stack(&self.material_id, self.thickness),
        }
    }

    pub fn roll_count(&self) -> u32 {
        self.roll_film.as_ref().map(|r| r.roll_count).unwrap_or(1)
    }
}

/// Line-item cost breakdown. All lines are non-negative multiples of the
/// rounding granularity and `total = subtotal - discount + delivery`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub material: Decimal,
    pub processing: Decimal,
    pub printing: Decimal,
    pub setup: Decimal,
    /// Top-up that lifts the net price to the order floor.
    pub minimum_charge: Decimal,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery: Decimal,
    pub total: Decimal,
}

impl CostBreakdown {
    /// Whether the breakdown satisfies its arithmetic invariants.
    pub fn is_consistent(&self) -> bool {
        let lines = [
            self.material,
            self.processing,
            self.printing,
            self.setup,
            self.minimum_charge,
        ];
        let sum: Decimal = lines.iter().copied().sum();
        let non_negative = lines
            .iter()
            .chain([&self.discount, &self.delivery, &self.total])
            .all(|v| *v >= Decimal::ZERO);
        non_negative
            && sum == self.subtotal
            && self.total == self.subtotal - self.discount + self.delivery
    }
}

/// One SKU's share of the quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuCost {
    pub index: usize,
    pub quantity: u64,
    /// Allocated amount; the amounts of all SKUs sum to the quote total.
    pub amount: Decimal,
    pub theoretical_meters: Decimal,
    pub secured_meters: u64,
}

/// Film consumption for the job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmUsage {
    pub pitch_mm: u32,
    pub pouches_per_meter: Decimal,
    pub theoretical_meters: Decimal,
    /// Sum of per-SKU secured metres (excludes loss).
    pub secured_meters: u64,
    pub loss_meters: u64,
    pub total_meters: u64,
}

/// A production option the caller has chosen to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppliedOption {
    Column { column_count: u32 },
    SkuSplit { sku_count: usize },
}

/// Priced quotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    /// `total_price / quantity`, for display.
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub quantity: u64,
    pub breakdown: CostBreakdown,
    pub discount_rate: Decimal,
    pub minimum_order_quantity: u64,
    pub minimum_price_applied: bool,
    pub lead_time_days: u32,
    pub thickness_multiplier: Decimal,
    pub post_processing_multiplier: Decimal,
    pub film_usage: FilmUsage,
    pub sku_costs: Option<Vec<SkuCost>>,
    pub applied_option: Option<AppliedOption>,
    /// Baseline prices when a production option was applied.
    pub original_unit_price: Option<Decimal>,
    pub original_total_price: Option<Decimal>,
    pub valid_until: Option<NaiveDate>,
}

/// Parallel (multi-lane) production alternative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProductionOption {
    pub column_count: u32,
    /// Lane width; always the customer's requested width.
    pub column_width_mm: u32,
    /// Requested quantity times column count.
    pub total_quantity: u64,
    pub discount_rate: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    /// Column count times the baseline total, for comparison.
    pub baseline_total_price: Decimal,
    /// Discount rate as a percentage.
    pub savings_rate: Decimal,
}

/// One way to spread a fixed total over N SKUs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuSplitOption {
    pub sku_count: usize,
    pub quantities: Vec<u64>,
    pub min_quantity_per_sku: u64,
    /// All SKUs received the same quantity.
    pub is_even: bool,
}

/// One evaluated candidate in the economic-quantity search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityCandidate {
    pub label: String,
    pub quantity: u64,
    pub film_usage_meters: u64,
    pub unit_cost: Decimal,
    /// `(quantity - requested) / quantity`.
    pub overrun_rate: Decimal,
}

/// Economic order quantity proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomicQuantitySuggestion {
    pub order_quantity: u64,
    pub minimum_order_quantity: u64,
    pub minimum_film_usage: u64,
    pub pouches_per_meter: Decimal,
    pub economic_quantity: u64,
    pub economic_film_usage: u64,
    /// Percent gain in pieces per metre at the economic quantity.
    pub efficiency_improvement: Decimal,
    pub unit_cost_at_order_qty: Decimal,
    pub unit_cost_at_economic_qty: Decimal,
    pub cost_savings: Decimal,
    /// Percent.
    pub cost_savings_rate: Decimal,
    pub recommended_quantity: u64,
    pub recommendation_reason: String,
    pub candidates: Vec<QuantityCandidate>,
    pub column_options: Vec<ColumnProductionOption>,
}

/// Direction of unit prices across a quantity comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Decreasing,
    Stable,
    Increasing,
}

/// One priced quantity in a comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityQuote {
    pub quantity: u64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub discount_rate: Decimal,
    /// What the same pieces would cost at the smallest quantity's unit
    /// price, minus what they cost here.
    pub savings_vs_smallest: Decimal,
    /// Cost here as a percentage of cost at the smallest quantity's unit
    /// price.
    pub cost_ratio: Decimal,
}

/// The same specification priced at several quantities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityComparison {
    /// Ascending by quantity, without duplicates.
    pub quotes: Vec<QuantityQuote>,
    /// Lowest unit price; the smaller quantity wins ties.
    pub best_value_quantity: u64,
    /// Spread between the highest and lowest unit price, in percent of the
    /// highest.
    pub unit_price_spread: Decimal,
    /// Middle quantity, for buyers trading price against stock.
    pub balanced_quantity: u64,
    pub price_trend: PriceTrend,
}

/// Weight of a roll for a given width, length and laminate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollWeightResult {
    pub total_weight_g: Decimal,
    /// Grams per metre of web.
    pub weight_per_meter_g: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollPlan {
    pub index: usize,
    pub length_m: u64,
    pub weight_g: Decimal,
}

/// Non-fatal notice for a roll close to the weight limit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollWeightWarning {
    pub roll_index: usize,
    pub weight_g: Decimal,
    /// Weight as a fraction of the limit.
    pub load_ratio: Decimal,
}

/// Successful roll-film validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollFilmValidation {
    pub rolls: Vec<RollPlan>,
    pub warnings: Vec<RollWeightWarning>,
}

/// Validate dimensions against the policy bounds.
pub fn validate_dimensions(
    bag_type: BagType,
    d: &Dimensions,
    policy: &PricingPolicy,
) -> Result<(), ValidationError> {
    let limits = &policy.dimensions;
    if d.width_mm < limits.min_width_mm {
        return Err(ValidationError::WidthTooSmall {
            min: limits.min_width_mm,
            actual: d.width_mm,
        });
    }
    if d.width_mm > limits.max_dimension_mm {
        return Err(ValidationError::DimensionTooLarge {
            dimension: "width",
            max: limits.max_dimension_mm,
            actual: d.width_mm,
        });
    }
    if bag_type.is_roll_film() {
        return Ok(());
    }
    if d.height_mm < limits.min_height_mm {
        return Err(ValidationError::HeightTooSmall {
            min: limits.min_height_mm,
            actual: d.height_mm,
        });
    }
    for (name, value) in [("height", d.height_mm), ("depth", d.depth_mm)] {
        if value > limits.max_dimension_mm {
            return Err(ValidationError::DimensionTooLarge {
                dimension: name,
                max: limits.max_dimension_mm,
                actual: value,
            });
        }
    }
    Ok(())
}

/// Validate order and per-SKU quantities.
pub fn validate_quantity(
    bag_type: BagType,
    q: &QuantitySpec,
    policy: &PricingPolicy,
) -> Result<(), ValidationError> {
    if let QuantitySpec::Skus {
        sku_count,
        quantities,
    } = q
    {
        if *sku_count == 0 || quantities.len() != *sku_count {
            return Err(ValidationError::SkuCountMismatch {
                declared: *sku_count,
                actual: quantities.len(),
            });
        }
    }
    let max = policy.quantities.max_order_quantity;
    let floor = policy.min_quantity_per_sku(bag_type, q.sku_count());
    let mut total = 0u64;
    for (index, &quantity) in q.per_sku().iter().enumerate() {
        if quantity > max {
            return Err(ValidationError::QuantityAboveMaximum {
                max,
                actual: quantity,
            });
        }
        total = total
            .checked_add(quantity)
            .ok_or(ValidationError::QuantityAboveMaximum {
                max,
                actual: u64::MAX,
            })?;
        if quantity < floor {
            return Err(if q.is_sku_mode() {
                ValidationError::SkuQuantityBelowMinimum {
                    index,
                    min: floor,
                    actual: quantity,
                }
            } else {
                ValidationError::QuantityBelowMinimum {
                    min: floor,
                    actual: quantity,
                }
            });
        }
    }
    if total > max {
        return Err(ValidationError::QuantityAboveMaximum { max, actual: total });
    }
    Ok(())
}

/// Validate a full request, including catalog references.
pub fn validate_request(
    req: &QuoteRequest,
    catalog: &Catalog,
    policy: &PricingPolicy,
) -> Result<(), EngineError> {
    validate_dimensions(req.bag_type, &req.dimensions, policy)?;
    validate_quantity(req.bag_type, &req.quantity, policy)?;
    catalog.thickness_multiplier(&req.material_id, req.thickness)?;
    catalog.processing_per_unit(req.bag_type)?;
    for id in &req.post_processing {
        catalog.post_processing_multiplier(id)?;
    }
    if req.bag_type.is_roll_film() && req.roll_count() == 0 {
        return Err(ValidationError::ZeroRollCount.into());
    }
    let layers = req.film_layers(catalog)?;
    if layers.is_empty() {
        return Err(ValidationError::EmptyFilmStructure.into());
    }
    for layer in layers {
        catalog.density(&layer.material_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn request(bag_type: BagType, quantity: QuantitySpec) -> QuoteRequest {
        QuoteRequest {
            bag_type,
            material_id: "pet_al".to_string(),
            thickness: ThicknessBand::Medium,
            dimensions: Dimensions {
                width_mm: 200,
                height_mm: 300,
                depth_mm: 0,
            },
            quantity,
            printing: PrintingSpec::default(),
            post_processing: vec![],
            delivery: DeliverySpec::default(),
            roll_film: None,
            quote_date: None,
        }
    }

    #[test]
    fn serde_roundtrip_request() {
        let req = request(
            BagType::FlatThreeSide,
            QuantitySpec::Skus {
                sku_count: 2,
                quantities: vec![500, 700],
            },
        );
        let s = serde_json::to_string(&req).unwrap();
        assert!(s.contains("\"flat_3_side\""));
        assert!(s.contains("\"mode\":\"skus\""));
        let back: QuoteRequest = serde_json::from_str(&s).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let text = r#"{
            "bag_type": "stand_up",
            "material_id": "pet_al",
            "thickness": "medium",
            "dimensions": { "width_mm": 120 },
            "quantity": { "mode": "single", "quantity": 1000 }
        }"#;
        let req: QuoteRequest = serde_json::from_str(text).unwrap();
        assert_eq!(req.printing, PrintingSpec::default());
        assert_eq!(req.dimensions.height_mm, 0);
        assert_eq!(req.roll_count(), 1);
    }

    #[test]
    fn pitch_rules_by_family() {
        assert_eq!(BagType::FlatWithZipper.pitch_rule(), PitchRule::Height);
        assert_eq!(BagType::MShape.pitch_rule(), PitchRule::DepthPlusWidth);
        assert_eq!(BagType::Spout.pitch_rule(), PitchRule::Width);
        assert_eq!(BagType::RollFilm.pitch_rule(), PitchRule::Metre);
    }

    #[test]
    fn width_below_minimum_is_rejected() {
        let mut req = request(BagType::StandUp, QuantitySpec::Single { quantity: 1000 });
        req.dimensions.width_mm = 49;
        let err = validate_request(&req, Catalog::standard(), PricingPolicy::standard()).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::WidthTooSmall { min: 50, actual: 49 })
        );
    }

    #[test]
    fn roll_film_ignores_height() {
        let mut req = request(BagType::RollFilm, QuantitySpec::Single { quantity: 1000 });
        req.dimensions.height_mm = 0;
        validate_request(&req, Catalog::standard(), PricingPolicy::standard()).unwrap();
    }

    #[test]
    fn sku_list_must_match_declared_count() {
        let q = QuantitySpec::Skus {
            sku_count: 3,
            quantities: vec![1000, 1000],
        };
        assert_eq!(
            validate_quantity(BagType::StandUp, &q, PricingPolicy::standard()),
            Err(ValidationError::SkuCountMismatch {
                declared: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn sku_floor_depends_on_roll_film_and_count() {
        let p = PricingPolicy::standard();
        let multi = QuantitySpec::Skus {
            sku_count: 2,
            quantities: vec![300, 400],
        };
        assert!(validate_quantity(BagType::RollFilm, &multi, p).is_ok());
        assert_eq!(
            validate_quantity(BagType::StandUp, &multi, p),
            Err(ValidationError::SkuQuantityBelowMinimum {
                index: 0,
                min: 500,
                actual: 300
            })
        );
        let single = QuantitySpec::Single { quantity: 400 };
        assert_eq!(
            validate_quantity(BagType::RollFilm, &single, p),
            Err(ValidationError::QuantityBelowMinimum { min: 500, actual: 400 })
        );
    }

    #[test]
    fn oversized_sku_quantities_are_rejected_before_summing() {
        let p = PricingPolicy::standard();
        let huge = QuantitySpec::Skus {
            sku_count: 2,
            quantities: vec![u64::MAX - 498, 1500],
        };
        assert!(huge.total().is_err());
        assert_eq!(
            validate_quantity(BagType::StandUp, &huge, p),
            Err(ValidationError::QuantityAboveMaximum {
                max: 1_000_000,
                actual: u64::MAX - 498
            })
        );
        let split_over = QuantitySpec::Skus {
            sku_count: 2,
            quantities: vec![600_000, 600_000],
        };
        assert_eq!(split_over.total(), Ok(1_200_000));
        assert_eq!(
            validate_quantity(BagType::StandUp, &split_over, p),
            Err(ValidationError::QuantityAboveMaximum {
                max: 1_000_000,
                actual: 1_200_000
            })
        );
    }

    #[test]
    fn unknown_post_processing_is_a_catalog_gap() {
        let mut req = request(BagType::StandUp, QuantitySpec::Single { quantity: 1000 });
        req.post_processing = vec!["gold-foil".into()];
        let err = validate_request(&req, Catalog::standard(), PricingPolicy::standard()).unwrap_err();
        assert_eq!(err.kind(), "catalog_gap_error");
    }

    #[test]
    fn empty_explicit_layers_are_rejected() {
        let mut req = request(BagType::RollFilm, QuantitySpec::Single { quantity: 1000 });
        req.roll_film = Some(RollFilmSpec {
            roll_count: 1,
            film_layers: Some(vec![]),
        });
        assert_eq!(
            validate_request(&req, Catalog::standard(), PricingPolicy::standard()),
            Err(EngineError::Validation(ValidationError::EmptyFilmStructure))
        );
    }

    #[test]
    fn breakdown_consistency_check() {
        let b = CostBreakdown {
            material: Decimal::new(100_000, 0),
            processing: Decimal::new(20_000, 0),
            printing: Decimal::new(10_000, 0),
            setup: Decimal::new(30_000, 0),
            minimum_charge: Decimal::ZERO,
            subtotal: Decimal::new(160_000, 0),
            discount: Decimal::new(16_000, 0),
            delivery: Decimal::new(1_600, 0),
            total: Decimal::new(145_600, 0),
        };
        assert!(b.is_consistent());
        let broken = CostBreakdown {
            total: Decimal::new(145_700, 0),
            ..b
        };
        assert!(!broken.is_consistent());
    }

    proptest! {
        #[test]
        fn sku_total_is_sum(qs in proptest::collection::vec(500u64..50_000, 1..12)) {
            let q = QuantitySpec::Skus { sku_count: qs.len(), quantities: qs.clone() };
            prop_assert_eq!(q.total(), Ok(qs.iter().sum::<u64>()));
            prop_assert!(validate_quantity(BagType::Box, &q, PricingPolicy::standard()).is_ok());
        }

        #[test]
        fn valid_dimensions_pass(w in 50u32..=1000, h in 50u32..=1000, d in 0u32..=1000) {
            let dims = Dimensions { width_mm: w, height_mm: h, depth_mm: d };
            prop_assert!(validate_dimensions(BagType::StandUp, &dims, PricingPolicy::standard()).is_ok());
        }
    }
}
