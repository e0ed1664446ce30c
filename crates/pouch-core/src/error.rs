//! Error taxonomy shared by every engine crate.
//!
//! Nothing in the engine panics on bad input: each public operation returns
//! either a value or one of the kinds below, and the caller decides how to
//! present it.

use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed or out-of-range input. Always recoverable by re-prompting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Width below the product minimum.
    #[error("width {actual}mm is below the minimum of {min}mm")]
    WidthTooSmall { min: u32, actual: u32 },
    /// Height below the product minimum.
    #[error("height {actual}mm is below the minimum of {min}mm")]
    HeightTooSmall { min: u32, actual: u32 },
    /// A dimension exceeds the largest producible size.
    #[error("{dimension} {actual}mm exceeds the maximum of {max}mm")]
    DimensionTooLarge {
        dimension: &'static str,
        max: u32,
        actual: u32,
    },
    /// Order quantity below the product-type minimum.
    #[error("quantity {actual} is below the minimum of {min}")]
    QuantityBelowMinimum { min: u64, actual: u64 },
    /// Order quantity above the largest accepted order.
    #[error("quantity {actual} exceeds the maximum of {max}")]
    QuantityAboveMaximum { max: u64, actual: u64 },
    /// Declared SKU count disagrees with the quantity list.
    #[error("declared {declared} SKUs but {actual} quantities were given")]
    SkuCountMismatch { declared: usize, actual: usize },
    /// One SKU quantity below the per-SKU floor.
    #[error("SKU {index} quantity {actual} is below the per-SKU minimum of {min}")]
    SkuQuantityBelowMinimum { index: usize, min: u64, actual: u64 },
    /// Pitch resolved to zero, so pieces cannot be converted to metres.
    #[error("pitch must be > 0mm")]
    NonPositivePitch,
    /// Roll count of zero.
    #[error("roll count must be >= 1")]
    ZeroRollCount,
    /// More rolls than metres of film, so some rolls would be empty.
    #[error("{roll_count} rolls cannot share {length_m}m of film")]
    RollCountExceedsLength { roll_count: u32, length_m: u64 },
    /// Roll length or film width of zero.
    #[error("{0} must be > 0")]
    ZeroExtent(&'static str),
    /// Film structure without layers.
    #[error("film structure must contain at least one layer")]
    EmptyFilmStructure,
    /// Unit price must be strictly positive.
    #[error("unit price must be > 0, got {0}")]
    NonPositivePrice(Decimal),
    /// A quantity comparison needs at least one quantity.
    #[error("no quantities to compare")]
    NoQuantities,
    /// Unit price too large to price the order.
    #[error("unit price {0} is out of range")]
    PriceOutOfRange(Decimal),
    /// The requested production option cannot be produced for this order.
    #[error("production option not feasible: {0}")]
    OptionNotFeasible(String),
    /// Policy or catalog tables violate their invariants.
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}

/// A referenced id has no catalog entry. Fails closed: a silent default
/// would misprice a real order.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogGapError {
    #[error("unknown material: {0}")]
    UnknownMaterial(String),
    #[error("material {material} has no '{band}' thickness band")]
    UnknownThickness { material: String, band: String },
    #[error("unknown post-processing option: {0}")]
    UnknownPostProcessing(String),
    #[error("no density for film material: {0}")]
    UnknownFilmMaterial(String),
    #[error("no processing rate for bag type: {0}")]
    UnknownBagType(String),
}

/// Umbrella error returned by the public engine operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    CatalogGap(#[from] CatalogGapError),
    /// A single roll is heavier than the handling limit.
    #[error("roll {roll_index} weighs {weight_g}g, above the {limit_g}g limit")]
    WeightLimitExceeded {
        roll_index: usize,
        weight_g: Decimal,
        limit_g: Decimal,
    },
}

impl EngineError {
    /// Stable machine-readable kind, for callers that map errors to UI states.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation_error",
            EngineError::CatalogGap(_) => "catalog_gap_error",
            EngineError::WeightLimitExceeded { .. } => "weight_limit_exceeded",
        }
    }
}
