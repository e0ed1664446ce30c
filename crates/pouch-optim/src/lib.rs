#![deny(warnings)]

//! Production optimisation: cheaper equivalents of a priced order.
//!
//! - Economic order quantity from the film actually secured for the job
//! - Multi-column (parallel lane) production bounded by printable width
//! - Splitting a fixed total into several SKUs above the per-SKU floor

pub mod column;
pub mod economic;
pub mod sku_split;

pub use column::calculate_column_production_options;
pub use economic::{suggest_economic_quantity, SuggestionOptions};
pub use sku_split::{calculate_sku_split_options, calculate_sku_split_options_for};
