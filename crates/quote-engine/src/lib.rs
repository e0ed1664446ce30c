#![deny(warnings)]

//! Quote orchestration: the single entry point the wizard calls.
//!
//! A [`QuoteEngine`] borrows a catalog and a policy and is otherwise
//! stateless: identical requests always yield identical results. The
//! applied production option is an explicit argument and the baseline is
//! recomputed on every call, so a caller can always revert to it.

mod applied;
mod compare;

pub use pouch_core::{
    AppliedOption, Catalog, ColumnProductionOption, EconomicQuantitySuggestion, EngineError,
    FilmStructureLayer, PriceTrend, PricingPolicy, QuantityComparison, QuantityQuote,
    QuoteRequest, QuoteResult, RollFilmValidation, RollWeightResult, SkuSplitOption,
    ValidationError,
};
pub use pouch_optim::SuggestionOptions;

use pouch_core::{validate_request, BagType, Dimensions, QuantitySpec};
use pouch_econ::CostCalculator;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Quoting engine over one catalog and pricing policy.
#[derive(Clone, Copy, Debug)]
pub struct QuoteEngine<'a> {
    catalog: &'a Catalog,
    policy: &'a PricingPolicy,
}

impl QuoteEngine<'static> {
    /// Engine over the shared standard catalog and policy.
    pub fn standard() -> Self {
        Self::new(Catalog::standard(), PricingPolicy::standard())
    }
}

impl<'a> QuoteEngine<'a> {
    pub fn new(catalog: &'a Catalog, policy: &'a PricingPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn policy(&self) -> &'a PricingPolicy {
        self.policy
    }

    /// Baseline quote for a request.
    pub fn calculate_quote(&self, req: &QuoteRequest) -> Result<QuoteResult, EngineError> {
        self.calculate_quote_with_option(req, None)
    }

    /// Quote with an optional production option applied on top of the
    /// freshly computed baseline.
    pub fn calculate_quote_with_option(
        &self,
        req: &QuoteRequest,
        applied: Option<AppliedOption>,
    ) -> Result<QuoteResult, EngineError> {
        let baseline = self.baseline(req)?;
        let Some(option) = applied else {
            return Ok(baseline);
        };
        info!(?option, baseline_total = %baseline.total_price, "applying production option");
        match option {
            AppliedOption::Column { column_count } => {
                let options = self.column_options_for(req, &baseline)?;
                let chosen = options
                    .iter()
                    .find(|o| o.column_count == column_count)
                    .ok_or_else(|| {
                        ValidationError::OptionNotFeasible(format!(
                            "{column_count}-column production"
                        ))
                    })?;
                Ok(applied::apply_column(req, &baseline, chosen, self.policy))
            }
            AppliedOption::SkuSplit { sku_count } => {
                let mut split_req = req.clone();
                split_req.quantity =
                    self.split_quantity(req.quantity.total()?, req.bag_type, sku_count)?;
                let quoted = self.baseline(&split_req)?;
                Ok(applied::mark_sku_split(quoted, &baseline, sku_count))
            }
        }
    }

    /// Price the request's specification at each of `quantities`.
    ///
    /// Quantities are sorted and deduplicated. A SKU-mode request keeps its
    /// SKU count, each quantity spread the way a SKU split would spread it.
    pub fn compare_quantities(
        &self,
        req: &QuoteRequest,
        quantities: &[u64],
    ) -> Result<QuantityComparison, EngineError> {
        let mut sorted = quantities.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.is_empty() {
            return Err(ValidationError::NoQuantities.into());
        }
        let sku_count = req.quantity.sku_count();
        let quotes = sorted
            .into_iter()
            .map(|q| {
                let mut r = req.clone();
                r.quantity = if req.quantity.is_sku_mode() {
                    self.split_quantity(q, req.bag_type, sku_count)?
                } else {
                    QuantitySpec::Single { quantity: q }
                };
                self.baseline(&r)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let comparison = compare::summarize(&quotes)?;
        info!(
            quantities = comparison.quotes.len(),
            best = comparison.best_value_quantity,
            "compared quantities"
        );
        Ok(comparison)
    }

    fn split_quantity(
        &self,
        total: u64,
        bag_type: BagType,
        sku_count: usize,
    ) -> Result<QuantitySpec, ValidationError> {
        let split = pouch_optim::calculate_sku_split_options_for(total, bag_type, self.policy)
            .into_iter()
            .find(|s| s.sku_count == sku_count)
            .ok_or_else(|| {
                ValidationError::OptionNotFeasible(format!("{total} split into {sku_count} SKUs"))
            })?;
        Ok(QuantitySpec::Skus {
            sku_count,
            quantities: split.quantities,
        })
    }

    fn baseline(&self, req: &QuoteRequest) -> Result<QuoteResult, EngineError> {
        validate_request(req, self.catalog, self.policy)?;
        if req.bag_type.is_roll_film() {
            let layers = req.film_layers(self.catalog)?;
            let plan = film_geometry::validate_roll_film_params(
                req.quantity.total()?,
                req.roll_count(),
                req.dimensions.width_mm,
                layers,
                self.catalog,
                self.policy,
            )?;
            debug!(rolls = plan.rolls.len(), warnings = plan.warnings.len(), "roll plan");
        }
        CostCalculator::new(self.catalog, self.policy).quote(req)
    }

    fn column_options_for(
        &self,
        req: &QuoteRequest,
        baseline: &QuoteResult,
    ) -> Result<Vec<ColumnProductionOption>, EngineError> {
        let exact_unit = baseline.total_price / Decimal::from(baseline.quantity);
        Ok(pouch_optim::calculate_column_production_options(
            baseline.quantity,
            exact_unit,
            req.bag_type,
            &req.dimensions,
            self.policy,
        )?)
    }

    /// Column options for a request, priced from its baseline quote.
    pub fn column_options(
        &self,
        req: &QuoteRequest,
    ) -> Result<Vec<ColumnProductionOption>, EngineError> {
        let baseline = self.baseline(req)?;
        self.column_options_for(req, &baseline)
    }

    /// Economic quantity for a request, using the baseline's film usage and
    /// exact unit price.
    pub fn economic_suggestion(
        &self,
        req: &QuoteRequest,
        options: &SuggestionOptions,
    ) -> Result<EconomicQuantitySuggestion, EngineError> {
        let baseline = self.baseline(req)?;
        let options = SuggestionOptions {
            sku_count: req.quantity.sku_count(),
            ..options.clone()
        };
        self.suggest_economic_quantity(
            baseline.quantity,
            &req.dimensions,
            req.bag_type,
            Some(baseline.film_usage.total_meters),
            baseline.total_price / Decimal::from(baseline.quantity),
            &options,
        )
    }

    pub fn suggest_economic_quantity(
        &self,
        quantity: u64,
        dimensions: &Dimensions,
        bag_type: BagType,
        film_usage: Option<u64>,
        unit_price: Decimal,
        options: &SuggestionOptions,
    ) -> Result<EconomicQuantitySuggestion, EngineError> {
        Ok(pouch_optim::suggest_economic_quantity(
            quantity,
            dimensions,
            bag_type,
            film_usage,
            unit_price,
            options,
            self.policy,
        )?)
    }

    pub fn calculate_column_production_options(
        &self,
        total_quantity: u64,
        unit_price: Decimal,
        bag_type: BagType,
        dimensions: &Dimensions,
    ) -> Result<Vec<ColumnProductionOption>, EngineError> {
        Ok(pouch_optim::calculate_column_production_options(
            total_quantity,
            unit_price,
            bag_type,
            dimensions,
            self.policy,
        )?)
    }

    pub fn calculate_sku_split_options(&self, total_quantity: u64) -> Vec<SkuSplitOption> {
        pouch_optim::calculate_sku_split_options(total_quantity, self.policy)
    }

    pub fn validate_roll_film_params(
        &self,
        length_m: u64,
        roll_count: u32,
        width_mm: u32,
        layers: &[FilmStructureLayer],
    ) -> Result<RollFilmValidation, EngineError> {
        film_geometry::validate_roll_film_params(
            length_m,
            roll_count,
            width_mm,
            layers,
            self.catalog,
            self.policy,
        )
    }

    pub fn calculate_roll_weight(
        &self,
        width_mm: u32,
        length_m: u64,
        layers: &[FilmStructureLayer],
    ) -> Result<RollWeightResult, EngineError> {
        film_geometry::calculate_roll_weight(width_mm, length_m, layers, self.catalog)
    }

    pub fn minimum_roll_count(
        &self,
        length_m: u64,
        width_mm: u32,
        layers: &[FilmStructureLayer],
    ) -> Result<u32, EngineError> {
        film_geometry::minimum_roll_count(length_m, width_mm, layers, self.catalog, self.policy)
    }
}

/// Baseline quote with the standard catalog and policy.
pub fn calculate_quote(req: &QuoteRequest) -> Result<QuoteResult, EngineError> {
    QuoteEngine::standard().calculate_quote(req)
}

pub fn calculate_quote_with_option(
    req: &QuoteRequest,
    applied: Option<AppliedOption>,
) -> Result<QuoteResult, EngineError> {
    QuoteEngine::standard().calculate_quote_with_option(req, applied)
}

pub fn compare_quantities(
    req: &QuoteRequest,
    quantities: &[u64],
) -> Result<QuantityComparison, EngineError> {
    QuoteEngine::standard().compare_quantities(req, quantities)
}

pub fn suggest_economic_quantity(
    quantity: u64,
    dimensions: &Dimensions,
    bag_type: BagType,
    film_usage: Option<u64>,
    unit_price: Decimal,
    options: &SuggestionOptions,
) -> Result<EconomicQuantitySuggestion, EngineError> {
    QuoteEngine::standard().suggest_economic_quantity(
        quantity, dimensions, bag_type, film_usage, unit_price, options,
    )
}

pub fn calculate_column_production_options(
    total_quantity: u64,
    unit_price: Decimal,
    bag_type: BagType,
    dimensions: &Dimensions,
) -> Result<Vec<ColumnProductionOption>, EngineError> {
    QuoteEngine::standard().calculate_column_production_options(
        total_quantity,
        unit_price,
        bag_type,
        dimensions,
    )
}

pub fn calculate_sku_split_options(total_quantity: u64) -> Vec<SkuSplitOption> {
    QuoteEngine::standard().calculate_sku_split_options(total_quantity)
}

pub fn distribute_length_evenly(
    total_length: u64,
    roll_count: u32,
) -> Result<Vec<u64>, ValidationError> {
    film_geometry::distribute_length_evenly(total_length, roll_count)
}

pub fn validate_roll_film_params(
    length_m: u64,
    roll_count: u32,
    width_mm: u32,
    layers: &[FilmStructureLayer],
) -> Result<RollFilmValidation, EngineError> {
    QuoteEngine::standard().validate_roll_film_params(length_m, roll_count, width_mm, layers)
}

pub fn calculate_roll_weight(
    width_mm: u32,
    length_m: u64,
    layers: &[FilmStructureLayer],
) -> Result<RollWeightResult, EngineError> {
    QuoteEngine::standard().calculate_roll_weight(width_mm, length_m, layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pouch_core::{DeliverySpec, PrintingSpec, RollFilmSpec, ThicknessBand};
    use proptest::prelude::*;

    fn yen(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn pouch(quantity: u64) -> QuoteRequest {
        QuoteRequest {
            bag_type: BagType::FlatThreeSide,
            material_id: "pet_al".into(),
            thickness: ThicknessBand::Medium,
            dimensions: Dimensions {
                width_mm: 200,
                height_mm: 300,
                depth_mm: 0,
            },
            quantity: QuantitySpec::Single { quantity },
            printing: PrintingSpec::default(),
            post_processing: vec![],
            delivery: DeliverySpec::default(),
            roll_film: None,
            quote_date: None,
        }
    }

    fn pet_lldpe() -> Vec<FilmStructureLayer> {
        vec![
            FilmStructureLayer {
                material_id: "PET".into(),
                thickness_um: 12,
            },
            FilmStructureLayer {
                material_id: "LLDPE".into(),
                thickness_um: 80,
            },
        ]
    }

    fn roll(length_m: u64, roll_count: u32) -> QuoteRequest {
        QuoteRequest {
            bag_type: BagType::RollFilm,
            dimensions: Dimensions {
                width_mm: 300,
                height_mm: 0,
                depth_mm: 0,
            },
            quantity: QuantitySpec::Single { quantity: length_m },
            roll_film: Some(RollFilmSpec {
                roll_count,
                film_layers: Some(pet_lldpe()),
            }),
            ..pouch(length_m)
        }
    }

    #[test]
    fn ten_thousand_pieces_get_the_twenty_percent_tier() {
        let big = calculate_quote(&pouch(10_000)).unwrap();
        let small = calculate_quote(&pouch(4000)).unwrap();
        assert_eq!(big.discount_rate, Decimal::new(20, 2));
        assert!(small.discount_rate < big.discount_rate);
        assert!(big.unit_price < small.unit_price);
        assert_eq!(big.total_price, yen(912_000));
    }

    #[test]
    fn tier_threshold_shows_a_jump_not_a_regression() {
        let below = calculate_quote(&pouch(4999)).unwrap();
        let at = calculate_quote(&pouch(5000)).unwrap();
        assert_eq!(below.discount_rate, Decimal::ZERO);
        assert_eq!(at.discount_rate, Decimal::new(10, 2));
        assert!(at.unit_price < below.unit_price);
    }

    #[test]
    fn roll_film_weight_limit_is_enforced() {
        let layers = pet_lldpe();
        let err = validate_roll_film_params(5000, 1, 300, &layers).unwrap_err();
        assert_eq!(err.kind(), "weight_limit_exceeded");
        assert!(validate_roll_film_params(1000, 1, 300, &layers).is_ok());

        let quote_err = calculate_quote(&roll(5000, 1)).unwrap_err();
        assert!(matches!(
            quote_err,
            EngineError::WeightLimitExceeded { roll_index: 0, .. }
        ));
        let q = calculate_quote(&roll(5000, 5)).unwrap();
        // five rolls at 15,400 each, domestic
        assert_eq!(q.breakdown.delivery, yen(77_000));
        assert_eq!(q.film_usage.pitch_mm, 1000);
        assert!(q.breakdown.is_consistent());
        assert_eq!(
            QuoteEngine::standard()
                .minimum_roll_count(5000, 300, &layers)
                .unwrap(),
            5
        );
    }

    #[test]
    fn three_skus_match_single_quantity_and_sum_exactly() {
        let mut skus = pouch(0);
        skus.quantity = QuantitySpec::Skus {
            sku_count: 3,
            quantities: vec![1000, 1000, 1000],
        };
        let split = calculate_quote(&skus).unwrap();
        let single = calculate_quote(&pouch(3000)).unwrap();
        assert_eq!(split.unit_price, single.unit_price);
        let costs = split.sku_costs.as_ref().unwrap();
        assert_eq!(
            costs.iter().map(|c| c.amount).sum::<Decimal>(),
            split.total_price
        );
    }

    #[test]
    fn validation_failures_are_classified() {
        let mut narrow = pouch(1000);
        narrow.dimensions.width_mm = 10;
        assert_eq!(calculate_quote(&narrow).unwrap_err().kind(), "validation_error");

        let few = pouch(100);
        assert_eq!(
            calculate_quote(&few),
            Err(EngineError::Validation(ValidationError::QuantityBelowMinimum {
                min: 500,
                actual: 100
            }))
        );

        let mut mismatch = pouch(0);
        mismatch.quantity = QuantitySpec::Skus {
            sku_count: 2,
            quantities: vec![1000],
        };
        assert_eq!(calculate_quote(&mismatch).unwrap_err().kind(), "validation_error");

        let mut gap = pouch(1000);
        gap.thickness = ThicknessBand::Ultra;
        gap.material_id = "kraft_pe".into();
        assert_eq!(calculate_quote(&gap).unwrap_err().kind(), "catalog_gap_error");
    }

    #[test]
    fn overflowing_sku_quantities_are_rejected() {
        let mut req = pouch(0);
        req.quantity = QuantitySpec::Skus {
            sku_count: 2,
            quantities: vec![u64::MAX - 498, 1500],
        };
        assert!(matches!(
            calculate_quote(&req),
            Err(EngineError::Validation(ValidationError::QuantityAboveMaximum { .. }))
        ));
    }

    #[test]
    fn more_rolls_than_metres_is_rejected() {
        let err = calculate_quote(&roll(500, 1000)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::RollCountExceedsLength {
                roll_count: 1000,
                length_m: 500
            })
        );
    }

    #[test]
    fn listed_column_price_is_the_applied_price() {
        let req = pouch(7777);
        let options = QuoteEngine::standard().column_options(&req).unwrap();
        let two = options.iter().find(|o| o.column_count == 2).unwrap();
        let applied = Some(AppliedOption::Column { column_count: 2 });
        let q = calculate_quote_with_option(&req, applied).unwrap();
        assert_eq!(q.total_price, two.total_price);
        assert_eq!(q.total_price % yen(100), Decimal::ZERO);
        assert!(q.breakdown.is_consistent());
    }

    #[test]
    fn quantity_comparison_ranks_unit_prices() {
        let c = compare_quantities(&pouch(1000), &[10_000, 4000, 5000, 4000]).unwrap();
        assert_eq!(
            c.quotes.iter().map(|q| q.quantity).collect::<Vec<_>>(),
            vec![4000, 5000, 10_000]
        );
        assert_eq!(c.best_value_quantity, 10_000);
        assert_eq!(c.balanced_quantity, 5000);
        assert_eq!(c.price_trend, PriceTrend::Decreasing);

        let smallest = &c.quotes[0];
        assert_eq!(smallest.total_price, yen(480_000));
        assert_eq!(smallest.savings_vs_smallest, Decimal::ZERO);
        assert_eq!(smallest.cost_ratio, Decimal::new(1000, 1));

        // 10,000 at 120.00 would be 1,200,000 against 912,000 quoted.
        let largest = &c.quotes[2];
        assert_eq!(largest.savings_vs_smallest, yen(288_000));
        assert_eq!(largest.cost_ratio, Decimal::new(760, 1));
        assert_eq!(c.unit_price_spread, Decimal::new(240, 1));
    }

    #[test]
    fn quantity_comparison_keeps_sku_count() {
        let mut req = pouch(0);
        req.quantity = QuantitySpec::Skus {
            sku_count: 3,
            quantities: vec![1000, 1000, 1000],
        };
        let c = compare_quantities(&req, &[6000, 3000]).unwrap();
        let single = calculate_quote(&pouch(6000)).unwrap();
        assert_eq!(c.quotes[1].quantity, 6000);
        assert_eq!(c.quotes[1].unit_price, single.unit_price);

        assert_eq!(
            compare_quantities(&pouch(1000), &[]),
            Err(EngineError::Validation(ValidationError::NoQuantities))
        );
        assert_eq!(
            compare_quantities(&pouch(1000), &[100, 1000]).unwrap_err().kind(),
            "validation_error"
        );
    }

    #[test]
    fn column_option_reprices_against_baseline() {
        let req = pouch(10_000);
        let applied = Some(AppliedOption::Column { column_count: 2 });
        let q = calculate_quote_with_option(&req, applied).unwrap();
        assert_eq!(q.quantity, 20_000);
        // 2 × 912,000 × (1 − 0.40)
        assert_eq!(q.total_price, yen(1_094_400));
        assert_eq!(q.unit_price, Decimal::new(5472, 2));
        assert_eq!(q.original_total_price, Some(yen(912_000)));
        assert_eq!(q.original_unit_price, Some(Decimal::new(9120, 2)));
        assert_eq!(q.applied_option, applied);
        assert!(q.breakdown.is_consistent());

        // Baseline is unaffected by the previous call.
        let base = calculate_quote(&req).unwrap();
        assert_eq!(base.total_price, yen(912_000));
        assert_eq!(base.applied_option, None);
        // Lanes share the web: same metres, twice the pieces per metre.
        assert_eq!(q.film_usage.total_meters, base.film_usage.total_meters);
        assert_eq!(
            q.film_usage.pouches_per_meter,
            base.film_usage.pouches_per_meter * Decimal::TWO
        );
    }

    #[test]
    fn infeasible_column_count_is_a_validation_error() {
        let applied = Some(AppliedOption::Column { column_count: 4 });
        let err = calculate_quote_with_option(&pouch(10_000), applied).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::OptionNotFeasible(_))
        ));
    }

    #[test]
    fn sku_split_option_requotes_same_total() {
        let req = pouch(3000);
        let applied = Some(AppliedOption::SkuSplit { sku_count: 3 });
        let q = calculate_quote_with_option(&req, applied).unwrap();
        let costs = q.sku_costs.as_ref().unwrap();
        assert_eq!(costs.len(), 3);
        assert!(costs.iter().all(|c| c.quantity == 1000));
        assert_eq!(q.total_price, q.original_total_price.unwrap());
        let seven = Some(AppliedOption::SkuSplit { sku_count: 7 });
        assert!(calculate_quote_with_option(&req, seven).is_err());
    }

    #[test]
    fn economic_suggestion_from_request() {
        let engine = QuoteEngine::standard();
        let s = engine
            .economic_suggestion(&pouch(10_000), &SuggestionOptions::default())
            .unwrap();
        assert_eq!(s.order_quantity, 10_000);
        assert_eq!(s.unit_cost_at_order_qty, Decimal::new(9120, 2));
        assert!(s.economic_quantity >= 10_000);
    }

    #[test]
    fn custom_policy_changes_the_floor() {
        let policy = PricingPolicy::from_yaml_str("minimum_order_price: '200000'\n").unwrap();
        let engine = QuoteEngine::new(Catalog::standard(), &policy);
        let q = engine.calculate_quote(&pouch(500)).unwrap();
        assert_eq!(q.total_price, yen(200_000));
        assert!(q.minimum_price_applied);
    }

    #[test]
    fn results_serialize_to_json() {
        let mut req = pouch(10_000);
        req.quote_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        let q = calculate_quote(&req).unwrap();
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["valid_until"], "2024-03-31");
        assert_eq!(json["applied_option"], serde_json::Value::Null);
    }

    proptest! {
        #[test]
        fn quotes_are_deterministic_and_balanced(q in 500u64..300_000, w in 50u32..600, h in 50u32..600) {
            let mut req = pouch(q);
            req.bag_type = BagType::StandUpZipper;
            req.dimensions = Dimensions { width_mm: w, height_mm: h, depth_mm: 0 };
            let a = calculate_quote(&req).unwrap();
            let b = calculate_quote(&req).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert!(a.breakdown.is_consistent());
            prop_assert_eq!(a.total_price % Decimal::new(100, 0), Decimal::ZERO);
        }

        #[test]
        fn unit_price_never_rises_across_a_threshold(t in prop::sample::select(vec![5000u64, 10_000, 20_000, 50_000])) {
            let below = calculate_quote(&pouch(t - 1)).unwrap();
            let at = calculate_quote(&pouch(t)).unwrap();
            prop_assert!(at.discount_rate > below.discount_rate);
            prop_assert!(at.unit_price <= below.unit_price);
        }
    }
}
