#![deny(warnings)]

//! Cost calculator: turns a validated quote request into a priced,
//! line-itemised quotation.
//!
//! Every line of the breakdown is rounded to the policy granularity before
//! it is summed, so `total = subtotal - discount + delivery` holds exactly
//! and the total is always a multiple of the granularity.

pub mod allocation;
pub mod delivery;

pub use allocation::allocate_by_weight;
pub use delivery::{delivery_charge, lead_time_days, unit_weight_g};

use chrono::Days;
use film_geometry::film_plan;
use pouch_core::{
    BagType, Catalog, CostBreakdown, EngineError, PricingPolicy, PrintingKind, PrintingSpec,
    QuoteRequest, QuoteResult, SkuCost, ValidationError,
};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Web length priced as one roll-film unit.
const ROLL_UNIT_LENGTH_MM: u64 = 1000;

/// Per-unit cost inputs resolved from the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitCosts {
    pub area_mm2: u64,
    pub thickness_multiplier: Decimal,
    pub post_processing_multiplier: Decimal,
    /// Film cost of one unit.
    pub material: Decimal,
    /// Conversion cost of one unit before finishing.
    pub processing: Decimal,
}

impl UnitCosts {
    /// Material plus processing, with finishing applied.
    pub fn variable(&self) -> Decimal {
        (self.material + self.processing) * self.post_processing_multiplier
    }
}

/// Film area priced per unit: both faces plus the gusset for pouches, one
/// metre of web for roll film.
fn area_mm2(req: &QuoteRequest) -> u64 {
    let d = &req.dimensions;
    let w = u64::from(d.width_mm);
    if req.bag_type.is_roll_film() {
        w * ROLL_UNIT_LENGTH_MM
    } else {
        w * u64::from(d.height_mm) + 2 * w * u64::from(d.depth_mm)
    }
}

/// Printing charge: plate or setup fee plus a per-colour, per-side, per-unit
/// rate, never below the process minimum.
pub fn printing_charge(spec: &PrintingSpec, quantity: u64, policy: &PricingPolicy) -> Decimal {
    let rate = match spec.kind {
        PrintingKind::None => return Decimal::ZERO,
        PrintingKind::Digital => &policy.printing.digital,
        PrintingKind::Gravure => &policy.printing.gravure,
    };
    let sides: u64 = if spec.double_sided { 2 } else { 1 };
    let impressions = u64::from(spec.colors) * sides * quantity;
    let charge = rate.setup_fee + rate.per_color_per_unit * Decimal::from(impressions);
    charge.max(rate.min_charge)
}

/// Machine setup for the bag family, with the small-lot uplift.
pub fn setup_charge(bag_type: BagType, quantity: u64, policy: &PricingPolicy) -> Decimal {
    let s = &policy.setup;
    let flat = bag_type.is_flat_family();
    let base = if flat { s.flat_setup } else { s.standard_setup };
    if quantity >= s.small_lot_threshold {
        return base;
    }
    let surcharge = if flat { s.small_lot_surcharge } else { Decimal::ZERO };
    base * s.small_lot_factor + surcharge
}

/// Prices quote requests against one catalog and policy.
#[derive(Clone, Copy, Debug)]
pub struct CostCalculator<'a> {
    catalog: &'a Catalog,
    policy: &'a PricingPolicy,
}

impl<'a> CostCalculator<'a> {
    pub fn new(catalog: &'a Catalog, policy: &'a PricingPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn unit_costs(&self, req: &QuoteRequest) -> Result<UnitCosts, EngineError> {
        let material = self.catalog.material(&req.material_id)?;
        let thickness = self.catalog.thickness_multiplier(&req.material_id, req.thickness)?;
        let pp = self.catalog.combined_post_processing(&req.post_processing)?;
        let area = area_mm2(req);
        let material_unit = Decimal::from(area)
            * self.policy.material_rate_per_mm2
            * material.base_multiplier
            * thickness;
        Ok(UnitCosts {
            area_mm2: area,
            thickness_multiplier: thickness,
            post_processing_multiplier: pp,
            material: material_unit,
            processing: self.catalog.processing_per_unit(req.bag_type)?,
        })
    }

    /// Price a request that has already passed validation.
    pub fn quote(&self, req: &QuoteRequest) -> Result<QuoteResult, EngineError> {
        let policy = self.policy;
        let quantity = req.quantity.total()?;
        if quantity == 0 {
            return Err(ValidationError::QuantityBelowMinimum {
                min: policy.min_quantity_per_sku(req.bag_type, 1),
                actual: 0,
            }
            .into());
        }
        let q = Decimal::from(quantity);
        let unit = self.unit_costs(req)?;
        let round = |v: Decimal| policy.round_to_granularity(v);

        let material_total = unit.material * q;
        let material = round(material_total);
        let processing = round(unit.variable() * q - material_total);
        let printing = round(printing_charge(&req.printing, quantity, policy));
        let setup = round(setup_charge(req.bag_type, quantity, policy));
        let mut subtotal = material + processing + printing + setup;

        let discount_rate = policy.discount_rate(quantity);
        let discount = round(subtotal * discount_rate);

        let floor = policy.minimum_order_price;
        let mut minimum_charge = Decimal::ZERO;
        if subtotal - discount < floor {
            minimum_charge = round(floor - (subtotal - discount));
            subtotal += minimum_charge;
            warn!(%floor, %minimum_charge, "order below minimum price; floor applied");
        }
        let net = subtotal - discount;

        let delivery = delivery_charge(req, quantity, net, self.catalog, policy)?;
        let total = net + delivery;
        let breakdown = CostBreakdown {
            material,
            processing,
            printing,
            setup,
            minimum_charge,
            subtotal,
            discount,
            delivery,
            total,
        };
        debug!(?breakdown, %discount_rate, quantity, "priced request");

        let per_sku = req.quantity.per_sku();
        let film = film_plan(req.bag_type, &req.dimensions, &per_sku, policy)?;
        let sku_costs = req.quantity.is_sku_mode().then(|| {
            allocate_by_weight(total, &per_sku)
                .into_iter()
                .zip(per_sku.iter().zip(&film.per_sku))
                .enumerate()
                .map(|(index, (amount, (&quantity, sku_film)))| SkuCost {
                    index,
                    quantity,
                    amount,
                    theoretical_meters: sku_film.theoretical_meters,
                    secured_meters: sku_film.secured_meters,
                })
                .collect()
        });

        let sku_count = req.quantity.sku_count();
        let valid_until = req.quote_date.and_then(|d| {
            d.checked_add_days(Days::new(u64::from(policy.quote_validity_days)))
        });

        Ok(QuoteResult {
            unit_price: (total / q).round_dp(2),
            total_price: total,
            quantity,
            minimum_price_applied: minimum_charge > Decimal::ZERO,
            breakdown,
            discount_rate,
            minimum_order_quantity: policy.min_quantity_per_sku(req.bag_type, sku_count)
                * sku_count as u64,
            lead_time_days: lead_time_days(
                quantity,
                req.delivery.urgency,
                unit.post_processing_multiplier,
                policy,
            ),
            thickness_multiplier: unit.thickness_multiplier,
            post_processing_multiplier: unit.post_processing_multiplier,
            film_usage: film.usage,
            sku_costs,
            applied_option: None,
            original_unit_price: None,
            original_total_price: None,
            valid_until,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pouch_core::{DeliverySpec, Dimensions, QuantitySpec, ThicknessBand};
    use proptest::prelude::*;

    fn calc() -> CostCalculator<'static> {
        CostCalculator::new(Catalog::standard(), PricingPolicy::standard())
    }

    fn flat(quantity: u64) -> QuoteRequest {
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

    fn yen(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    #[test]
    fn ten_thousand_flat_pouches() {
        let r = calc().quote(&flat(10_000)).unwrap();
        let b = &r.breakdown;
        // 200 × 300 mm² × 0.0015 = 90 yen of film per pouch
        assert_eq!(b.material, yen(900_000));
        assert_eq!(b.processing, yen(150_000));
        assert_eq!(b.printing, yen(60_000));
        assert_eq!(b.setup, yen(30_000));
        assert_eq!(b.subtotal, yen(1_140_000));
        assert_eq!(r.discount_rate, Decimal::new(20, 2));
        assert_eq!(b.discount, yen(228_000));
        assert_eq!(b.delivery, Decimal::ZERO);
        assert_eq!(r.total_price, yen(912_000));
        assert_eq!(r.unit_price, Decimal::new(9120, 2));
        assert!(!r.minimum_price_applied);
        assert_eq!(r.lead_time_days, 21);
        assert!(r.sku_costs.is_none());
    }

    #[test]
    fn fewer_pieces_cost_more_each() {
        let small = calc().quote(&flat(4000)).unwrap();
        assert_eq!(small.discount_rate, Decimal::ZERO);
        assert_eq!(small.total_price, yen(480_000));
        assert_eq!(small.unit_price, Decimal::new(120, 0));
        let big = calc().quote(&flat(10_000)).unwrap();
        assert!(big.unit_price < small.unit_price);
    }

    #[test]
    fn small_flat_order_hits_the_floor() {
        let r = calc().quote(&flat(500)).unwrap();
        let b = &r.breakdown;
        // setup 30,000 × 1.2 + 30,000 small-lot surcharge
        assert_eq!(b.setup, yen(66_000));
        assert_eq!(b.minimum_charge, yen(29_000));
        assert_eq!(b.subtotal, yen(160_000));
        assert_eq!(r.total_price, yen(160_000));
        assert!(r.minimum_price_applied);
        assert!(b.is_consistent());
    }

    #[test]
    fn sku_mode_prices_on_total_quantity() {
        let mut skus = flat(0);
        skus.quantity = QuantitySpec::Skus {
            sku_count: 3,
            quantities: vec![1000, 1000, 1000],
        };
        let split = calc().quote(&skus).unwrap();
        let single = calc().quote(&flat(3000)).unwrap();
        assert_eq!(split.unit_price, single.unit_price);
        assert_eq!(split.total_price, single.total_price);
        let costs = split.sku_costs.unwrap();
        assert_eq!(costs.len(), 3);
        assert_eq!(
            costs.iter().map(|c| c.amount).sum::<Decimal>(),
            split.total_price
        );
        assert_eq!(costs[0].secured_meters, 300);
    }

    #[test]
    fn post_processing_raises_processing_line_only() {
        let mut r = flat(10_000);
        r.post_processing = vec!["zipper-yes".into(), "valve-yes".into()];
        let q = calc().quote(&r).unwrap();
        assert_eq!(q.post_processing_multiplier, Decimal::new(120, 2));
        assert_eq!(q.breakdown.material, yen(900_000));
        // (90 + 15) × 1.20 × 10,000 − 900,000
        assert_eq!(q.breakdown.processing, yen(360_000));
        assert_eq!(q.lead_time_days, 23);
    }

    #[test]
    fn gravure_and_double_sided_printing() {
        let p = PricingPolicy::standard();
        let spec = PrintingSpec {
            kind: PrintingKind::Gravure,
            colors: 4,
            double_sided: true,
        };
        assert_eq!(printing_charge(&spec, 10_000, p), yen(210_000));
        let none = PrintingSpec {
            kind: PrintingKind::None,
            ..spec
        };
        assert_eq!(printing_charge(&none, 10_000, p), Decimal::ZERO);
    }

    #[test]
    fn validity_follows_quote_date() {
        let mut r = flat(10_000);
        r.quote_date = NaiveDate::from_ymd_opt(2024, 1, 15);
        let q = calc().quote(&r).unwrap();
        assert_eq!(q.valid_until, NaiveDate::from_ymd_opt(2024, 2, 14));
    }

    #[test]
    fn unknown_material_fails_closed() {
        let mut r = flat(10_000);
        r.material_id = "unobtainium".into();
        assert_eq!(calc().quote(&r).unwrap_err().kind(), "catalog_gap_error");
    }

    proptest! {
        #[test]
        fn breakdown_is_consistent(q in 500u64..200_000, w in 50u32..400, h in 50u32..400, d in 0u32..100) {
            let mut r = flat(q);
            r.bag_type = BagType::Box;
            r.dimensions = Dimensions { width_mm: w, height_mm: h, depth_mm: d };
            let res = calc().quote(&r).unwrap();
            prop_assert!(res.breakdown.is_consistent());
            let g = PricingPolicy::standard().rounding_granularity;
            prop_assert_eq!(res.total_price % g, Decimal::ZERO);
            prop_assert!(res.total_price >= PricingPolicy::standard().minimum_order_price);
        }

        #[test]
        fn quotes_are_deterministic(q in 500u64..100_000) {
            let a = calc().quote(&flat(q)).unwrap();
            let b = calc().quote(&flat(q)).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
