//! Price derivation for standard and bundle products and customer-group
//! overrides. Everything here is pure decimal arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::Set;

use crate::entities::{
    customer_group_price, product, CustomerGroupPriceModel, PriceType, ProductType,
};

const HUNDRED: Decimal = dec!(100);

/// Largest amount a `decimal(12, 2)` money column holds.
pub const MAX_MONEY: Decimal = dec!(9999999999.99);

/// A derived price fell outside the storable money range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("derived price exceeds 9999999999.99")]
pub struct PriceOverflow;

/// Two decimal places, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A cost only counts when it is strictly positive.
fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}

/// `value + value * pct / 100`, rounded.
fn with_margin(value: Decimal, pct: Decimal) -> Option<Decimal> {
    let margin = value.checked_mul(pct)?.checked_div(HUNDRED)?;
    value.checked_add(margin).map(round_money)
}

/// `price + price * gp / 100`, or zero when either input is missing.
pub fn standard_total(
    price: Option<Decimal>,
    gp_percentage: Option<Decimal>,
) -> Result<Decimal, PriceOverflow> {
    match (price, gp_percentage) {
        (Some(price), Some(gp)) => with_margin(price, gp).ok_or(PriceOverflow),
        _ => Ok(Decimal::ZERO),
    }
}

/// One component line as seen by the pricing engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundleLine {
    /// The component's own derived total, if it has one.
    pub component_total: Option<Decimal>,
    /// Per-line price that replaces `component_total` when positive.
    pub override_price: Decimal,
    pub quantity: u32,
}

impl BundleLine {
    pub fn unit_price(&self) -> Decimal {
        positive(Some(self.override_price))
            .or(self.component_total)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn line_total(&self) -> Result<Decimal, PriceOverflow> {
        self.unit_price()
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(PriceOverflow)
    }
}

/// Sum of the component lines plus the bundle's own base price when set.
pub fn bundle_subtotal(
    base_price: Option<Decimal>,
    lines: &[BundleLine],
) -> Result<Decimal, PriceOverflow> {
    let mut total = positive(base_price).unwrap_or(Decimal::ZERO);
    for line in lines {
        total = total.checked_add(line.line_total()?).ok_or(PriceOverflow)?;
    }
    Ok(round_money(total))
}

pub fn bundle_final(
    subtotal: Decimal,
    bundle_gp_percentage: Option<Decimal>,
) -> Result<Decimal, PriceOverflow> {
    match bundle_gp_percentage {
        Some(gp) => with_margin(subtotal, gp).ok_or(PriceOverflow),
        None => Ok(subtotal),
    }
}

fn storable(value: Decimal) -> Result<Decimal, PriceOverflow> {
    if value > MAX_MONEY {
        return Err(PriceOverflow);
    }
    Ok(value)
}

/// Price before customer-group rules: override cost, then RRP cost, then the
/// computed sell price.
pub fn base_price(
    override_rrp_cost: Option<Decimal>,
    rrp_cost: Option<Decimal>,
    computed: Decimal,
) -> Decimal {
    positive(override_rrp_cost)
        .or(positive(rrp_cost))
        .unwrap_or(computed)
}

/// Customer-group rule reduced to what the engine needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupPriceRule {
    pub price_type: PriceType,
    pub amount: Decimal,
}

impl From<&CustomerGroupPriceModel> for GroupPriceRule {
    fn from(row: &customer_group_price::Model) -> Self {
        Self {
            price_type: row.price_type,
            amount: row.amount,
        }
    }
}

/// Applies a group rule to `base`. No rule leaves the base untouched.
pub fn resolve_customer_price(base: Decimal, rule: Option<GroupPriceRule>) -> Decimal {
    match rule {
        None => base,
        Some(GroupPriceRule {
            price_type: PriceType::Fixed,
            amount,
        }) => round_money(amount),
        Some(GroupPriceRule {
            price_type: PriceType::Percentage,
            amount,
        }) => round_money(base - base * amount / HUNDRED),
    }
}

/// Derived price columns of a product. Writing through [`ProductPricing::apply`]
/// is the only way pricing columns change, so the columns of the other
/// product type are always cleared.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductPricing {
    Standard {
        price: Option<Decimal>,
        gp_percentage: Option<Decimal>,
        total_price: Decimal,
    },
    Bundle {
        price: Option<Decimal>,
        bundle_gp_percentage: Option<Decimal>,
        bundle_subtotal: Decimal,
        bundle_final_price: Decimal,
    },
}

impl ProductPricing {
    /// Fails when the total would not fit a money column.
    pub fn standard(
        price: Option<Decimal>,
        gp_percentage: Option<Decimal>,
    ) -> Result<Self, PriceOverflow> {
        Ok(Self::Standard {
            price,
            gp_percentage,
            total_price: storable(standard_total(price, gp_percentage)?)?,
        })
    }

    /// Fails when the subtotal or final price would not fit a money column.
    pub fn bundle(
        price: Option<Decimal>,
        bundle_gp_percentage: Option<Decimal>,
        lines: &[BundleLine],
    ) -> Result<Self, PriceOverflow> {
        let subtotal = storable(bundle_subtotal(price, lines)?)?;
        Ok(Self::Bundle {
            price,
            bundle_gp_percentage,
            bundle_subtotal: subtotal,
            bundle_final_price: storable(bundle_final(subtotal, bundle_gp_percentage)?)?,
        })
    }

    pub fn product_type(&self) -> ProductType {
        match self {
            Self::Standard { .. } => ProductType::Standard,
            Self::Bundle { .. } => ProductType::Bundle,
        }
    }

    pub fn sell_price(&self) -> Decimal {
        match self {
            Self::Standard { total_price, .. } => *total_price,
            Self::Bundle {
                bundle_final_price, ..
            } => *bundle_final_price,
        }
    }

    pub fn apply(&self, model: &mut product::ActiveModel) {
        model.product_type = Set(self.product_type());
        match self {
            Self::Standard {
                price,
                gp_percentage,
                total_price,
            } => {
                model.price = Set(*price);
                model.gp_percentage = Set(*gp_percentage);
                model.total_price = Set(Some(*total_price));
                model.bundle_gp_percentage = Set(None);
                model.bundle_subtotal = Set(None);
                model.bundle_final_price = Set(None);
            }
            Self::Bundle {
                price,
                bundle_gp_percentage,
                bundle_subtotal,
                bundle_final_price,
            } => {
                model.price = Set(*price);
                model.gp_percentage = Set(None);
                model.total_price = Set(None);
                model.bundle_gp_percentage = Set(*bundle_gp_percentage);
                model.bundle_subtotal = Set(Some(*bundle_subtotal));
                model.bundle_final_price = Set(Some(*bundle_final_price));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use sea_orm::ActiveValue;

    fn line(total: Decimal, override_price: Decimal, quantity: u32) -> BundleLine {
        BundleLine {
            component_total: Some(total),
            override_price,
            quantity,
        }
    }

    #[test]
    fn standard_total_is_exact_over_repeats() {
        for _ in 0..1000 {
            assert_eq!(standard_total(Some(dec!(100)), Some(dec!(10))), Ok(dec!(110.00)));
        }
    }

    #[rstest]
    #[case(None, Some(dec!(10)))]
    #[case(Some(dec!(100)), None)]
    #[case(None, None)]
    fn standard_total_missing_input_is_zero(
        #[case] price: Option<Decimal>,
        #[case] gp: Option<Decimal>,
    ) {
        assert_eq!(standard_total(price, gp), Ok(Decimal::ZERO));
    }

    #[test]
    fn zero_margin_keeps_price() {
        assert_eq!(standard_total(Some(dec!(19.99)), Some(dec!(0))), Ok(dec!(19.99)));
    }

    #[test]
    fn standard_total_rounds_half_away_from_zero() {
        // 10.05 * 1.05 = 10.5525
        assert_eq!(standard_total(Some(dec!(10.05)), Some(dec!(5))), Ok(dec!(10.55)));
        // 0.10 * 1.25 = 0.125
        assert_eq!(standard_total(Some(dec!(0.10)), Some(dec!(25))), Ok(dec!(0.13)));
    }

    #[test]
    fn bundle_subtotal_and_final() {
        let lines = [line(dec!(50), Decimal::ZERO, 2), line(dec!(20), Decimal::ZERO, 1)];
        let subtotal = bundle_subtotal(Some(Decimal::ZERO), &lines).unwrap();
        assert_eq!(subtotal, dec!(120));
        assert_eq!(bundle_final(subtotal, Some(dec!(25))), Ok(dec!(150.00)));
        assert_eq!(bundle_final(subtotal, None), Ok(dec!(120)));
    }

    #[test]
    fn bundle_override_price_wins() {
        assert_eq!(line(dec!(50), dec!(40), 3).line_total(), Ok(dec!(120)));
        assert_eq!(line(dec!(50), dec!(0), 3).line_total(), Ok(dec!(150)));
    }

    #[test]
    fn bundle_base_price_is_added() {
        let lines = [line(dec!(10), Decimal::ZERO, 1)];
        assert_eq!(bundle_subtotal(Some(dec!(5)), &lines), Ok(dec!(15)));
        assert_eq!(bundle_subtotal(None, &lines), Ok(dec!(10)));
    }

    #[test]
    fn component_without_total_contributes_zero() {
        let lines = [BundleLine {
            component_total: None,
            override_price: Decimal::ZERO,
            quantity: 4,
        }];
        assert_eq!(bundle_subtotal(None, &lines), Ok(Decimal::ZERO));
    }

    #[rstest]
    #[case(Some(PriceType::Percentage), dec!(20), dec!(80))]
    #[case(Some(PriceType::Fixed), dec!(75), dec!(75))]
    #[case(None, dec!(0), dec!(100))]
    fn customer_group_overrides(
        #[case] price_type: Option<PriceType>,
        #[case] amount: Decimal,
        #[case] expected: Decimal,
    ) {
        let rule = price_type.map(|price_type| GroupPriceRule { price_type, amount });
        assert_eq!(resolve_customer_price(dec!(100), rule), expected);
    }

    #[test]
    fn base_price_priority() {
        assert_eq!(base_price(Some(dec!(9)), Some(dec!(8)), dec!(7)), dec!(9));
        assert_eq!(base_price(None, Some(dec!(8)), dec!(7)), dec!(8));
        assert_eq!(base_price(Some(dec!(0)), None, dec!(7)), dec!(7));
    }

    #[test]
    fn apply_clears_the_other_type() {
        let mut model = product::ActiveModel {
            gp_percentage: Set(Some(dec!(10))),
            total_price: Set(Some(dec!(110))),
            ..Default::default()
        };
        ProductPricing::bundle(None, Some(dec!(10)), &[line(dec!(10), dec!(0), 1)])
            .unwrap()
            .apply(&mut model);

        assert_eq!(model.product_type, ActiveValue::Set(ProductType::Bundle));
        assert_eq!(model.gp_percentage, ActiveValue::Set(None));
        assert_eq!(model.total_price, ActiveValue::Set(None));
        assert_eq!(model.bundle_subtotal, ActiveValue::Set(Some(dec!(10))));
        assert_eq!(model.bundle_final_price, ActiveValue::Set(Some(dec!(11.00))));

        ProductPricing::standard(Some(dec!(100)), Some(dec!(10)))
            .unwrap()
            .apply(&mut model);
        assert_eq!(model.product_type, ActiveValue::Set(ProductType::Standard));
        assert_eq!(model.bundle_gp_percentage, ActiveValue::Set(None));
        assert_eq!(model.bundle_subtotal, ActiveValue::Set(None));
        assert_eq!(model.bundle_final_price, ActiveValue::Set(None));
        assert_eq!(model.total_price, ActiveValue::Set(Some(dec!(110.00))));
    }

    #[test]
    fn overflowing_inputs_are_reported_not_panicked() {
        let huge = dec!(70000000000000000000000000000);
        assert_eq!(standard_total(Some(huge), Some(dec!(100))), Err(PriceOverflow));
        assert_eq!(line(huge, Decimal::ZERO, 10).line_total(), Err(PriceOverflow));
        assert_eq!(
            bundle_subtotal(Some(huge), &[line(huge, Decimal::ZERO, 1)]),
            Err(PriceOverflow)
        );
        assert_eq!(bundle_final(huge, Some(dec!(50))), Err(PriceOverflow));
    }

    #[test]
    fn totals_beyond_the_money_columns_are_rejected() {
        assert_eq!(
            ProductPricing::standard(Some(MAX_MONEY), Some(dec!(10))),
            Err(PriceOverflow)
        );
        assert!(ProductPricing::standard(Some(MAX_MONEY), Some(dec!(0))).is_ok());

        // 10000 units of the largest line price.
        let lines = [line(MAX_MONEY, Decimal::ZERO, 10_000)];
        assert_eq!(ProductPricing::bundle(None, None, &lines), Err(PriceOverflow));

        let fits = [line(dec!(9000000000), Decimal::ZERO, 1)];
        assert_eq!(
            ProductPricing::bundle(None, Some(dec!(20)), &fits),
            Err(PriceOverflow)
        );
        assert!(ProductPricing::bundle(None, Some(dec!(10)), &fits).is_ok());
    }

    proptest! {
        #[test]
        fn zero_percent_discount_is_identity(cents in 0i64..10_000_000) {
            let base = Decimal::new(cents, 2);
            let rule = GroupPriceRule { price_type: PriceType::Percentage, amount: Decimal::ZERO };
            prop_assert_eq!(resolve_customer_price(base, Some(rule)), base);
        }

        #[test]
        fn percentage_discount_stays_within_base(cents in 0i64..10_000_000, pct in 0u32..=100) {
            let base = Decimal::new(cents, 2);
            let rule = GroupPriceRule { price_type: PriceType::Percentage, amount: Decimal::from(pct) };
            let price = resolve_customer_price(base, Some(rule));
            prop_assert!(price >= Decimal::ZERO);
            prop_assert!(price <= base);
        }

        #[test]
        fn standard_total_has_two_decimals(cents in 0i64..10_000_000, gp_bp in 0i64..10_000) {
            let total = standard_total(Some(Decimal::new(cents, 2)), Some(Decimal::new(gp_bp, 2))).unwrap();
            prop_assert!(total.scale() <= 2);
            prop_assert!(total >= Decimal::new(cents, 2));
        }

        #[test]
        fn override_line_ignores_component_total(
            total in 0i64..100_000,
            over in 1i64..100_000,
            qty in 1u32..50,
        ) {
            let with_override = line(Decimal::new(total, 2), Decimal::new(over, 2), qty);
            prop_assert_eq!(with_override.line_total(), Ok(Decimal::new(over, 2) * Decimal::from(qty)));
        }
    }
}
