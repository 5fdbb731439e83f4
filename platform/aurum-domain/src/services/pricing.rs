use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits of a computed price.
pub const AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    NonPositive { field: &'static str, value: Decimal },
    Overflow,
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::NonPositive { field, value } => {
                write!(f, "{field} must be > 0 (got {value})")
            }
            PricingError::Overflow => write!(f, "price computation overflowed"),
        }
    }
}

impl std::error::Error for PricingError {}

/// Rejects zero and negative multipliers.
pub fn validate_multiplier(field: &'static str, value: Decimal) -> Result<Decimal, PricingError> {
    if value <= Decimal::ZERO {
        return Err(PricingError::NonPositive { field, value });
    }
    Ok(value)
}

/// `round(gram * sell_price * factor, 2)`, midpoint away from zero.
pub fn compute_price(
    gram: Decimal,
    sell_price: Decimal,
    factor: Decimal,
) -> Result<Decimal, PricingError> {
    let amount = gram
        .checked_mul(sell_price)
        .and_then(|partial| partial.checked_mul(factor))
        .ok_or(PricingError::Overflow)?;
    Ok(round_amount(amount))
}

pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::{compute_price, round_amount, validate_multiplier, PricingError};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn compute_price_multiplies_and_rounds() {
        let amount = compute_price(dec!(5), dec!(2010.0), dec!(0.916)).unwrap();
        assert_eq!(amount, dec!(9205.80));
        assert_eq!(format!("{:.2}", amount), "9205.80");
    }

    #[test]
    fn rounding_is_midpoint_away_from_zero() {
        assert_eq!(round_amount(dec!(1.005)), dec!(1.01));
        assert_eq!(round_amount(dec!(1.004)), dec!(1.00));
        assert_eq!(round_amount(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn validate_multiplier_rejects_zero_and_negative() {
        assert_eq!(validate_multiplier("gram", dec!(0.5)), Ok(dec!(0.5)));
        assert_eq!(
            validate_multiplier("gram", Decimal::ZERO),
            Err(PricingError::NonPositive {
                field: "gram",
                value: Decimal::ZERO
            })
        );
        let err = validate_multiplier("factor", dec!(-1)).unwrap_err();
        assert_eq!(err.to_string(), "factor must be > 0 (got -1)");
    }

    #[test]
    fn compute_price_reports_overflow() {
        assert_eq!(
            compute_price(Decimal::MAX, Decimal::MAX, dec!(1)),
            Err(PricingError::Overflow)
        );
    }
}
