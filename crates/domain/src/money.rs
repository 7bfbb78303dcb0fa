//! Monetary amounts.

use serde::{Deserialize, Serialize};

/// Money amount represented in minor units (cents, paise) to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (e.g., 1000 = 10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from minor units.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a whole-unit value.
    pub fn from_major(units: i64) -> Self {
        Self {
            cents: units.saturating_mul(100),
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in minor units.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn major(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the minor-unit remainder.
    pub fn minor(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Subtracts `rhs`, or `None` on overflow.
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.cents.checked_sub(rhs.cents).map(Money::from_cents)
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Sums amounts, or `None` if any partial sum overflows.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Adds two amounts, clamping at the numeric bounds. For reporting totals.
    pub fn saturating_add(self, rhs: Money) -> Money {
        Money::from_cents(self.cents.saturating_add(rhs.cents))
    }

    /// Multiplies by a quantity, clamping at the numeric bounds.
    pub fn saturating_mul(self, quantity: u32) -> Money {
        Money::from_cents(self.cents.saturating_mul(i64::from(quantity)))
    }

    /// Mean of `count` amounts summing to `total`, rounded half away from zero.
    ///
    /// Returns zero when `count` is zero.
    pub fn average(total: Money, count: u64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        let n = i64::try_from(count).unwrap_or(i64::MAX);
        let quotient = total.cents / n;
        let remainder = (total.cents % n).unsigned_abs();
        // Round half away from zero without overflowing near the bounds.
        let cents = if remainder >= (n as u64).div_ceil(2) {
            quotient + total.cents.signum()
        } else {
            quotient
        };
        Money { cents }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.major().abs(), self.minor())
        } else {
            write!(f, "{}.{:02}", self.major(), self.minor())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.major(), 12);
        assert_eq!(money.minor(), 34);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
        assert_eq!(a.checked_sub(b), Some(Money::from_cents(500)));
        assert_eq!(a.checked_mul(3), Some(Money::from_cents(3000)));
    }

    #[test]
    fn test_money_sum() {
        let total = Money::checked_sum([100, 250, 650].into_iter().map(Money::from_cents));
        assert_eq!(total, Some(Money::from_cents(1000)));
    }

    #[test]
    fn test_checked_arithmetic_detects_overflow() {
        let huge = Money::from_cents((1 << 62) + 1);
        assert_eq!(huge.checked_mul(4), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(Money::checked_sum([huge, huge, Money::from_cents(-5)]), None);

        assert_eq!(huge.saturating_mul(4), Money::from_cents(i64::MAX));
        assert_eq!(huge.saturating_add(huge), Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert_eq!(Money::average(Money::from_cents(900), 0), Money::zero());
    }

    #[test]
    fn test_average_rounds_to_nearest_minor_unit() {
        assert_eq!(Money::average(Money::from_major(500), 2), Money::from_major(250));
        assert_eq!(Money::average(Money::from_cents(1001), 2).cents(), 501);
        assert_eq!(Money::average(Money::from_cents(1000), 3).cents(), 333);
        assert_eq!(Money::average(Money::from_cents(-1001), 2).cents(), -501);
        assert_eq!(Money::average(Money::from_cents(1002), 3).cents(), 334);
    }

    #[test]
    fn test_average_near_the_bounds() {
        assert_eq!(
            Money::average(Money::from_cents(i64::MAX), 2).cents(),
            i64::MAX / 2 + 1
        );
        assert_eq!(Money::average(Money::from_cents(i64::MAX), 1).cents(), i64::MAX);
    }
}
