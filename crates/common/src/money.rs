use serde::{Deserialize, Serialize};

/// Money amount in minor units (cents) to avoid floating point issues.
///
/// Serializes as a bare integer, so `{"price": 1999}` means 19.99.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity, or `None` if the result overflows.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Adds two amounts, or `None` if the result overflows.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_minor_units() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn checked_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
        assert_eq!(a.checked_multiply(3), Some(Money::from_cents(3000)));
        assert_eq!(a.checked_multiply(0), Some(Money::zero()));
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        let big = Money::from_cents(i64::MAX / 2);
        assert_eq!(big.checked_multiply(3), None);
        assert_eq!(big.checked_add(big), Some(Money::from_cents(i64::MAX - 1)));
        assert_eq!(big.checked_add(big).and_then(|m| m.checked_add(Money::from_cents(2))), None);
    }

    #[test]
    fn display_handles_the_most_negative_amount() {
        assert_eq!(
            Money::from_cents(i64::MIN).to_string(),
            "-$92233720368547758.08"
        );
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Money::from_cents(999)).unwrap(), "999");
        let m: Money = serde_json::from_str("250").unwrap();
        assert_eq!(m.cents(), 250);
    }
}
