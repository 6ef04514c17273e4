//! Field rules shared by the request types.

use std::str::FromStr;

use common::IdParseError;
use store::Money;

use crate::error::DomainError;

pub const NAME_MAX_CHARS: usize = 30;
pub const PRODUCT_NAME_MAX_CHARS: usize = 60;

/// Parses a typed identifier, reporting the field name on failure.
pub fn parse_id<T>(field: &str, value: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = IdParseError>,
{
    value
        .parse()
        .map_err(|e: IdParseError| DomainError::Validation(format!("{field}: {e}")))
}

pub fn email(value: &str) -> Result<(), DomainError> {
    if !value.contains('@') {
        return Err(DomainError::Validation(format!(
            "email: {value:?} is not a valid email address"
        )));
    }
    Ok(())
}

/// Checks that `value` has between 1 and `max` characters.
pub fn bounded(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(DomainError::Validation(format!(
            "{field}: length must be between 1 and {max} characters, got {len}"
        )));
    }
    Ok(())
}

pub fn non_empty(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field}: must not be empty")));
    }
    Ok(())
}

pub fn price(cents: i64) -> Result<Money, DomainError> {
    if cents < 0 {
        return Err(DomainError::Validation(format!(
            "price: must not be negative, got {cents}"
        )));
    }
    Ok(Money::from_cents(cents))
}

pub fn stock(value: i64) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| {
        DomainError::Validation(format!(
            "stock: must be between 0 and {}, got {value}",
            u32::MAX
        ))
    })
}

/// Converts a requested quantity, which must be at least 1.
pub fn quantity(value: i64) -> Result<u32, DomainError> {
    match u32::try_from(value) {
        Ok(q) if q >= 1 => Ok(q),
        _ => Err(DomainError::Validation(format!(
            "quantity: must be a positive integer, got {value}"
        ))),
    }
}
