//! Input validation for the shop manager.
//!
//! Pure functions that check and normalise raw operator input before it
//! reaches the services. Every parser trims its input first and returns a
//! [`ValidationError`] describing what the operator has to fix; the prompt
//! layer turns that error into a re-prompt.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid phone regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error("Invalid {0}. Please enter a valid number.")]
    InvalidNumber(&'static str),
    #[error("Invalid {0}. Please enter a valid integer.")]
    InvalidInteger(&'static str),
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("{0} must be at least 1")]
    NotPositive(&'static str),
    #[error("Phone number must contain only digits")]
    InvalidPhone,
    #[error("Invalid email format")]
    InvalidEmail,
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Round `value` to `places` decimals, half away from zero.
///
/// Rounding happens on the shortest decimal representation of the float, so
/// `19.995` becomes `20.0` even though its binary value sits just below the
/// midpoint. Values that do not fit a `Decimal` are returned unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    Decimal::from_str(&value.to_string())
        .ok()
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_string().parse::<f64>().ok())
        .unwrap_or(value)
}

pub fn require_text(field: &'static str, input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Parse a unit price: a finite, non-negative number rounded to cents.
pub fn parse_price(input: &str) -> Result<f64, ValidationError> {
    let price = input
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidNumber("price"))?;

    if !price.is_finite() {
        return Err(ValidationError::InvalidNumber("price"));
    }
    if price < 0.0 {
        return Err(ValidationError::Negative("Price"));
    }

    Ok(round_to(price, 2))
}

/// Parse a stock level for the catalog (zero allowed).
pub fn parse_stock_quantity(input: &str) -> Result<i64, ValidationError> {
    let quantity = parse_integer("quantity", input)?;
    if quantity < 0 {
        return Err(ValidationError::Negative("Quantity"));
    }
    Ok(quantity)
}

/// Parse the number of units for an order (at least one).
pub fn parse_order_quantity(input: &str) -> Result<i64, ValidationError> {
    let quantity = parse_integer("quantity", input)?;
    if quantity < 1 {
        return Err(ValidationError::NotPositive("Quantity"));
    }
    Ok(quantity)
}

pub fn parse_id(field: &'static str, input: &str) -> Result<i64, ValidationError> {
    parse_integer(field, input)
}

pub fn parse_phone(input: &str) -> Result<String, ValidationError> {
    let phone = input.trim();
    if !is_valid_phone(phone) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(phone.to_string())
}

pub fn parse_email(input: &str) -> Result<String, ValidationError> {
    let email = input.trim();
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email.to_string())
}

fn parse_integer(field: &'static str, input: &str) -> Result<i64, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidInteger(field))
}
