//! Field rules for order records.
//!
//! Every rule takes the field value as an `Option` so that a candidate built in
//! memory with missing fields reports the same error as one carrying a bad value.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

pub const MAX_CUSTOMER_NAME_LENGTH: usize = 200;

/// 0.01
pub const MIN_TOTAL_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub const INVALID_EMAIL_MESSAGE: &str = "invalid email format";
pub const TOTAL_PRICE_MESSAGE: &str = "must be greater than or equal to 0.01";

/// Local part without `@` or whitespace, then a hostname made of labels of at most
/// 63 characters that neither start nor end with `-`, with at least one dot.
pub static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\A[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+\z",
    )
    .unwrap()
});

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn validate_customer_name(name: Option<&str>) -> Result<(), ValidationError> {
    let name = match name {
        Some(name) if !is_blank(name) => name,
        _ => return Err(error("required", "is required")),
    };

    if name.chars().count() > MAX_CUSTOMER_NAME_LENGTH {
        let mut err = error("too_long", "is too long (maximum is 200 characters)");
        err.add_param(Cow::Borrowed("max"), &MAX_CUSTOMER_NAME_LENGTH);
        return Err(err);
    }

    Ok(())
}

pub fn validate_customer_email(email: Option<&str>) -> Result<(), ValidationError> {
    match email {
        Some(email) if is_valid_email(email) => Ok(()),
        _ => Err(error("email_format", INVALID_EMAIL_MESSAGE)),
    }
}

pub fn validate_total_price(total_price: Option<&Decimal>) -> Result<(), ValidationError> {
    match total_price {
        Some(price) if *price >= MIN_TOTAL_PRICE => Ok(()),
        _ => Err(error("greater_than_or_equal_to", TOTAL_PRICE_MESSAGE)),
    }
}

pub fn validate_product_name(name: Option<&str>) -> Result<(), ValidationError> {
    match name {
        Some(name) if !is_blank(name) => Ok(()),
        _ => Err(error("required", "is required")),
    }
}

pub fn validate_quantity(quantity: Option<&i32>) -> Result<(), ValidationError> {
    match quantity {
        Some(quantity) if *quantity >= 1 => Ok(()),
        _ => Err(error("greater_than_or_equal_to", "must be greater than or equal to 1")),
    }
}

pub fn validate_unit_price(unit_price: Option<&Decimal>) -> Result<(), ValidationError> {
    match unit_price {
        Some(price) if *price >= Decimal::ZERO => Ok(()),
        _ => Err(error("greater_than_or_equal_to", "must be greater than or equal to 0")),
    }
}

/// Records a failed rule under `field`; rules never short-circuit each other.
pub fn collect(
    errors: &mut ValidationErrors,
    field: &'static str,
    result: Result<(), ValidationError>,
) {
    if let Err(err) = result {
        errors.add(field, err);
    }
}

pub fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
