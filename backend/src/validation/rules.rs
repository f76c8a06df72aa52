//! Common validation rules shared across request payloads.

use rust_decimal::Decimal;
use validator::ValidationError;

/// Money columns are `NUMERIC(12, 2)`.
const MONEY_SCALE: u32 = 2;
const MAX_MONEY_CENTS: i64 = 999_999_999_999;

/// Validates username format.
///
/// Requirements:
/// - Only alphanumeric characters, underscores, dots and dashes
/// - 3-50 characters in length
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.len() < 3 || username.len() > 50 {
        return Err(ValidationError::new("username_invalid_length"));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ValidationError::new("username_invalid_characters"));
    }

    Ok(())
}

/// Validates a payment card number: 12-19 digits, spaces and dashes ignored.
pub fn validate_card_number(number: &str) -> Result<(), ValidationError> {
    let digits: String = number.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("card_number_invalid"));
    }
    Ok(())
}

/// Validates a card expiry in `MM/YY` form.
pub fn validate_card_expiry(expiry: &str) -> Result<(), ValidationError> {
    let Some((month, year)) = expiry.trim().split_once('/') else {
        return Err(ValidationError::new("card_expiry_invalid_format"));
    };
    let month_ok = month.len() == 2 && matches!(month.parse::<u8>(), Ok(1..=12));
    let year_ok = year.len() == 2 && year.chars().all(|c| c.is_ascii_digit());
    if !(month_ok && year_ok) {
        return Err(ValidationError::new("card_expiry_invalid_format"));
    }
    Ok(())
}

/// Rejects strings that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Validates an amount of money: not negative, at most two decimal places,
/// and small enough for the money columns.
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("money_negative"));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::new("money_too_precise"));
    }
    if *value > Decimal::new(MAX_MONEY_CENTS, MONEY_SCALE) {
        return Err(ValidationError::new("money_too_large"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_rejects_negative_fractional_cents_and_overflow() {
        let money = |text: &str| validate_money(&text.parse::<Decimal>().unwrap());
        assert!(money("0").is_ok());
        assert!(money("19.90").is_ok());
        assert!(money("19.900").is_ok());
        assert!(money("9999999999.99").is_ok());
        assert!(money("-0.01").is_err());
        assert!(money("19.999").is_err());
        assert!(money("10000000000").is_err());
    }

    #[test]
    fn username_rejects_short_names() {
        assert!(validate_username("ab").is_err());
    }

    #[test]
    fn username_rejects_special_chars() {
        assert!(validate_username("user@name").is_err());
    }

    #[test]
    fn username_accepts_valid() {
        assert!(validate_username("glow.getter_01").is_ok());
    }

    #[test]
    fn card_number_accepts_grouped_digits() {
        assert!(validate_card_number("4111 1111 1111 1111").is_ok());
        assert!(validate_card_number("4111-1111-1111-1111").is_ok());
    }

    #[test]
    fn card_number_rejects_letters_and_short_input() {
        assert!(validate_card_number("4111 1111 abcd").is_err());
        assert!(validate_card_number("12345").is_err());
    }

    #[test]
    fn card_expiry_requires_month_and_two_digit_year() {
        assert!(validate_card_expiry("09/27").is_ok());
        assert!(validate_card_expiry("13/27").is_err());
        assert!(validate_card_expiry("0927").is_err());
        assert!(validate_card_expiry("9/2027").is_err());
    }

    #[test]
    fn blank_values_are_rejected() {
        assert!(validate_not_blank("  ").is_err());
        assert!(validate_not_blank("12 Orchard Rd").is_ok());
    }
}
