//! Custom `validator` rules, grounded on
//! `original_source/internal/core/domain/validation.go`'s hand-registered
//! `go-playground/validator` tags (`saudiphonenumber`, `serialnum`,
//! `saudilat`, `saudilon`).

use validator::ValidationError;

use crate::geo::{SA_MAX_LAT, SA_MAX_LON, SA_MIN_LAT, SA_MIN_LON};

/// `^\+?966[5-9][0-9]{8}$`
pub fn saudi_phone_number(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let digits = digits.strip_prefix("966").unwrap_or(digits);
    let valid = phone.strip_prefix('+').unwrap_or(phone).starts_with("966")
        && digits.len() == 9
        && digits.as_bytes().first().is_some_and(|b| (b'5'..=b'9').contains(b))
        && digits.bytes().all(|b| b.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("saudiphonenumber"))
    }
}

/// `^[a-zA-Z0-9_-]{3,50}$`
pub fn serial_number(value: &str) -> Result<(), ValidationError> {
    let valid = (3..=50).contains(&value.len())
        && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("serialnum"))
    }
}

pub fn saudi_lat(lat: f64) -> Result<(), ValidationError> {
    if (SA_MIN_LAT..=SA_MAX_LAT).contains(&lat) {
        Ok(())
    } else {
        Err(ValidationError::new("saudilat"))
    }
}

pub fn saudi_lon(lon: f64) -> Result<(), ValidationError> {
    if (SA_MIN_LON..=SA_MAX_LON).contains(&lon) {
        Ok(())
    } else {
        Err(ValidationError::new("saudilon"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_valid_saudi_mobile_number() {
        assert!(saudi_phone_number("+966512345678").is_ok());
        assert!(saudi_phone_number("966512345678").is_ok());
    }

    #[test]
    fn rejects_a_non_saudi_number() {
        assert!(saudi_phone_number("+15551234567").is_err());
    }

    #[test]
    fn rejects_the_wrong_leading_digit() {
        // must start 5-9 after the 966 prefix
        assert!(saudi_phone_number("+966412345678").is_err());
    }

    #[test]
    fn serial_number_rejects_too_short() {
        assert!(serial_number("AB").is_err());
        assert!(serial_number("SN000001").is_ok());
    }

    #[test]
    fn lat_lon_boundaries() {
        assert!(saudi_lat(16.0).is_ok());
        assert!(saudi_lat(32.0).is_ok());
        assert!(saudi_lat(15.999).is_err());
        assert!(saudi_lon(34.0).is_ok());
        assert!(saudi_lon(56.0).is_ok());
        assert!(saudi_lon(56.001).is_err());
    }
}
