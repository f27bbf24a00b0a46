use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{10,13}$").unwrap());

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

static METER_SERIAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9-]{4,32}$").unwrap());

pub fn validate_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn validate_meter_serial(serial: &str) -> bool {
    METER_SERIAL_REGEX.is_match(serial)
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+79261234567"));
        assert!(validate_phone("9876543210"));
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("phone"));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@gms.example"));
        assert!(validate_email("user.name@domain.co"));
        assert!(!validate_email("invalid"));
        assert!(!validate_email("@example.com"));
    }

    #[test]
    fn test_validate_meter_serial() {
        assert!(validate_meter_serial("GMS-00123"));
        assert!(validate_meter_serial("A1B2C3D4"));
        assert!(!validate_meter_serial("abc"));
        assert!(!validate_meter_serial("X Y Z"));
    }
}
