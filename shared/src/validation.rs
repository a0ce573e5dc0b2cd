//! Validation helpers for season and account input

/// Validate a farmer name: non-empty after trimming.
pub fn validate_farmer_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Farmer name is required");
    }
    Ok(())
}

/// Validate a cultivated area in hectares.
///
/// Zero is allowed: records without a measured area are stored with 0 and
/// excluded from per-hectare computations downstream.
pub fn validate_area(area: f64) -> Result<(), &'static str> {
    if !area.is_finite() {
        return Err("Area must be a number");
    }
    if area < 0.0 {
        return Err("Area cannot be negative");
    }
    Ok(())
}

/// Validate a yield value in tons.
pub fn validate_yield(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() {
        return Err("Yield must be a number");
    }
    if value < 0.0 {
        return Err("Yield cannot be negative");
    }
    Ok(())
}

/// Validate a username: non-empty, no whitespace.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let username = username.trim();
    if username.is_empty() {
        return Err("Username is required");
    }
    if username.chars().any(char::is_whitespace) {
        return Err("Username cannot contain spaces");
    }
    Ok(())
}

/// Validate a password: at least 6 characters.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 6 {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farmer_name_rejects_blank() {
        assert!(validate_farmer_name("Nguyễn Văn A").is_ok());
        assert!(validate_farmer_name("   ").is_err());
    }

    #[test]
    fn area_accepts_zero_rejects_negative_and_nan() {
        assert!(validate_area(0.0).is_ok());
        assert!(validate_area(2.5).is_ok());
        assert!(validate_area(-1.0).is_err());
        assert!(validate_area(f64::NAN).is_err());
    }

    #[test]
    fn yield_value_bounds() {
        assert!(validate_yield(0.0).is_ok());
        assert!(validate_yield(11.5).is_ok());
        assert!(validate_yield(-0.1).is_err());
        assert!(validate_yield(f64::INFINITY).is_err());
    }

    #[test]
    fn username_and_password_rules() {
        assert!(validate_username("farmer01").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("two words").is_err());
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("short").is_err());
    }
}
