// Custom validator functions shared by request DTOs

use validator::ValidationError;

/// Password policy: at least 12 characters, with at least one lowercase
/// letter, one uppercase letter, one digit, and one symbol.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= 12;
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    if long_enough && has_lower && has_upper && has_digit && has_symbol {
        Ok(())
    } else {
        let mut err = ValidationError::new("weak_password");
        err.message = Some(
            "Password must be at least 12 characters and contain lowercase, \
             uppercase, digit, and symbol characters."
                .into(),
        );
        Err(err)
    }
}
