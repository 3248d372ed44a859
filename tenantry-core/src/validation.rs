//! Tenancy name validation

use crate::{TenantryResult, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;

/// Tenancy names start with a letter, followed by at least one letter,
/// digit, underscore or hyphen.
pub const TENANCY_NAME_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9_-]{1,}$";

static TENANCY_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(TENANCY_NAME_PATTERN).expect("tenancy name pattern is a valid regex")
});

/// Validate a tenancy name against the naming pattern and a maximum length.
pub fn validate_tenancy_name(tenancy_name: &str, max_length: usize) -> TenantryResult<()> {
    if tenancy_name.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "tenancy_name".to_string(),
        }
        .into());
    }

    if tenancy_name.chars().count() > max_length {
        return Err(ValidationError::InvalidTenancyName {
            tenancy_name: tenancy_name.to_string(),
            reason: format!("must be at most {} characters", max_length),
        }
        .into());
    }

    if !TENANCY_NAME_REGEX.is_match(tenancy_name) {
        return Err(ValidationError::InvalidTenancyName {
            tenancy_name: tenancy_name.to_string(),
            reason: format!("must match {}", TENANCY_NAME_PATTERN),
        }
        .into());
    }

    Ok(())
}
