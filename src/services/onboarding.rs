//! Onboarding validation and completion
//!
//! Validates the name/domain pair entered during onboarding and derives the
//! username persisted for the session.

use tracing::info;

use crate::prefs::PrefStore;
use crate::types::error::Result;

/// Error message for a missing name or malformed domain
pub const INVALID_INPUT: &str = "Please enter a valid name and domain.";

/// Error message for a reserved name
pub const NAME_UNAVAILABLE: &str = "This name is not available.";

/// Validate onboarding input, returning the derived username
///
/// The name must be non-empty, the domain must contain a dot, and the name
/// "admin" is reserved (case-insensitive). The username is the plain
/// concatenation of name and domain; the domain input is expected to carry
/// its leading "@" (it is prefilled as "@example.com").
pub fn validate(name: &str, domain: &str) -> std::result::Result<String, &'static str> {
    if name.is_empty() || !domain.contains('.') {
        return Err(INVALID_INPUT);
    }
    if name.eq_ignore_ascii_case("admin") {
        return Err(NAME_UNAVAILABLE);
    }
    Ok(format!("{}{}", name, domain))
}

/// Persist the derived username and mark onboarding as completed
pub fn complete(store: &PrefStore, username: &str) -> Result<()> {
    info!("Completing onboarding for: {}", username);

    let mut prefs = store.load();
    prefs.username = username.to_string();
    prefs.onboarding_complete = true;
    store.save(&prefs)
}
