//! # Name Validation
//!
//! Names follow the Terraform registry grammar. A name never contains `/`,
//! so the derived identifiers and storage keys are unambiguous.

use std::sync::OnceLock;

use regex::Regex;

use super::errors::{RegistryError, RegistryResult};
use super::model::Level;

const SEGMENT_PATTERN: &str = r"^[0-9A-Za-z](?:[0-9A-Za-z_-]{0,62}[0-9A-Za-z])?$";
const VERSION_PATTERN: &str = r"^[0-9A-Za-z][0-9A-Za-z._+-]{0,127}$";

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SEGMENT_PATTERN).expect("static pattern"))
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_PATTERN).expect("static pattern"))
}

/// Validate a name for the given level
pub fn validate(level: Level, name: &str) -> RegistryResult<()> {
    let invalid = |reason: &str| RegistryError::InvalidName {
        level,
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.contains('/') {
        return Err(invalid("name must not contain '/'"));
    }

    let (re, reason) = match level {
        Level::Version => (
            version_regex(),
            "use letters, digits, '.', '_', '+' or '-' (max 128 characters)",
        ),
        _ => (
            segment_regex(),
            "use letters, digits, '_' or '-', starting and ending alphanumeric (max 64 characters)",
        ),
    };

    if re.is_match(name) {
        Ok(())
    } else {
        Err(invalid(reason))
    }
}

/// Validate a namespace owner
pub fn validate_owner(owner: &str) -> RegistryResult<()> {
    if owner.trim().is_empty() {
        Err(RegistryError::InvalidOwner("owner must not be empty".to_string()))
    } else {
        Ok(())
    }
}
