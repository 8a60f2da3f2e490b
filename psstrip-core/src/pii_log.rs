// psstrip-core/src/pii_log.rs
//! Logging helpers that keep original identities out of log output.
//!
//! Loading and mapping identities is worth tracing, but the log of a
//! sanitizing run must not itself become a leak. Original names and ids are
//! masked unless `PSSTRIP_ALLOW_DEBUG_PII=true` is set in the environment.

use log::{debug, info};
use once_cell::sync::Lazy;

static PII_LOGGING_ALLOWED: Lazy<bool> = Lazy::new(|| {
    std::env::var("PSSTRIP_ALLOW_DEBUG_PII")
        .map(|s| s.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
});

/// Masks a sensitive value, keeping only its length for long values.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.chars().count() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.chars().count())
    }
}

fn loggable(sensitive: &str) -> String {
    if *PII_LOGGING_ALLOWED {
        sensitive.to_string()
    } else {
        redact_sensitive(sensitive)
    }
}

/// Logs a loaded identity as `original -> alias`.
pub fn log_identity_loaded(kind: &str, original: &str, anon_id: &str, anon_name: &str) {
    info!(" - loaded {} {} as {} [{}]", kind, loggable(original), anon_name, anon_id);
}

/// Logs a reserved identity that is kept out of the mapping lists.
pub fn log_identity_reserved(kind: &str, original: &str) {
    info!(" - loaded reserved {} '{}' (not mapped)", kind, original);
}

/// Logs one mapping entry at debug level.
pub fn log_mapping_debug(category: &str, original: &str, replacement: &str) {
    debug!(
        "Mapping [{}]: '{}' -> '{}'",
        category,
        loggable(original),
        replacement
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_values_are_fully_masked() {
        assert_eq!(redact_sensitive("holmes"), "[REDACTED]");
    }

    #[test]
    fn long_values_keep_only_length() {
        assert_eq!(redact_sensitive("Sherlock Holmes"), "[REDACTED: 15 chars]");
    }
}
