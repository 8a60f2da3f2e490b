//! compiler.rs - Compiles rule-set patterns and identity tokens into regexes.
//!
//! File-name patterns compile to `regex::Regex` and are always
//! case-insensitive. Content patterns compile to `regex::bytes::Regex` so that
//! files which are not valid UTF-8 can still be stripped.
//!
//! License: GPL-3.0-or-later

use log::debug;
use regex::bytes::{Regex as BytesRegex, RegexBuilder as BytesRegexBuilder};
use regex::{Regex, RegexBuilder};

use crate::config::LiteralSubstitution;
use crate::errors::{Result, StripError};
use crate::sanitizers::stripper::Substitution;

/// Compiled regex size limit (10 MB).
const SIZE_LIMIT: usize = 10 * (1 << 20);

/// Characters that may not touch an identity token on either side.
const TOKEN_CHAR_CLASS: &str = r"\p{L}\p{N}";

/// Compiles a file-name pattern, matched case-insensitively.
pub fn compile_name_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(SIZE_LIMIT)
        .build()
}

/// Compiles a content pattern.
pub fn compile_content_pattern(
    pattern: &str,
    case_insensitive: bool,
) -> Result<BytesRegex, regex::Error> {
    BytesRegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .size_limit(SIZE_LIMIT)
        .build()
}

/// Builds the pattern matching `original` as a delimited token.
///
/// The token must be preceded by the start of text or a character that is not
/// a letter or number, and followed by the end of text or such a character.
/// Only the token itself is captured (group 1).
pub fn token_pattern(original: &str) -> String {
    format!(
        "(?:^|[^{class}])({token})(?:[^{class}]|$)",
        class = TOKEN_CHAR_CLASS,
        token = regex::escape(original)
    )
}

/// Compiles the case-insensitive substitution for one identity token.
pub fn compile_token(name: &str, original: &str, replacement: &str) -> Result<Substitution> {
    let pattern = token_pattern(original);
    let regex = compile_content_pattern(&pattern, true)
        .map_err(|e| StripError::Pattern(format!("{}: {}", name, e)))?;
    Ok(Substitution::new(name, regex, replacement))
}

/// Compiles a named literal substitution from the rule set.
pub fn compile_literal(literal: &LiteralSubstitution) -> Result<Substitution> {
    let regex = compile_content_pattern(&literal.pattern, false)
        .map_err(|e| StripError::Pattern(format!("substitution '{}': {}", literal.name, e)))?;
    debug!(
        target: "psstrip_core::sanitizer",
        "Substitution '{}' compiled successfully.",
        literal.name
    );
    Ok(Substitution::new(&literal.name, regex, &literal.replace_with))
}

/// Compiles every `(label, pattern)` pair and reports all failures together.
pub fn check_patterns(patterns: &[(String, String)]) -> Result<()> {
    debug!("Checking {} patterns.", patterns.len());
    let errors: Vec<String> = patterns
        .iter()
        .filter_map(|(label, pattern)| {
            BytesRegexBuilder::new(pattern)
                .size_limit(SIZE_LIMIT)
                .build()
                .err()
                .map(|e| format!("{}: {}", label, e))
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(StripError::Pattern(format!(
            "Failed to compile {} pattern(s):\n{}",
            errors.len(),
            errors.join("\n")
        )))
    }
}
