//! Rule-set configuration for `psstrip-core`.
//!
//! A rule set describes, for one repository format version, which files are
//! copied, replaced, skipped or stripped, which literal field substitutions
//! apply to stripped files, and where identity records live. Rule sets are YAML
//! documents; the versions shipped with the crate are embedded at compile time
//! and a custom file can be loaded instead.
//!
//! License: GPL-3.0-or-later

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{Result, StripError};
use crate::rules::Action;
use crate::sanitizers::compiler::check_patterns;

/// Maximum allowed length for a configured pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

const EMBEDDED_V4_8: &str = include_str!("../config/patentsafe-4.8.yaml");
const EMBEDDED_V5: &str = include_str!("../config/patentsafe-5.x.yaml");

/// Repository format versions with an embedded rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepositoryVersion {
    /// 4.8 repositories: separate `events.log` and `log.xml`, workgroups copied as-is.
    V4_8,
    /// 5.x repositories: merged `events.txt`, workgroup names stripped.
    #[default]
    V5,
}

impl RepositoryVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryVersion::V4_8 => "4.8",
            RepositoryVersion::V5 => "5.x",
        }
    }
}

impl fmt::Display for RepositoryVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepositoryVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "4" | "4.8" => Ok(RepositoryVersion::V4_8),
            "5" | "5.x" | "5.0" | "5.1" => Ok(RepositoryVersion::V5),
            other => Err(format!("unknown repository version '{}' (expected 4.8 or 5.x)", other)),
        }
    }
}

/// Where identity records live inside a repository, relative to its root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Layout {
    pub users_dir: PathBuf,
    pub workgroups_file: PathBuf,
    /// Fixed, non-bucketed output path of the reserved installer record.
    pub installer_record: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            users_dir: PathBuf::from("data/users"),
            workgroups_file: PathBuf::from("data/config/workgroups.xml"),
            installer_record: PathBuf::from("data/users/installer/installer.xml"),
        }
    }
}

/// A named literal substitution, e.g. blanking the body of `<summary>`.
///
/// When the pattern has a capture group, only group 1 is replaced and the
/// rest of the match is written back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LiteralSubstitution {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub pattern: String,
    pub replace_with: String,
}

/// A STRIP rule: file-name pattern plus the substitutions layered on top of
/// the identity mappings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StripRuleConfig {
    pub pattern: String,
    /// Include workgroup-name mappings for this file type.
    #[serde(default)]
    pub workgroups: bool,
    /// Names of entries in [`RuleSetConfig::substitutions`], applied in order.
    #[serde(default)]
    pub substitutions: Vec<String>,
}

/// Substitutions used when emitting user records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityRecordConfig {
    pub workgroups: bool,
    pub substitutions: Vec<String>,
}

/// A complete, versioned rule set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleSetConfig {
    pub version: String,
    pub layout: Layout,
    pub reserved_user: String,
    pub reserved_workgroup: String,
    /// Written as the whole content of REPLACE files.
    pub placeholder: String,
    /// Action for files no rule matches.
    pub default_action: Action,
    pub excluded_dirs: Vec<String>,
    /// Basenames stripped line by line instead of whole-file.
    pub line_oriented: Vec<String>,
    pub substitutions: Vec<LiteralSubstitution>,
    pub copy: Vec<String>,
    pub replace: Vec<String>,
    pub skip: Vec<String>,
    pub strip: Vec<StripRuleConfig>,
    pub identity_record: IdentityRecordConfig,
}

impl Default for RuleSetConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            layout: Layout::default(),
            reserved_user: "installer".to_string(),
            reserved_workgroup: "Admin".to_string(),
            placeholder: "~content replaced by psstrip~".to_string(),
            default_action: Action::Skip,
            excluded_dirs: Vec::new(),
            line_oriented: Vec::new(),
            substitutions: Vec::new(),
            copy: Vec::new(),
            replace: Vec::new(),
            skip: Vec::new(),
            strip: Vec::new(),
            identity_record: IdentityRecordConfig::default(),
        }
    }
}

impl RuleSetConfig {
    /// Loads and validates a rule set from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading rule set from: {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| StripError::io(path, e))?;
        let config = Self::from_yaml(&text, path)?;
        info!(
            "Loaded rule set version '{}' from {}.",
            config.version,
            path.display()
        );
        Ok(config)
    }

    /// Loads one of the rule sets embedded in the crate.
    pub fn load_embedded(version: RepositoryVersion) -> Result<Self> {
        debug!("Loading embedded rule set for version {}", version);
        let text = match version {
            RepositoryVersion::V4_8 => EMBEDDED_V4_8,
            RepositoryVersion::V5 => EMBEDDED_V5,
        };
        Self::from_yaml(text, format!("<embedded {}>", version))
    }

    fn from_yaml(text: &str, origin: impl AsRef<Path>) -> Result<Self> {
        let origin = origin.as_ref();
        let config: RuleSetConfig = serde_yml::from_str(text).map_err(|e| {
            StripError::configuration(origin, format!("failed to parse rule set: {}", e))
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Looks up a literal substitution by name.
    pub fn literal(&self, name: &str) -> Option<&LiteralSubstitution> {
        self.substitutions.iter().find(|s| s.name == name)
    }

    /// Checks names, references and patterns, reporting every problem at once.
    pub fn validate(&self, origin: &Path) -> Result<()> {
        let mut errors = Vec::new();
        let mut names = HashSet::new();

        if self.reserved_user.is_empty() || self.reserved_workgroup.is_empty() {
            errors.push("reserved_user and reserved_workgroup must not be empty.".to_string());
        }

        for sub in &self.substitutions {
            if sub.name.is_empty() {
                errors.push("A substitution has an empty `name` field.".to_string());
            } else if !names.insert(sub.name.as_str()) {
                errors.push(format!("Duplicate substitution name found: '{}'.", sub.name));
            }
        }

        let references = self
            .strip
            .iter()
            .flat_map(|r| r.substitutions.iter())
            .chain(self.identity_record.substitutions.iter());
        for name in references {
            if !names.contains(name.as_str()) {
                errors.push(format!("Reference to unknown substitution '{}'.", name));
            }
        }

        let patterns = self.named_patterns();
        for (label, pattern) in &patterns {
            if pattern.is_empty() {
                errors.push(format!("{} has an empty pattern.", label));
            } else if pattern.len() > MAX_PATTERN_LENGTH {
                errors.push(format!(
                    "{}: pattern length ({}) exceeds maximum allowed ({}).",
                    label,
                    pattern.len(),
                    MAX_PATTERN_LENGTH
                ));
            }
        }

        if !errors.is_empty() {
            return Err(StripError::configuration(
                origin,
                format!("rule set validation failed:\n{}", errors.join("\n")),
            ));
        }

        check_patterns(&patterns)?;

        for sub in &self.substitutions {
            if let Ok(re) = regex::Regex::new(&sub.pattern) {
                if re.captures_len() > 2 {
                    warn!(
                        "Substitution '{}' has {} capture groups; only group 1 is replaced.",
                        sub.name,
                        re.captures_len() - 1
                    );
                }
            }
        }
        Ok(())
    }

    fn named_patterns(&self) -> Vec<(String, String)> {
        let groups = [("copy", &self.copy), ("replace", &self.replace), ("skip", &self.skip)];
        let mut out: Vec<(String, String)> = groups
            .iter()
            .flat_map(|(group, patterns)| {
                patterns
                    .iter()
                    .enumerate()
                    .map(move |(i, p)| (format!("{} rule #{}", group, i + 1), p.clone()))
            })
            .collect();
        out.extend(
            self.strip
                .iter()
                .enumerate()
                .map(|(i, r)| (format!("strip rule #{}", i + 1), r.pattern.clone())),
        );
        out.extend(
            self.substitutions
                .iter()
                .map(|s| (format!("substitution '{}'", s.name), s.pattern.clone())),
        );
        out
    }
}
