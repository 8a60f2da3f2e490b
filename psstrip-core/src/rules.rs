//! The rule table: what happens to each file.
//!
//! Rules are kept in one ordered `Vec` built from the rule set's groups in a
//! fixed order: COPY, REPLACE, SKIP, STRIP. Classification is a linear scan
//! over that vector and the first rule whose pattern matches the file's base
//! name decides the action. Files that match nothing get the rule set's
//! default action.
//!
//! License: GPL-3.0-or-later

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::RuleSetConfig;
use crate::errors::{Result, StripError};
use crate::mapping::MappingIndex;
use crate::sanitizers::compiler::{compile_literal, compile_name_pattern};
use crate::sanitizers::stripper::Substitution;

/// What to do with a classified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Copy,
    Skip,
    Replace,
    Strip,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Action::Copy => "copy",
            Action::Skip => "skip",
            Action::Replace => "replace",
            Action::Strip => "strip",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name_pattern: Regex,
    pub action: Action,
    /// Empty for every action except STRIP.
    pub substitutions: Arc<Vec<Substitution>>,
}

impl Rule {
    pub fn matches(&self, basename: &str) -> bool {
        self.name_pattern.is_match(basename)
    }
}

/// Result of classifying one base name.
#[derive(Debug, Clone, Copy)]
pub enum Classification<'a> {
    Matched(&'a Rule),
    /// No rule matched; the table's default action applies.
    Default(Action),
}

impl Classification<'_> {
    pub fn action(&self) -> Action {
        match self {
            Classification::Matched(rule) => rule.action,
            Classification::Default(action) => *action,
        }
    }

    pub fn substitutions(&self) -> &[Substitution] {
        match self {
            Classification::Matched(rule) => &rule.substitutions,
            Classification::Default(_) => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    default_action: Action,
}

impl RuleTable {
    /// Builds the ordered table for a rule set and a mapping index.
    ///
    /// Every STRIP rule's substitution list is the identity substitutions
    /// (user names, user ids, workgroups if the rule asks) followed by the
    /// rule's own literal substitutions.
    pub fn build(config: &RuleSetConfig, mapping: &MappingIndex) -> Result<Self> {
        let mut rules = Vec::new();
        let mut errors = Vec::new();
        let none = Arc::new(Vec::new());

        let groups = [
            (Action::Copy, &config.copy),
            (Action::Replace, &config.replace),
            (Action::Skip, &config.skip),
        ];
        for (action, patterns) in groups {
            for pattern in patterns {
                match compile_name_pattern(pattern) {
                    Ok(name_pattern) => rules.push(Rule {
                        name_pattern,
                        action,
                        substitutions: Arc::clone(&none),
                    }),
                    Err(e) => errors.push(format!("{} rule '{}': {}", action, pattern, e)),
                }
            }
        }

        for strip in &config.strip {
            let name_pattern = match compile_name_pattern(&strip.pattern) {
                Ok(re) => re,
                Err(e) => {
                    errors.push(format!("strip rule '{}': {}", strip.pattern, e));
                    continue;
                }
            };
            let mut substitutions = mapping.identity_substitutions(strip.workgroups);
            substitutions.extend(literal_substitutions(config, &strip.substitutions)?);
            debug!(
                "Strip rule '{}' carries {} substitutions.",
                strip.pattern,
                substitutions.len()
            );
            rules.push(Rule {
                name_pattern,
                action: Action::Strip,
                substitutions: Arc::new(substitutions),
            });
        }

        if !errors.is_empty() {
            return Err(StripError::Pattern(errors.join("\n")));
        }

        debug!("Rule table built with {} rules.", rules.len());
        Ok(Self {
            rules,
            default_action: config.default_action,
        })
    }

    /// Classifies a file by its base name; the first matching rule wins.
    pub fn classify(&self, basename: &str) -> Classification<'_> {
        for rule in &self.rules {
            if rule.matches(basename) {
                return Classification::Matched(rule);
            }
        }
        Classification::Default(self.default_action)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn default_action(&self) -> Action {
        self.default_action
    }
}

/// Full substitution list for emitted identity records.
pub fn identity_record_substitutions(
    config: &RuleSetConfig,
    mapping: &MappingIndex,
) -> Result<Vec<Substitution>> {
    let mut substitutions = mapping.identity_substitutions(config.identity_record.workgroups);
    substitutions.extend(literal_substitutions(
        config,
        &config.identity_record.substitutions,
    )?);
    Ok(substitutions)
}

fn literal_substitutions(config: &RuleSetConfig, names: &[String]) -> Result<Vec<Substitution>> {
    names
        .iter()
        .map(|name| {
            let literal = config.literal(name).ok_or_else(|| {
                StripError::Pattern(format!("reference to unknown substitution '{}'", name))
            })?;
            compile_literal(literal)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RepositoryVersion, StripRuleConfig};

    fn table(config: &RuleSetConfig) -> RuleTable {
        RuleTable::build(config, &MappingIndex::default()).unwrap()
    }

    #[test]
    fn groups_are_ordered_copy_replace_skip_strip() {
        let config = RuleSetConfig {
            copy: vec!["c".into()],
            replace: vec!["r".into()],
            skip: vec!["s".into()],
            strip: vec![StripRuleConfig {
                pattern: "x".into(),
                workgroups: false,
                substitutions: vec![],
            }],
            ..Default::default()
        };
        let actions: Vec<Action> = table(&config).rules().iter().map(|r| r.action).collect();
        assert_eq!(actions, vec![Action::Copy, Action::Replace, Action::Skip, Action::Strip]);
    }

    #[test]
    fn first_matching_rule_wins() {
        let config = RuleSetConfig {
            skip: vec![r"\.xml$".into()],
            strip: vec![StripRuleConfig {
                pattern: r"^docinfo\.xml$".into(),
                workgroups: false,
                substitutions: vec![],
            }],
            ..Default::default()
        };
        assert_eq!(table(&config).classify("docinfo.xml").action(), Action::Skip);
    }

    #[test]
    fn versioned_settings_backup_is_skipped_not_copied() {
        let config = RuleSetConfig::load_embedded(RepositoryVersion::V5).unwrap();
        let t = table(&config);
        assert_eq!(t.classify("settings.xml").action(), Action::Copy);
        assert_eq!(t.classify("settings.xml.backup-2.0").action(), Action::Skip);
    }

    #[test]
    fn embedded_5x_classification() {
        let config = RuleSetConfig::load_embedded(RepositoryVersion::V5).unwrap();
        let t = table(&config);
        let cases = [
            ("id-values.xml", Action::Copy),
            ("content.txt", Action::Replace),
            ("database.xml", Action::Skip),
            ("submitted.pdf", Action::Skip),
            ("thumbnail.png", Action::Skip),
            ("page-01.PNG", Action::Skip),
            ("events.log.migrated", Action::Skip),
            ("log.xml.migrated", Action::Skip),
            ("docinfo.update-to-3.3.xml", Action::Skip),
            ("docinfo.xml", Action::Strip),
            ("DOCINFO.XML", Action::Strip),
            ("signature-001.xml", Action::Strip),
            ("events.txt", Action::Strip),
            ("workgroups.xml", Action::Strip),
            ("unknown.bin", Action::Skip),
        ];
        for (name, expected) in cases {
            assert_eq!(t.classify(name).action(), expected, "classifying {}", name);
        }
    }

    #[test]
    fn embedded_4_8_copies_workgroups() {
        let config = RuleSetConfig::load_embedded(RepositoryVersion::V4_8).unwrap();
        let t = table(&config);
        assert_eq!(t.classify("workgroups.xml").action(), Action::Copy);
        assert_eq!(t.classify("events.log").action(), Action::Strip);
        assert_eq!(t.classify("log.xml").action(), Action::Strip);
    }

    #[test]
    fn unmatched_files_take_the_default_action() {
        let config = RuleSetConfig {
            default_action: Action::Copy,
            ..Default::default()
        };
        assert!(matches!(
            table(&config).classify("anything"),
            Classification::Default(Action::Copy)
        ));
    }

    #[test]
    fn strip_rules_append_literals_after_identities() {
        let config = RuleSetConfig::load_embedded(RepositoryVersion::V5).unwrap();
        let t = table(&config);
        let binding = t.classify("docinfo.xml");
        let subs = binding.substitutions();
        let names: Vec<&str> = subs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["summary", "text", "metadata"]);
    }

    #[test]
    fn bad_name_pattern_is_a_pattern_error() {
        let config = RuleSetConfig {
            copy: vec!["(".into()],
            ..Default::default()
        };
        let err = RuleTable::build(&config, &MappingIndex::default()).unwrap_err();
        assert!(matches!(err, StripError::Pattern(_)));
    }
}
