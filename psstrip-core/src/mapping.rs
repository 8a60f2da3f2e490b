//! The mapping index: original identifier -> alias substitutions.
//!
//! Three ordered lists are built from the registries: user names, user ids
//! and workgroup names, each in discovery order. They are always applied in
//! that category order. Names go first because they are the longer tokens
//! and may contain an id (`holmes` inside `Sherlock Holmes`); once names are
//! gone the id pass only sees already-anonymized text.
//!
//! License: GPL-3.0-or-later

use crate::errors::Result;
use crate::identity::{UserRegistry, WorkgroupRegistry};
use crate::pii_log::log_mapping_debug;
use crate::sanitizers::compiler::compile_token;
use crate::sanitizers::stripper::Substitution;

/// One original identifier and the substitution that replaces it.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub original: String,
    pub replacement: String,
    pub substitution: Substitution,
}

impl MappingEntry {
    fn build(category: &str, original: &str, replacement: &str) -> Result<Self> {
        let substitution = compile_token(&format!("{}:{}", category, replacement), original, replacement)?;
        log_mapping_debug(category, original, replacement);
        Ok(Self {
            original: original.to_string(),
            replacement: replacement.to_string(),
            substitution,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MappingIndex {
    pub user_names: Vec<MappingEntry>,
    pub user_ids: Vec<MappingEntry>,
    pub workgroup_names: Vec<MappingEntry>,
}

impl MappingIndex {
    /// Builds the index; reserved identities are left out.
    ///
    /// Every identifier is mapped in its decoded spelling and, when the record
    /// escapes it differently, in its escaped spelling as well.
    pub fn build(users: &UserRegistry, workgroups: &WorkgroupRegistry) -> Result<Self> {
        let user_names = users
            .mapped()
            .flat_map(|u| {
                spellings(&u.display_name, &u.escaped_name)
                    .map(move |s| MappingEntry::build("user-name", s, &u.anon_name))
            })
            .collect::<Result<Vec<_>>>()?;
        let user_ids = users
            .mapped()
            .flat_map(|u| {
                spellings(&u.original_id, &u.escaped_id).map(move |s| MappingEntry::build("user-id", s, &u.anon_id))
            })
            .collect::<Result<Vec<_>>>()?;
        let workgroup_names = workgroups
            .mapped()
            .flat_map(|w| {
                spellings(&w.display_name, &w.escaped_name)
                    .map(move |s| MappingEntry::build("workgroup", s, &w.anon_name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            user_names,
            user_ids,
            workgroup_names,
        })
    }

    /// Substitutions for identities in application order: user names, user
    /// ids, then (optionally) workgroup names.
    pub fn identity_substitutions(&self, include_workgroups: bool) -> Vec<Substitution> {
        let workgroups: &[MappingEntry] = if include_workgroups {
            &self.workgroup_names
        } else {
            &[]
        };
        self.user_names
            .iter()
            .chain(self.user_ids.iter())
            .chain(workgroups.iter())
            .map(|e| e.substitution.clone())
            .collect()
    }

    /// Alias assigned to an original user id, if it is mapped.
    pub fn user_alias(&self, original_id: &str) -> Option<&str> {
        self.user_ids
            .iter()
            .find(|e| e.original == original_id)
            .map(|e| e.replacement.as_str())
    }

    pub fn len(&self) -> usize {
        self.user_names.len() + self.user_ids.len() + self.workgroup_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The decoded spelling, then the escaped one if it differs.
fn spellings<'a>(decoded: &'a str, escaped: &'a str) -> impl Iterator<Item = &'a str> {
    std::iter::once(decoded).chain((escaped != decoded).then_some(escaped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_spelling_follows_decoded_one() {
        let all: Vec<&str> = spellings("O'Hara & Co", "O&apos;Hara &amp; Co").collect();
        assert_eq!(all, vec!["O'Hara & Co", "O&apos;Hara &amp; Co"]);
        assert_eq!(spellings("holmes", "holmes").count(), 1);
    }
}
