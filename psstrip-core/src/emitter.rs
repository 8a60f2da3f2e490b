//! Writes anonymized user records after the tree walk.
//!
//! Each mapped user lands at `<users_dir>/<a[0..2]>/<a[2..4]>/<a>/<a>.xml`
//! where `a` is its anonymous id, e.g. `data/users/us/er/user3/user3.xml`.
//! The reserved installer record goes to the rule set's fixed
//! `installer_record` path. Workgroups are not emitted here.
//!
//! License: GPL-3.0-or-later

use log::info;
use std::path::{Path, PathBuf};

use crate::config::RuleSetConfig;
use crate::copier::RunContext;
use crate::errors::Result;
use crate::identity::{Identity, UserRegistry};
use crate::sanitizers::stripper::{strip_content, Substitution};
use crate::sink::OutputSink;

/// Bucketed output path of a user record, relative to the destination root.
pub fn bucketed_path(users_dir: &Path, anon_id: &str) -> PathBuf {
    let chars: Vec<char> = anon_id.chars().collect();
    let bucket = |range: std::ops::Range<usize>| -> String {
        chars
            .get(range.start.min(chars.len())..range.end.min(chars.len()))
            .map(|c| c.iter().collect())
            .filter(|s: &String| !s.is_empty())
            .unwrap_or_else(|| "_".to_string())
    };
    users_dir
        .join(bucket(0..2))
        .join(bucket(2..4))
        .join(anon_id)
        .join(format!("{}.xml", anon_id))
}

pub struct IdentityEmitter<'a> {
    config: &'a RuleSetConfig,
    substitutions: &'a [Substitution],
}

impl<'a> IdentityEmitter<'a> {
    pub fn new(config: &'a RuleSetConfig, substitutions: &'a [Substitution]) -> Self {
        Self {
            config,
            substitutions,
        }
    }

    /// Destination of one user record.
    pub fn target_path(&self, user: &Identity) -> PathBuf {
        if user.reserved {
            self.config.layout.installer_record.clone()
        } else {
            bucketed_path(&self.config.layout.users_dir, &user.anon_id)
        }
    }

    /// Emits every loaded user, counting them in `ctx.totals.users`.
    pub fn emit_users(&self, users: &UserRegistry, sink: &mut dyn OutputSink, ctx: &mut RunContext) -> Result<()> {
        info!("** writing {} anonymized user records", users.len());
        for user in users.iter() {
            let target = self.target_path(user);
            let stripped = strip_content(self.substitutions, &user.record);
            sink.write_file(&target, &stripped)?;
            info!(" - wrote user {}", target.display());
            ctx.totals.users += 1;
        }
        Ok(())
    }
}
