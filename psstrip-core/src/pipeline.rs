// psstrip-core/src/pipeline.rs
//! One-shot entry point: strip a whole repository into a sink.
//!
//! The run happens in three sequential passes: load identities (and build
//! the mapping index and rule table from them), walk the tree, emit user
//! records. Identity loading completes before anything is written, so a
//! malformed record aborts the run with an empty destination.

use chrono::Local;
use log::info;
use std::path::Path;
use std::time::Duration;

use crate::config::RuleSetConfig;
use crate::copier::{RunContext, Totals, TreeCopier};
use crate::emitter::IdentityEmitter;
use crate::errors::{Result, StripError};
use crate::identity::{UserRegistry, WorkgroupRegistry};
use crate::mapping::MappingIndex;
use crate::rules::{identity_record_substitutions, RuleTable};
use crate::sink::OutputSink;

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct StripOptions {
    pub config: RuleSetConfig,
    /// Delay applied before each visited entry.
    pub throttle: Duration,
}

impl StripOptions {
    pub fn new(config: RuleSetConfig) -> Self {
        Self {
            config,
            throttle: Duration::ZERO,
        }
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }
}

/// Everything derived from the source repository before copying starts.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub users: UserRegistry,
    pub workgroups: WorkgroupRegistry,
    pub mapping: MappingIndex,
    pub rules: RuleTable,
}

impl PreparedRun {
    /// Loads identities and builds the mapping index and the rule table.
    pub fn prepare(source: &Path, config: &RuleSetConfig) -> Result<Self> {
        let users = UserRegistry::load(source, config)?;
        let workgroups = WorkgroupRegistry::load(source, config)?;
        let mapping = MappingIndex::build(&users, &workgroups)?;
        let rules = RuleTable::build(config, &mapping)?;
        Ok(Self {
            users,
            workgroups,
            mapping,
            rules,
        })
    }
}

/// Strips the repository at `source` into `sink` and returns the totals.
pub fn strip_repository(source: &Path, sink: &mut dyn OutputSink, options: &StripOptions) -> Result<Totals> {
    if !source.is_dir() {
        return Err(StripError::configuration(source, "source repository is not a directory"));
    }

    info!("-----------------------------------------------------------------------");
    info!(" PatentSafe Stripper ");
    info!("-----------------------------------------------------------------------");
    info!(" Started at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!(" Rule set: {}", options.config.version);

    let prepared = PreparedRun::prepare(source, &options.config)?;
    let substitutions = identity_record_substitutions(&options.config, &prepared.mapping)?;
    let mut ctx = RunContext::new(options.throttle);
    ctx.totals.workgroups = prepared.workgroups.len();

    TreeCopier::new(&prepared.rules, &options.config).copy_tree(source, sink, &mut ctx)?;

    IdentityEmitter::new(&options.config, &substitutions).emit_users(&prepared.users, sink, &mut ctx)?;

    info!(" Ended at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("-----------------------------------------------------------------------");
    Ok(ctx.totals)
}
