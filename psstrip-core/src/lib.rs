// psstrip-core/src/lib.rs
//! # psstrip Core Library
//!
//! `psstrip-core` produces a sanitized copy of a PatentSafe repository. It
//! walks the source tree, classifies every file by name against an ordered
//! rule table, and copies, skips, replaces or strips it. Stripping rewrites
//! content through an ordered list of substitutions that replace users and
//! workgroups with stable anonymous aliases and blank free-text fields, while
//! leaving the document markup intact.
//!
//! ## Modules
//!
//! * `config`: Versioned YAML rule sets (embedded 4.8 and 5.x, or custom files).
//! * `identity`: Loads users and workgroups and assigns their aliases.
//! * `mapping`: Builds the ordered original -> alias substitutions.
//! * `rules`: The ordered rule table and first-match classification.
//! * `sanitizers`: Pattern compilation and the content stripper.
//! * `sink`: Destination abstraction and its filesystem implementation.
//! * `copier`: The tree walk, per-file dispatch, throttle and totals.
//! * `emitter`: Writes anonymized user records under bucketed paths.
//! * `pipeline`: One-shot wiring of a full run.
//! * `pii_log`: Logging helpers that mask original identities.
//!
//! ## Usage Example
//!
//! ```no_run
//! use psstrip_core::{strip_repository, FsSink, RepositoryVersion, RuleSetConfig, StripOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), psstrip_core::StripError> {
//!     let config = RuleSetConfig::load_embedded(RepositoryVersion::V5)?;
//!     let mut sink = FsSink::new("/tmp/patentsafe-stripped");
//!     let totals = strip_repository(
//!         Path::new("/srv/patentsafe"),
//!         &mut sink,
//!         &StripOptions::new(config),
//!     )?;
//!     println!("stripped {} files", totals.stripped);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every failure is a [`StripError`] and aborts the run: configuration
//! problems and bad patterns before anything is written, I/O problems at the
//! file that failed.
//!
//! ---
//! License: GPL-3.0-or-later

pub mod config;
pub mod copier;
pub mod emitter;
pub mod errors;
pub mod identity;
pub mod mapping;
pub mod pii_log;
pub mod pipeline;
pub mod rules;
pub mod sanitizers;
pub mod sink;

pub use config::{Layout, LiteralSubstitution, RepositoryVersion, RuleSetConfig, StripRuleConfig, MAX_PATTERN_LENGTH};
pub use copier::{RunContext, Totals, TreeCopier, WalkEntry};
pub use emitter::{bucketed_path, IdentityEmitter};
pub use errors::StripError;
pub use identity::{Identity, IdentityKind, UserRegistry, WorkgroupRegistry};
pub use mapping::{MappingEntry, MappingIndex};
pub use pipeline::{strip_repository, PreparedRun, StripOptions};
pub use rules::{Action, Classification, Rule, RuleTable};
pub use sanitizers::stripper::{strip_content, strip_lines, StreamError, Substitution};
pub use sink::{FsSink, OutputSink};
