//! Identity loading: users and workgroups found in the source repository.
//!
//! Every user record and every workgroup gets a deterministic alias derived
//! from its zero-based discovery index (`user3` / `User 3`, `group1` /
//! `Group 1`). Record directories are walked in file-name order so the
//! index, and therefore the alias, is reproducible for a given tree. Aliases
//! carry no meaning across runs.
//!
//! Only the fields needed for mapping are extracted, with targeted patterns
//! over the raw markup. Each value is kept in two spellings: decoded (entity
//! and character references resolved, as plain-text logs write it) and
//! escaped, exactly as written in the record, so both forms get mapped.
//!
//! License: GPL-3.0-or-later

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::RuleSetConfig;
use crate::errors::{Result, StripError};
use crate::pii_log::{log_identity_loaded, log_identity_reserved};

static ROOT_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z_][\w:.\-]*)((?:\s[^>]*)?)/?>").expect("root element pattern")
});
static USER_ID_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\buserId\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("userId pattern")
});
static NAME_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<name>(.*?)</name>").expect("name pattern"));
static WORKGROUP_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<workgroup\b([^>]*)>").expect("workgroup pattern"));
static ENTITY_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#[xX]([0-9A-Fa-f]+)|#([0-9]+)|(amp|lt|gt|quot|apos));").expect("entity pattern")
});
static NAME_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bname\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("name attribute pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    User,
    Workgroup,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::User => "user",
            IdentityKind::Workgroup => "workgroup",
        }
    }
}

/// A user or workgroup with its aliases for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub kind: IdentityKind,
    pub original_id: String,
    pub display_name: String,
    pub anon_id: String,
    pub anon_name: String,
    /// `original_id` as written in the markup, before entity decoding.
    pub escaped_id: String,
    /// `display_name` as written in the markup, before entity decoding.
    pub escaped_name: String,
    /// Exempt from mapping (`installer`, `Admin`).
    pub reserved: bool,
    /// File the identity was read from.
    pub source: PathBuf,
    /// Raw record content; empty for workgroups, which are emitted by the walk.
    pub record: Vec<u8>,
}

impl Identity {
    fn user(index: usize, original_id: String, display_name: String, reserved: bool) -> Self {
        Self {
            kind: IdentityKind::User,
            escaped_id: original_id.clone(),
            escaped_name: display_name.clone(),
            original_id,
            display_name,
            anon_id: format!("user{}", index),
            anon_name: format!("User {}", index),
            reserved,
            source: PathBuf::new(),
            record: Vec::new(),
        }
    }

    fn workgroup(index: usize, name: String, reserved: bool, source: &Path) -> Self {
        Self {
            kind: IdentityKind::Workgroup,
            original_id: name.clone(),
            escaped_id: name.clone(),
            escaped_name: name.clone(),
            display_name: name,
            anon_id: format!("group{}", index),
            anon_name: format!("Group {}", index),
            reserved,
            source: source.to_path_buf(),
            record: Vec::new(),
        }
    }
}

/// All users of the repository, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: Vec<Identity>,
}

impl UserRegistry {
    /// Loads every `*.xml` user record below the configured users directory.
    ///
    /// A missing directory yields an empty registry. Any unreadable or
    /// malformed record aborts the load, as do two records sharing a userId
    /// or two mapped users sharing a display name (compared
    /// case-insensitively, as names are matched).
    pub fn load(root: &Path, config: &RuleSetConfig) -> Result<Self> {
        let users_path = root.join(&config.layout.users_dir);
        info!("** loading users from {}", users_path.display());

        if !users_path.is_dir() {
            warn!("No users directory at {}; no users loaded.", users_path.display());
            return Ok(Self::default());
        }

        let mut users = Vec::new();
        let mut seen = HashSet::new();
        let mut names: HashMap<String, PathBuf> = HashMap::new();
        for entry in WalkDir::new(&users_path).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_xml(entry.path()) {
                continue;
            }
            let path = entry.path();
            let raw = std::fs::read(path).map_err(|e| StripError::io(path, e))?;
            let text = std::str::from_utf8(&raw)
                .map_err(|e| StripError::configuration(path, format!("record is not UTF-8: {}", e)))?;
            let (escaped_id, escaped_name) = parse_user_record(text)
                .map_err(|reason| StripError::configuration(path, reason))?;
            let original_id = decode_entities(&escaped_id).into_owned();
            let display_name = decode_entities(&escaped_name).into_owned();

            if !seen.insert(original_id.clone()) {
                return Err(StripError::configuration(
                    path,
                    "duplicate userId; an earlier record uses the same id",
                ));
            }

            let reserved = original_id == config.reserved_user;
            if !reserved {
                if let Some(first) = names.get(&display_name.to_lowercase()) {
                    return Err(StripError::configuration(
                        path,
                        format!(
                            "display name is also used by {}; both users would share one alias",
                            first.display()
                        ),
                    ));
                }
                names.insert(display_name.to_lowercase(), path.to_path_buf());
            }

            let mut user = Identity::user(users.len(), original_id, display_name, reserved);
            user.escaped_id = escaped_id;
            user.escaped_name = escaped_name;
            user.source = path.to_path_buf();
            user.record = raw;
            if reserved {
                log_identity_reserved(user.kind.as_str(), &user.original_id);
            } else {
                log_identity_loaded(user.kind.as_str(), &user.display_name, &user.anon_id, &user.anon_name);
            }
            users.push(user);
        }

        info!("** {} users loaded", users.len());
        Ok(Self { users })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.users.iter()
    }

    /// Users that take part in mapping, in discovery order.
    pub fn mapped(&self) -> impl Iterator<Item = &Identity> {
        self.users.iter().filter(|u| !u.reserved)
    }

    pub fn installer(&self) -> Option<&Identity> {
        self.users.iter().find(|u| u.reserved)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// All workgroups of the repository, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct WorkgroupRegistry {
    workgroups: Vec<Identity>,
}

impl WorkgroupRegistry {
    /// Loads workgroup names from the workgroup configuration file.
    ///
    /// The file is optional; its absence yields zero workgroups.
    pub fn load(root: &Path, config: &RuleSetConfig) -> Result<Self> {
        let path = root.join(&config.layout.workgroups_file);
        if !path.is_file() {
            info!("** no workgroup configuration at {}", path.display());
            return Ok(Self::default());
        }
        info!("** loading workgroups from {}", path.display());

        let text = std::fs::read_to_string(&path).map_err(|e| StripError::io(&path, e))?;
        let names = parse_workgroups(&text).map_err(|reason| StripError::configuration(&path, reason))?;

        let mut workgroups = Vec::new();
        let mut seen = HashSet::new();
        for escaped in names {
            let name = decode_entities(&escaped).into_owned();
            if !seen.insert(name.clone()) {
                debug!("Workgroup listed more than once; keeping first occurrence.");
                continue;
            }
            let reserved = name == config.reserved_workgroup;
            let mut group = Identity::workgroup(workgroups.len(), name, reserved, &path);
            group.escaped_id = escaped.clone();
            group.escaped_name = escaped;
            if reserved {
                log_identity_reserved(group.kind.as_str(), &group.display_name);
            } else {
                log_identity_loaded(group.kind.as_str(), &group.display_name, &group.anon_id, &group.anon_name);
            }
            workgroups.push(group);
        }

        info!("** {} workgroups loaded", workgroups.len());
        Ok(Self { workgroups })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.workgroups.iter()
    }

    /// Workgroups that take part in mapping, in discovery order.
    pub fn mapped(&self) -> impl Iterator<Item = &Identity> {
        self.workgroups.iter().filter(|w| !w.reserved)
    }

    pub fn len(&self) -> usize {
        self.workgroups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workgroups.is_empty()
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("xml"))
}

/// Resolves the predefined XML entities and numeric character references.
///
/// Unknown or invalid references are left as written.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY_REF.replace_all(text, |caps: &Captures| {
        let decoded = if let Some(hex) = caps.get(1) {
            u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = caps.get(2) {
            dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match caps.get(3).map(|m| m.as_str()) {
                Some("amp") => Some('&'),
                Some("lt") => Some('<'),
                Some("gt") => Some('>'),
                Some("quot") => Some('"'),
                Some("apos") => Some('\''),
                _ => None,
            }
        };
        decoded.map_or_else(|| caps[0].to_string(), String::from)
    })
}

fn attribute(re: &Regex, attrs: &str) -> Option<String> {
    re.captures(attrs)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim().to_string())
}

/// Extracts `(userId, name)` from a user record.
fn parse_user_record(text: &str) -> std::result::Result<(String, String), String> {
    let root = ROOT_ELEMENT
        .captures(text)
        .ok_or_else(|| "no root element found".to_string())?;
    let attrs = root.get(2).map_or("", |m| m.as_str());

    let user_id = attribute(&USER_ID_ATTR, attrs)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| "root element has no userId attribute".to_string())?;

    let name = NAME_ELEMENT
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| "record has no <name> element".to_string())?;

    Ok((user_id, name))
}

/// Extracts workgroup names in document order.
fn parse_workgroups(text: &str) -> std::result::Result<Vec<String>, String> {
    WORKGROUP_ELEMENT
        .captures_iter(text)
        .enumerate()
        .map(|(i, caps)| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            attribute(&NAME_ATTR, attrs)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| format!("workgroup element #{} has no name attribute", i + 1))
        })
        .collect()
}
