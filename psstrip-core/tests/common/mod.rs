// psstrip-core/tests/common/mod.rs
//! Fixture repository shared by the integration tests.
//!
//! Three users are discovered in file-name order (`ho/`, `installer/`, `wa/`),
//! so `holmes` becomes `user0`, the reserved installer consumes index 1 and
//! `watson` becomes `user2`. Workgroup `Admin` is reserved and `Irregulars`
//! becomes `Group 1`.

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const DOC_DIR: &str = "data/2024/01/01/PSA0001";

pub const DOCINFO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<docinfo id="PSA0001">
  <author>holmes</author>
  <authorName>Sherlock Holmes</authorName>
  <workgroup>Irregulars</workgroup>
  <summary>The adventure of the speckled band</summary>
  <text>Observed by Sherlock Holmes at 221B</text>
  <witness>watson</witness>
</docinfo>
"#;

pub const SIGNATURE: &str = r#"<signature>
  <signer>watson</signer>
  <text>Witnessed, John Watson</text>
</signature>
"#;

pub const EVENTS: &str = "2024-01-01 10:00 holmes submitted PSA0001\n\
2024-01-01 10:05 watson signed PSA0001 as witness for Sherlock Holmes\n\
2024-01-01 11:00 installer reindexed workgroup Admin\n\
2024-01-01 11:01 HOLMES joined Irregulars\n";

pub const SETTINGS: &str = "<settings>\n  <port>8080</port>\n  <mail host=\"localhost\"/>\n</settings>\n";

pub const WORKGROUPS: &str = r#"<workgroups>
  <workgroup name="Admin"><member>installer</member></workgroup>
  <workgroup name="Irregulars"><member>holmes</member><member>watson</member></workgroup>
</workgroups>
"#;

pub fn write(root: &Path, rel: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}

pub fn write_users(root: &Path) -> Result<()> {
    write(
        root,
        "data/users/ho/lm/holmes/holmes.xml",
        r#"<user userId="holmes">
  <name>Sherlock Holmes</name>
  <email>sherlock@bakerstreet.org</email>
  <password>elementary</password>
</user>
"#,
    )?;
    write(
        root,
        "data/users/installer/installer.xml",
        r#"<user userId="installer"><name>PatentSafe Installer</name></user>"#,
    )?;
    write(
        root,
        "data/users/wa/ts/watson/watson.xml",
        r#"<user userId="watson">
  <name>John Watson</name>
  <email>john@bakerstreet.org</email>
</user>
"#,
    )?;
    Ok(())
}

/// Builds the full fixture repository under `root`.
pub fn build_repository(root: &Path) -> Result<()> {
    write_users(root)?;
    write(root, "data/config/workgroups.xml", WORKGROUPS)?;

    write(root, "settings.xml", SETTINGS)?;
    write(root, "settings.xml.backup-2.0", "<settings><old/></settings>")?;
    write(root, "data/id-values.xml", "<ids next=\"PSA0002\"/>")?;

    write(root, &format!("{}/docinfo.xml", DOC_DIR), DOCINFO)?;
    write(root, &format!("{}/signature-001.xml", DOC_DIR), SIGNATURE)?;
    write(root, &format!("{}/content.txt", DOC_DIR), "Confidential notes by holmes")?;
    write(root, &format!("{}/submitted.pdf", DOC_DIR), b"%PDF-1.4 holmes".as_slice())?;
    write(root, &format!("{}/database.xml", DOC_DIR), "<db owner=\"holmes\"/>")?;
    write(root, "data/log/events.txt", EVENTS)?;

    write(root, "data/spool/job-1.xml", "<job user=\"holmes\"/>")?;
    write(root, "data/queues/pending.xml", "<queue/>")?;
    write(root, "data/index/segments", "holmes watson")?;
    write(root, ".git/config", "[core]")?;
    Ok(())
}

/// Every regular file below `root`, relative to it, sorted.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().strip_prefix(root)?.to_path_buf());
        }
    }
    Ok(files)
}

pub fn read(root: &Path, rel: &str) -> Result<String> {
    Ok(fs::read_to_string(root.join(rel))?)
}
