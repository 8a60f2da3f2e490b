//! stripper.rs - Applies ordered substitutions to file content.
//!
//! Each [`Substitution`] replaces its token (capture group 1, or the whole
//! match when the pattern has no group) and leaves the surrounding delimiters
//! untouched. Substitutions run strictly in list order; later entries see the
//! output of earlier ones.
//!
//! License: GPL-3.0-or-later

use regex::bytes::Regex;
use std::borrow::Cow;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// A compiled content substitution.
#[derive(Debug, Clone)]
pub struct Substitution {
    /// Label used in logs, e.g. `user-id:user3` or `summary`.
    pub name: String,
    pub regex: Regex,
    pub replacement: Vec<u8>,
}

impl Substitution {
    pub fn new(name: &str, regex: Regex, replacement: &str) -> Self {
        Self {
            name: name.to_string(),
            regex,
            replacement: replacement.as_bytes().to_vec(),
        }
    }

    fn token_group(&self) -> usize {
        if self.regex.captures_len() > 1 {
            1
        } else {
            0
        }
    }

    /// Replaces every token in `text`, borrowing when nothing matched.
    ///
    /// The search resumes right after each replaced token rather than after
    /// the whole match, so a delimiter consumed as the trailing boundary of
    /// one token can lead the next (`holmes,holmes`).
    pub fn apply<'a>(&self, text: &'a [u8]) -> Cow<'a, [u8]> {
        let group = self.token_group();
        let mut out: Option<Vec<u8>> = None;
        let mut last = 0;
        let mut pos = 0;

        while pos <= text.len() {
            let Some(caps) = self.regex.captures_at(text, pos) else {
                break;
            };
            let Some(whole) = caps.get(0) else { break };

            let Some(token) = caps.get(group) else {
                pos = resume_at(pos, whole.end(), whole.end());
                continue;
            };

            let buf = out.get_or_insert_with(|| Vec::with_capacity(text.len()));
            buf.extend_from_slice(&text[last..token.start()]);
            buf.extend_from_slice(&self.replacement);
            last = token.end();
            pos = resume_at(pos, token.end(), whole.end());
        }

        match out {
            Some(mut buf) => {
                buf.extend_from_slice(&text[last..]);
                Cow::Owned(buf)
            }
            None => Cow::Borrowed(text),
        }
    }
}

/// Next search offset; always makes progress, even on empty matches.
fn resume_at(pos: usize, end: usize, match_end: usize) -> usize {
    if end > pos {
        end
    } else {
        match_end.max(pos + 1)
    }
}

/// Applies every substitution in order and returns the rewritten content.
pub fn strip_content(substitutions: &[Substitution], text: &[u8]) -> Vec<u8> {
    let mut current: Option<Vec<u8>> = None;
    for sub in substitutions {
        let rewritten = match sub.apply(current.as_deref().unwrap_or(text)) {
            Cow::Owned(rewritten) => Some(rewritten),
            Cow::Borrowed(_) => None,
        };
        if rewritten.is_some() {
            current = rewritten;
        }
    }
    current.unwrap_or_else(|| text.to_vec())
}

/// Failure of [`strip_lines`], tagged with the side of the stream that failed.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}

/// Strips `reader` line by line into `writer`, returning the number of lines.
///
/// Line terminators are kept with their line, so the output has the same
/// line structure as the input and memory use is bounded by the longest line.
pub fn strip_lines<R: BufRead, W: Write>(
    substitutions: &[Substitution],
    mut reader: R,
    writer: &mut W,
) -> Result<u64, StreamError> {
    let mut line = Vec::new();
    let mut count = 0;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).map_err(StreamError::Read)? == 0 {
            break;
        }
        writer
            .write_all(&strip_content(substitutions, &line))
            .map_err(StreamError::Write)?;
        count += 1;
    }
    writer.flush().map_err(StreamError::Write)?;
    Ok(count)
}
