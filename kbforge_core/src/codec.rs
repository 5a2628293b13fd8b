//! Reading and writing persisted fact files.
//!
//! Two physical formats are understood:
//! - **tsv**: one fact per line, `id \t subject \t relation \t object`, with an
//!   empty first column when the fact has no id. Backslash escapes keep tabs,
//!   newlines and a leading `#` from colliding with the layout.
//! - **ttl**: `subject relation object .` lines; a preceding `#@ id` comment
//!   attaches an id to the next triple. Read-only.
//!
//! Lines starting with `#` are comments. Every file written here starts with a
//! comment header recording its provenance.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::fact::Fact;

#[allow(clippy::expect_used)]
static TTL_TRIPLE: Lazy<Regex> = Lazy::new(|| {
    let term = r#"(<[^>]*>|"(?:[^"\\]|\\.)*"(?:@[A-Za-z0-9-]+|\^\^\S+?)?|[^\s"<]\S*?)"#;
    Regex::new(&format!(r"^\s*{term}\s+{term}\s+{term}\s*\.\s*$")).expect("Invalid regex")
});

/// Physical layout of a fact file, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Tsv,
    Ttl,
}

impl FileFormat {
    /// Formats in the order they are looked up when binding a theme.
    pub const PREFERENCE: [Self; 2] = [Self::Tsv, Self::Ttl];

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Tsv => "tsv",
            Self::Ttl => "ttl",
        }
    }

    /// Detect the format from a file extension.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "tsv" => Some(Self::Tsv),
            "ttl" => Some(Self::Ttl),
            _ => None,
        }
    }
}

fn escape(field: &str, out: &mut String) {
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
}

fn unescape(field: &str) -> Result<String, String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('#') => out.push('#'),
            Some(other) => return Err(format!("unknown escape \\{other}")),
            None => return Err("dangling backslash".to_string()),
        }
    }
    Ok(out)
}

/// Encode a fact as one tsv line, without the trailing newline.
#[must_use]
pub fn encode_tsv(fact: &Fact) -> String {
    let mut line = String::new();
    if let Some(id) = fact.id() {
        if id.starts_with('#') {
            line.push('\\');
        }
        escape(id, &mut line);
    }
    for field in [fact.subject(), fact.relation(), fact.object()] {
        line.push('\t');
        escape(field, &mut line);
    }
    line
}

fn decode_tsv(line: &str) -> Result<Fact, String> {
    let columns: Vec<&str> = line.split('\t').collect();
    let [id, subject, relation, object] = columns.as_slice() else {
        return Err(format!("expected 4 columns, found {}", columns.len()));
    };
    let fact = Fact::new(unescape(subject)?, unescape(relation)?, unescape(object)?);
    if id.is_empty() {
        Ok(fact)
    } else {
        Ok(fact.with_id(unescape(id)?))
    }
}

fn decode_ttl(line: &str) -> Result<Fact, String> {
    let caps = TTL_TRIPLE
        .captures(line)
        .ok_or_else(|| "expected 'subject relation object .'".to_string())?;
    Ok(Fact::new(&caps[1], &caps[2], &caps[3]))
}

/// Streams facts from a fact file in file order, duplicates included.
///
/// Yields an error for the first malformed line and then stops.
pub struct FactReader {
    path: PathBuf,
    format: FileFormat,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    pending_id: Option<String>,
    done: bool,
}

impl FactReader {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let format = FileFormat::of(path).ok_or_else(|| StoreError::UnknownFormat(path.to_path_buf()))?;
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            lines: BufReader::new(file).lines(),
            line_no: 0,
            pending_id: None,
            done: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of the line last read, starting at 1.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line_no
    }

    fn parse(&mut self, line: &str) -> Option<Result<Fact, String>> {
        match self.format {
            FileFormat::Tsv => {
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }
                Some(decode_tsv(line))
            }
            FileFormat::Ttl => {
                let trimmed = line.trim();
                if let Some(id) = trimmed.strip_prefix("#@") {
                    self.pending_id = Some(id.trim().to_string());
                    return None;
                }
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('@') {
                    return None;
                }
                let id = self.pending_id.take();
                Some(decode_ttl(trimmed).map(|fact| match id {
                    Some(id) => fact.with_id(id),
                    None => fact,
                }))
            }
        }
    }
}

impl Iterator for FactReader {
    type Item = Result<Fact, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(StoreError::io(&self.path, e)));
                }
            };
            self.line_no += 1;
            let parsed = self.parse(line.trim_end_matches('\r'));
            match parsed {
                None => {}
                Some(Ok(fact)) => {
                    if fact.subject().is_empty() || fact.relation().is_empty() || fact.object().is_empty() {
                        self.done = true;
                        return Some(Err(StoreError::malformed(&self.path, self.line_no, "empty term")));
                    }
                    return Some(Ok(fact));
                }
                Some(Err(reason)) => {
                    self.done = true;
                    return Some(Err(StoreError::malformed(&self.path, self.line_no, reason)));
                }
            }
        }
    }
}

/// Appends facts to a new tsv file.
///
/// Facts go to a `<file>.partial` sibling that only replaces the target in
/// [`finish`](Self::finish). A writer dropped before that removes the sibling,
/// so the target path never holds a truncated file.
pub struct FactWriter {
    path: PathBuf,
    partial: PathBuf,
    out: Option<BufWriter<File>>,
    written: usize,
}

impl FactWriter {
    /// Remove any previous file at `path` and start writing, header first.
    pub fn create(path: &Path, header: &str) -> Result<Self, StoreError> {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(path, e)),
        }
        let partial = partial_path(path);
        let file = File::create(&partial).map_err(|e| StoreError::io(&partial, e))?;
        let mut writer = Self {
            path: path.to_path_buf(),
            partial,
            out: Some(BufWriter::new(file)),
            written: 0,
        };
        for line in header.lines() {
            writer.raw_line(&format!("# {line}"))?;
        }
        writer.raw_line(&format!("# Generated {}", Utc::now().to_rfc3339()))?;
        Ok(writer)
    }

    fn raw_line(&mut self, line: &str) -> Result<(), StoreError> {
        let out = self.out.as_mut().ok_or_else(|| {
            StoreError::io(&self.partial, std::io::Error::other("writer already finished"))
        })?;
        writeln!(out, "{line}").map_err(|e| StoreError::io(&self.partial, e))
    }

    /// Append one fact. Facts with an empty term are refused, since no
    /// reader would accept them back.
    pub fn write(&mut self, fact: &Fact) -> Result<(), StoreError> {
        if fact.subject().is_empty() || fact.relation().is_empty() || fact.object().is_empty() {
            return Err(StoreError::InvalidFact {
                path: self.path.clone(),
                reason: format!("empty term in '{fact}'"),
            });
        }
        self.raw_line(&encode_tsv(fact))?;
        self.written += 1;
        Ok(())
    }

    /// Number of facts written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// The file this writer produces once finished.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where facts are staged until the writer is finished.
    #[must_use]
    pub fn partial_path(&self) -> &Path {
        &self.partial
    }

    /// Flush, close and move the staged file to its final path.
    ///
    /// On failure the staged file is removed and nothing is left at the
    /// final path.
    pub fn finish(mut self) -> Result<PathBuf, StoreError> {
        let out = self.out.take().ok_or_else(|| {
            StoreError::io(&self.partial, std::io::Error::other("writer already finished"))
        })?;
        let result = out
            .into_inner()
            .map_err(|e| StoreError::io(&self.partial, e.into_error()))
            .and_then(|file| file.sync_all().map_err(|e| StoreError::io(&self.partial, e)))
            .and_then(|()| std::fs::rename(&self.partial, &self.path).map_err(|e| StoreError::io(&self.path, e)));
        if result.is_err() {
            let _ = std::fs::remove_file(&self.partial);
        }
        result.map(|()| self.path.clone())
    }

    /// Give up writing and delete the staged file.
    pub fn discard(mut self) -> Result<(), StoreError> {
        drop(self.out.take());
        std::fs::remove_file(&self.partial).map_err(|e| StoreError::io(&self.partial, e))
    }
}

impl Drop for FactWriter {
    fn drop(&mut self) {
        if self.out.take().is_some() {
            let _ = std::fs::remove_file(&self.partial);
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    PathBuf::from(partial)
}
