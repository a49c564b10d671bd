//! Content-listing endpoints and the keys that name them.

use std::fmt;

use crate::errors::{Error, Result};

/// Identifies a source. Named sources keep their key in part file names,
/// positional ones are numbered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    /// Zero-based position of the source.
    Positional(usize),
    /// Caller-supplied, non-numeric key.
    Named(String),
}

impl SourceKey {
    /// Canonical decimal integers are positions, anything else (`007`, `+3`) is a name.
    pub fn parse(key: &str) -> Self {
        match key.parse::<usize>() {
            Ok(position) if position.to_string() == key => SourceKey::Positional(position),
            _ => SourceKey::Named(key.to_string()),
        }
    }

    /// The token used in part file names: the name itself, or the 1-based position padded to 5 digits.
    pub fn index_token(&self) -> String {
        match self {
            SourceKey::Positional(position) => format!("{:05}", position + 1),
            SourceKey::Named(name) => name.clone(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKey::Positional(position) => write!(f, "#{}", position),
            SourceKey::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A declared content endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub key: SourceKey,
    pub url: String,
}

/// A source specialized for one language (or left as is when languages are not expanded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedSource {
    pub key: SourceKey,
    pub url: String,
    pub language_id: Option<u32>,
}

impl From<Source> for ExpandedSource {
    fn from(source: Source) -> Self {
        ExpandedSource {
            key: source.key,
            url: source.url,
            language_id: None,
        }
    }
}

/// Insertion-ordered list of keyed entries where re-inserting a key replaces
/// the value but keeps the original position.
#[derive(Debug, Default)]
pub(crate) struct KeyedList<T> {
    entries: Vec<(SourceKey, T)>,
}

impl<T> KeyedList<T> {
    pub(crate) fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub(crate) fn insert(&mut self, key: SourceKey, value: T) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Appends under the next free position: one past the largest positional key seen so far.
    pub(crate) fn push(&mut self, value: T) {
        let next = self
            .entries
            .iter()
            .filter_map(|(key, _)| match key {
                SourceKey::Positional(position) => Some(position + 1),
                SourceKey::Named(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.entries.push((SourceKey::Positional(next), value));
    }

    pub(crate) fn into_entries(self) -> Vec<(SourceKey, T)> {
        self.entries
    }
}

/// Parses newline-separated endpoint declarations.
///
/// Each non-blank line is either a bare URL or `key => url`. A bare URL is keyed by
/// its position among the non-blank lines.
pub fn parse_endpoint_declarations(declarations: &str) -> Result<Vec<Source>> {
    let mut sources = KeyedList::new();

    let lines = declarations.lines().map(str::trim).filter(|line| !line.is_empty());
    for (position, line) in lines.enumerate() {
        let (key, url) = match line.find("=>") {
            Some(0) => {
                return Err(Error::Config(format!("endpoint declaration has an empty key: '{}'", line)));
            }
            Some(split) => {
                let key = line[..split].trim();
                let url = line[split + 2..].trim();
                if url.is_empty() {
                    return Err(Error::Config(format!("endpoint declaration has an empty URL: '{}'", line)));
                }
                (SourceKey::parse(key), url)
            }
            None => (SourceKey::Positional(position), line),
        };
        sources.insert(key, url.to_string());
    }

    let sources: Vec<Source> = sources
        .into_entries()
        .into_iter()
        .map(|(key, url)| Source { key, url })
        .collect();

    if sources.is_empty() {
        return Err(Error::Config("no endpoints declared".to_string()));
    }
    Ok(sources)
}
