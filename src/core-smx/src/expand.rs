//! Multiplies sources across site languages.

use serde::{Deserialize, Serialize};

use crate::sources::{ExpandedSource, KeyedList, Source, SourceKey};

/// A site language as reported by the host. Only the id takes part in expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: u32,
    #[serde(default)]
    pub title: String,
}

/// Interface to whatever knows the site's languages.
pub trait LanguageProvider: Send + Sync {
    /// Languages in the order they should be expanded.
    fn list_languages(&self) -> Vec<Language>;
}

/// Languages supplied up front, e.g. from the task configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticLanguages(pub Vec<Language>);

impl LanguageProvider for StaticLanguages {
    fn list_languages(&self) -> Vec<Language> {
        self.0.clone()
    }
}

/// Produces the ordered set of sources to paginate.
///
/// With `multi_language` off the sources pass through untouched. Otherwise each URL is
/// stripped of its language parameter, duplicates are dropped, and every remaining source
/// is repeated once per language: all sources for the first language, then all for the
/// second, and so on.
pub fn expand(sources: &[Source], multi_language: bool, language_ids: &[u32]) -> Vec<ExpandedSource> {
    if !multi_language || sources.is_empty() {
        return sources.iter().cloned().map(ExpandedSource::from).collect();
    }

    let stripped = strip_language(sources);
    if language_ids.is_empty() {
        return stripped.into_iter().map(ExpandedSource::from).collect();
    }

    let mut expanded = KeyedList::new();
    for &language_id in language_ids {
        for source in &stripped {
            let url = with_language(&source.url, language_id);
            match &source.key {
                SourceKey::Positional(_) => expanded.push((url, language_id)),
                SourceKey::Named(name) => {
                    expanded.insert(SourceKey::Named(format!("{}-{}", name, language_id)), (url, language_id))
                }
            }
        }
    }

    expanded
        .into_entries()
        .into_iter()
        .map(|(key, (url, language_id))| ExpandedSource {
            key,
            url,
            language_id: Some(language_id),
        })
        .collect()
}

/// Removes `L=` query segments, sorts the remaining ones, and drops sources whose
/// normalized URL was already seen. The first occurrence keeps its key.
pub fn strip_language(sources: &[Source]) -> Vec<Source> {
    let mut unique: Vec<Source> = Vec::with_capacity(sources.len());
    for source in sources {
        let url = normalize_query(&source.url);
        if unique.iter().any(|seen| seen.url == url) {
            tracing::debug!("Dropping source {} as a language variant of an earlier source", source.key);
            continue;
        }
        unique.push(Source {
            key: source.key.clone(),
            url,
        });
    }
    unique
}

fn normalize_query(url: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let mut params: Vec<&str> = query.split('&').filter(|param| !param.starts_with("L=")).collect();
    params.sort_unstable();

    format!("{}?{}", path, params.join("&"))
}

/// Fragments never reach the server, so they are cut before the language is attached.
fn with_language(url: &str, language_id: u32) -> String {
    let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
    format!("{}&L={}", without_fragment.trim_end_matches('&'), language_id)
}
