// Feed source discovery from environment-style variables.
//
// A variable is a source when its name is a prefix (`JSON_URL`) or the
// prefix followed by `_<suffix>` (`JSON_URL_2`, `JSON_URL_backup`).

use std::cmp::Ordering;
use std::path::PathBuf;

/// Prefixes scanned when nothing else is configured.
pub const DEFAULT_PREFIXES: &[&str] = &["JSON_URL", "XML_URL"];

/// Position of a variable inside its prefix group.
#[derive(Debug, PartialEq, Eq)]
enum Slot {
    Bare,
    Numbered(u64),
    Named(String),
}

impl Slot {
    fn of(name: &str, prefix: &str) -> Option<Slot> {
        let rest = name.strip_prefix(prefix)?;
        if rest.is_empty() {
            return Some(Slot::Bare);
        }
        let suffix = rest.strip_prefix('_').filter(|s| !s.is_empty())?;
        Some(match suffix.parse::<u64>() {
            Ok(n) if suffix.bytes().all(|b| b.is_ascii_digit()) => Slot::Numbered(n),
            _ => Slot::Named(suffix.to_string()),
        })
    }

    fn rank(&self) -> u8 {
        match self {
            Slot::Bare => 0,
            Slot::Numbered(_) => 1,
            Slot::Named(_) => 2,
        }
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Slot::Numbered(a), Slot::Numbered(b)) => a.cmp(b),
            (Slot::Named(a), Slot::Named(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered, de-duplicated source URLs from `(name, value)` pairs.
///
/// Prefixes are visited in the given order. Within a prefix the bare name
/// comes first, then numeric suffixes ascending, then other suffixes
/// lexicographically. Values are trimmed, blank values skipped, and a URL
/// seen earlier is not repeated.
pub fn discover_sources<I, K, V>(vars: I, prefixes: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let vars: Vec<(String, String)> = vars
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().trim().to_string()))
        .collect();

    let mut sources = Vec::new();
    for prefix in prefixes {
        let mut group: Vec<(Slot, &str)> = vars
            .iter()
            .filter_map(|(name, value)| Slot::of(name, prefix).map(|slot| (slot, value.as_str())))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        group.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, value) in group {
            push_unique(&mut sources, value);
        }
    }
    sources
}

/// Trim, drop blanks and de-duplicate an explicit URL list.
pub fn clean_sources<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    let mut sources = Vec::new();
    for url in urls {
        let url = url.as_ref().trim();
        if !url.is_empty() {
            push_unique(&mut sources, url);
        }
    }
    sources
}

fn push_unique(sources: &mut Vec<String>, url: &str) {
    if !sources.iter().any(|s| s == url) {
        sources.push(url.to_string());
    }
}

/// Process environment as UTF-8 pairs; non-UTF-8 entries are ignored.
pub fn env_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Load `.env` from the working directory (or a parent). Variables already
/// set in the process environment are left alone.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            log::debug!("loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            log::warn!("ignoring .env file: {e}");
            None
        }
    }
}
