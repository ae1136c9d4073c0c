use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    /// No sources configured. The only fatal kind.
    Config(String),
    /// Transport failure or non-2xx response for one source.
    Fetch { url: String, message: String },
    /// Response body is not valid JSON/XML.
    Parse { url: String, message: String },
    /// One record could not be converted.
    Record { id: String, message: String },
    /// Output document could not be written.
    Persist { path: String, message: String },
}

impl FeedError {
    /// Only configuration errors abort a run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Fetch { .. } => "fetch",
            Self::Parse { .. } => "parse",
            Self::Record { .. } => "record",
            Self::Persist { .. } => "persist",
        }
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config error: {msg}"),
            Self::Fetch { url, message } => write!(f, "fetch failed for {url}: {message}"),
            Self::Parse { url, message } => {
                write!(f, "cannot parse response from {url}: {message}")
            }
            Self::Record { id, message } => write!(f, "record '{id}': {message}"),
            Self::Persist { path, message } => write!(f, "cannot write {path}: {message}"),
        }
    }
}

impl std::error::Error for FeedError {}
