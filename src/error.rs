use thiserror::Error;

/// Maximum bytes of a raw response or error body carried inside an error.
pub const PREVIEW_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unrecognized column label '{label}'")]
    UnknownColumn { label: String },

    #[error("insufficient data: sheet has {rows} row(s), need a header and at least one data row")]
    InsufficientData { rows: usize },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no records to analyze")]
    EmptyDataset,

    #[error("service error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Service { status: Option<u16>, message: String },

    #[error("unparsable insight: {reason} | response: {preview}")]
    UnparsableInsight { reason: String, preview: String },

    #[error("export error: {0}")]
    Export(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RankError {
    pub(crate) fn unparsable(reason: impl Into<String>, response: &str) -> Self {
        RankError::UnparsableInsight {
            reason: reason.into(),
            preview: truncate_preview(response, PREVIEW_LEN),
        }
    }

    /// True for the failures that come from a malformed input document.
    pub fn is_parse(&self) -> bool {
        matches!(self, RankError::Parse(_) | RankError::UnknownColumn { .. })
    }
}

pub type Result<T> = std::result::Result<T, RankError>;

/// Truncates at a char boundary no later than `max_len` bytes, appending "..." when cut.
pub fn truncate_preview(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= max_len)
        .last()
        .unwrap_or(0);
    format!("{}...", &s[..cut])
}
