use thiserror::Error;

pub type Result<T, E = EditorialError> = std::result::Result<T, E>;

/// Failures that abort an editorial lookup. A missing editorial is not one
/// of them: that is reported through `EditorialResult::available`.
#[derive(Debug, Error)]
pub enum EditorialError {
    #[error("invalid problem URL: {0}")]
    InvalidUrl(String),
    #[error("failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("platform API error: {0}")]
    Api(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to render report: {0}")]
    Render(#[from] askama::Error),
}

impl EditorialError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
