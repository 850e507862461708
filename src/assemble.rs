use crate::{
    error::{EditorialError, Result},
    locate::{char_len, Strategy},
    normalize::truncate_chars,
    problem::{Platform, ProblemRef},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const UNAVAILABLE_MESSAGE: &str = "Editorial not found or not yet published for this problem";
const PREVIEW_MARKER: &str = "\n\n[... truncated for preview ...]";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemMetadata {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contest: Option<String>,
    pub name: Option<String>,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<String>,
}

impl ProblemMetadata {
    /// Metadata carrying only what the URL itself tells us.
    pub fn bare(problem: &ProblemRef) -> Self {
        let contest = match problem {
            ProblemRef::CodeChef(p) => p.contest_code.clone(),
            ProblemRef::Codeforces(p) => Some(p.contest_id.clone()),
        };
        Self {
            code: problem.code(),
            contest,
            ..Default::default()
        }
    }
}

/// Looks up a problem's name, tags and difficulty.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, problem: &ProblemRef) -> Result<ProblemMetadata>;
}

/// Cleaned editorial text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEditorial {
    pub text: String,
    pub source: Strategy,
    pub url: Option<String>,
}

impl ExtractedEditorial {
    /// An editorial page that was found but could not be read.
    pub fn link_only(url: String) -> Self {
        Self {
            text: String::new(),
            source: Strategy::LinkFollow,
            url: Some(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorialResult {
    pub platform: Platform,
    pub problem: Option<ProblemMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editorial_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Combine metadata and whatever the locator produced into the final record.
///
/// Text no longer than `min_chars` is treated as no editorial at all.
pub fn assemble(
    platform: Platform,
    problem: ProblemMetadata,
    extracted: Option<ExtractedEditorial>,
    min_chars: usize,
) -> EditorialResult {
    let mut result = EditorialResult {
        platform,
        problem: Some(problem),
        text: None,
        text_length: None,
        available: false,
        source: None,
        editorial_url: None,
        message: None,
        error: None,
    };

    match extracted {
        Some(found) if char_len(&found.text) > min_chars => {
            result.text_length = Some(char_len(&found.text));
            result.text = Some(found.text);
            result.source = Some(found.source);
            result.editorial_url = found.url;
            result.available = true;
        }
        Some(found) => {
            result.editorial_url = found.url;
            result.message = Some(UNAVAILABLE_MESSAGE.to_string());
        }
        None => result.message = Some(UNAVAILABLE_MESSAGE.to_string()),
    }
    result
}

impl EditorialResult {
    /// The record returned when the pipeline failed outright.
    pub fn failure(
        platform: Platform,
        problem: Option<ProblemMetadata>,
        error: &EditorialError,
    ) -> Self {
        Self {
            platform,
            problem,
            text: None,
            text_length: None,
            available: false,
            source: None,
            editorial_url: None,
            message: None,
            error: Some(format!("Error fetching editorial: {}", error)),
        }
    }

    /// Shorten the text for display, keeping `text_length` at the full size.
    pub fn preview(mut self, max_chars: usize) -> Self {
        if let Some(text) = self.text.take() {
            self.text = Some(if char_len(&text) > max_chars {
                format!("{}{}", truncate_chars(&text, max_chars), PREVIEW_MARKER)
            } else {
                text
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(len: usize) -> ExtractedEditorial {
        ExtractedEditorial {
            text: "x".repeat(len),
            source: Strategy::Tab,
            url: None,
        }
    }

    fn metadata() -> ProblemMetadata {
        ProblemMetadata {
            code: "FLOW001".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn text_at_threshold_should_be_unavailable() {
        let result = assemble(Platform::CodeChef, metadata(), Some(extracted(50)), 50);
        assert!(!result.available);
        assert_eq!(result.text, None);
        assert_eq!(result.message.as_deref(), Some(UNAVAILABLE_MESSAGE));
    }

    #[test]
    fn text_over_threshold_should_be_available() {
        let result = assemble(Platform::CodeChef, metadata(), Some(extracted(51)), 50);
        assert!(result.available);
        assert_eq!(result.text_length, Some(51));
        assert_eq!(result.source, Some(Strategy::Tab));
        assert_eq!(result.message, None);
    }

    #[test]
    fn threshold_should_count_chars_not_bytes() {
        let found = ExtractedEditorial {
            text: "разбор".repeat(8),
            source: Strategy::LinkFollow,
            url: Some("https://codeforces.com/blog/entry/1".to_string()),
        };
        let result = assemble(Platform::Codeforces, metadata(), Some(found), 50);
        assert!(!result.available);
        assert_eq!(
            result.editorial_url.as_deref(),
            Some("https://codeforces.com/blog/entry/1")
        );
    }

    #[test]
    fn missing_editorial_should_carry_message() {
        let result = assemble(Platform::Codeforces, metadata(), None, 50);
        assert!(!result.available);
        assert!(result.error.is_none());
        assert_eq!(result.message.as_deref(), Some(UNAVAILABLE_MESSAGE));
    }

    #[test]
    fn failure_should_serialize_without_text() {
        let err = EditorialError::InvalidUrl("nope".to_string());
        let result = EditorialResult::failure(Platform::CodeChef, None, &err);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["available"], false);
        assert_eq!(json["error"], "Error fetching editorial: invalid problem URL: nope");
        assert!(json.get("text").is_none());
    }

    #[test]
    fn preview_should_truncate_long_text() {
        let result = assemble(Platform::CodeChef, metadata(), Some(extracted(120)), 50).preview(100);
        let text = result.text.unwrap();

        assert!(text.starts_with(&"x".repeat(100)));
        assert!(text.ends_with("[... truncated for preview ...]"));
        assert_eq!(result.text_length, Some(120));

        let short = assemble(Platform::CodeChef, metadata(), Some(extracted(60)), 50).preview(100);
        assert_eq!(short.text.unwrap().len(), 60);
    }

    #[test]
    fn bare_metadata_should_come_from_url() {
        let problem = ProblemRef::parse(
            Platform::Codeforces,
            "https://codeforces.com/contest/1741/problem/B",
        )
        .unwrap();
        let meta = ProblemMetadata::bare(&problem);
        assert_eq!(meta.code, "1741B");
        assert_eq!(meta.contest.as_deref(), Some("1741"));
        assert!(meta.name.is_none());
    }
}
