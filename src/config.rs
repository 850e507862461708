use crate::error::{EditorialError, Result};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Tunable knobs for the scraping heuristics.
///
/// The numbers and keyword lists were tuned by hand against live pages and
/// will drift as the platforms change their markup, so every one of them can
/// be overridden from a TOML file. Missing keys keep their defaults.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct EditorialConfig {
    /// Minimum text length for an `editorial`-named container.
    pub tab_min_chars: usize,
    /// Minimum text length for a section collected after a header.
    pub header_min_chars: usize,
    /// Minimum text length for a keyword-matched block.
    pub heuristic_min_chars: usize,
    /// A block mentioning "input format" is only accepted above this many lines.
    pub statement_max_newlines: usize,
    /// Extracted text must be longer than this to count as available.
    pub available_min_chars: usize,
    pub editorial_keywords: Vec<String>,
    pub header_keywords: Vec<String>,
    pub link_markers: Vec<String>,
    pub editorial_authors: Vec<String>,
    /// Only this many of an author's newest blog entries are searched.
    pub recent_entries: usize,
    pub blog_text_limit: usize,
    pub linked_text_limit: usize,
    pub preview_chars: usize,
    #[builder(setter(into))]
    pub codechef_host: String,
    #[builder(setter(into))]
    pub codeforces_host: String,
    #[builder(setter(into))]
    pub codeforces_api: String,
    pub request_timeout_secs: u64,
    pub settle_millis: u64,
    pub marker_timeout_secs: u64,
    #[builder(setter(into))]
    pub user_agent: String,
}

impl Default for EditorialConfig {
    fn default() -> Self {
        Self {
            tab_min_chars: 100,
            header_min_chars: 100,
            heuristic_min_chars: 200,
            statement_max_newlines: 20,
            available_min_chars: 50,
            editorial_keywords: strings(&[
                "approach",
                "solution",
                "algorithm",
                "complexity",
                "time complexity",
            ]),
            header_keywords: strings(&["editorial", "solution", "explanation", "tutorial"]),
            link_markers: strings(&["editorial", "discuss", "blog"]),
            editorial_authors: strings(&["awoo", "BledDest", "Neon", "vovuh"]),
            recent_entries: 50,
            blog_text_limit: 20_000,
            linked_text_limit: 15_000,
            preview_chars: 2_000,
            codechef_host: "https://www.codechef.com".to_string(),
            codeforces_host: "https://codeforces.com".to_string(),
            codeforces_api: "https://codeforces.com/api".to_string(),
            request_timeout_secs: 30,
            settle_millis: 3_000,
            marker_timeout_secs: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl EditorialConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EditorialError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| EditorialError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }

    pub fn marker_timeout(&self) -> Duration {
        Duration::from_secs(self.marker_timeout_secs)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
