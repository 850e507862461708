use crate::error::{EditorialError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::{Display, EnumString};
use url::Url;

static CODECHEF_CONTEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/([A-Z0-9]+)/problems/([A-Z0-9_]+)$").unwrap());
static CODECHEF_PRACTICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/problems/([A-Z0-9_]+)$").unwrap());
static CODEFORCES_CONTEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/contest/(\d+)(?:/problem)?/([A-Za-z0-9]+)$").unwrap());
static CODEFORCES_PROBLEMSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/problemset/problem/(\d+)/([A-Za-z0-9]+)$").unwrap());

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Platform {
    CodeChef,
    Codeforces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProblemKind {
    Practice,
    Contest,
}

/// A CodeChef problem, optionally scoped to the contest it was opened from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChefProblem {
    pub problem_code: String,
    pub contest_code: Option<String>,
    #[serde(rename = "type")]
    pub kind: ProblemKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeforcesProblem {
    pub contest_id: String,
    pub index: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum ProblemRef {
    CodeChef(CodeChefProblem),
    Codeforces(CodeforcesProblem),
}

impl Platform {
    /// Guess the platform from the host part of a URL.
    pub fn detect(url: &str) -> Option<Self> {
        let host = Url::parse(url).ok()?.host_str()?.to_ascii_lowercase();
        if host == "codechef.com" || host.ends_with(".codechef.com") {
            Some(Self::CodeChef)
        } else if host == "codeforces.com" || host.ends_with(".codeforces.com") {
            Some(Self::Codeforces)
        } else {
            None
        }
    }
}

impl ProblemRef {
    pub fn parse(platform: Platform, url: &str) -> Result<Self> {
        match platform {
            Platform::CodeChef => CodeChefProblem::parse(url).map(Self::CodeChef),
            Platform::Codeforces => CodeforcesProblem::parse(url).map(Self::Codeforces),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Self::CodeChef(_) => Platform::CodeChef,
            Self::Codeforces(_) => Platform::Codeforces,
        }
    }

    /// The platform-wide identifier: `FLOW001`, `1741B`.
    pub fn code(&self) -> String {
        match self {
            Self::CodeChef(p) => p.problem_code.clone(),
            Self::Codeforces(p) => format!("{}{}", p.contest_id, p.index),
        }
    }
}

impl CodeChefProblem {
    /// Accepts `/problems/<CODE>` and `/<CONTEST>/problems/<CODE>`, with any
    /// query string or trailing slash. Codes are upper-cased.
    pub fn parse(url: &str) -> Result<Self> {
        let path = url_path(url)?;

        if let Some(caps) = CODECHEF_CONTEST_RE.captures(&path) {
            // `/problems/problems/X` would otherwise read as contest "problems"
            if !caps[1].eq_ignore_ascii_case("problems") {
                return Ok(Self {
                    problem_code: caps[2].to_ascii_uppercase(),
                    contest_code: Some(caps[1].to_ascii_uppercase()),
                    kind: ProblemKind::Contest,
                });
            }
        }

        if let Some(caps) = CODECHEF_PRACTICE_RE.captures(&path) {
            return Ok(Self {
                problem_code: caps[1].to_ascii_uppercase(),
                contest_code: None,
                kind: ProblemKind::Practice,
            });
        }

        Err(EditorialError::InvalidUrl(url.to_string()))
    }

    pub fn page_url(&self, host: &str) -> String {
        let host = host.trim_end_matches('/');
        match &self.contest_code {
            Some(contest) => format!("{}/{}/problems/{}", host, contest, self.problem_code),
            None => format!("{}/problems/{}", host, self.problem_code),
        }
    }
}

impl CodeforcesProblem {
    /// Accepts `/contest/<N>/problem/<IDX>`, `/contest/<N>/<IDX>` and
    /// `/problemset/problem/<N>/<IDX>`. The index keeps its case.
    pub fn parse(url: &str) -> Result<Self> {
        let path = url_path(url)?;

        let caps = CODEFORCES_CONTEST_RE
            .captures(&path)
            .or_else(|| CODEFORCES_PROBLEMSET_RE.captures(&path))
            .filter(|caps| &caps[2] != "problem")
            .ok_or_else(|| EditorialError::InvalidUrl(url.to_string()))?;

        Ok(Self {
            contest_id: caps[1].to_string(),
            index: caps[2].to_string(),
        })
    }

    /// Problem pages worth looking at, in order: contest view, then problemset view.
    pub fn page_urls(&self, host: &str) -> Vec<String> {
        let host = host.trim_end_matches('/');
        vec![
            format!("{}/contest/{}/problem/{}", host, self.contest_id, self.index),
            format!("{}/problemset/problem/{}/{}", host, self.contest_id, self.index),
        ]
    }
}

/// Path part of `url` without query, fragment or trailing slash. Input that
/// is not an absolute URL is taken as a path already.
fn url_path(url: &str) -> Result<String> {
    let url = url.trim();
    let path = match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
        _ => {
            let end = url.find(['?', '#']).unwrap_or(url.len());
            url[..end].to_string()
        }
    };
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return Err(EditorialError::InvalidUrl(url.to_string()));
    }
    Ok(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codechef_practice_url_should_parse() {
        let parsed = CodeChefProblem::parse("https://www.codechef.com/problems/FLOW001").unwrap();
        insta::assert_yaml_snapshot!(parsed, @r###"
        ---
        problem_code: FLOW001
        contest_code: ~
        type: practice
        "###);
    }

    #[test]
    fn codechef_contest_url_should_parse() {
        let parsed =
            CodeChefProblem::parse("https://www.codechef.com/START159A/problems/MAXFUN/").unwrap();
        assert_eq!(parsed.problem_code, "MAXFUN");
        assert_eq!(parsed.contest_code.as_deref(), Some("START159A"));
        assert_eq!(parsed.kind, ProblemKind::Contest);
    }

    #[test]
    fn codechef_code_should_be_uppercased() {
        for url in [
            "https://www.codechef.com/problems/flow001",
            "https://www.codechef.com/problems/Flow001?tab=editorial",
            "https://www.codechef.com/start159a/problems/flow001",
        ] {
            let parsed = CodeChefProblem::parse(url).unwrap();
            assert_eq!(parsed.problem_code, "FLOW001", "{url}");
        }
    }

    #[test]
    fn host_should_not_be_read_as_contest() {
        for url in [
            "http://localhost/problems/flow001",
            "http://localhost:8080/problems/FLOW001/",
            "/problems/FLOW001?tab=editorial",
        ] {
            let parsed = CodeChefProblem::parse(url).unwrap();
            assert_eq!(parsed.problem_code, "FLOW001", "{url}");
            assert_eq!(parsed.contest_code, None, "{url}");
            assert_eq!(parsed.kind, ProblemKind::Practice, "{url}");
        }

        let parsed = CodeChefProblem::parse("http://localhost/START159A/problems/MAXFUN").unwrap();
        assert_eq!(parsed.contest_code.as_deref(), Some("START159A"));
    }

    #[test]
    fn codechef_url_without_problem_segment_should_fail() {
        for url in [
            "",
            "   ",
            "https://www.codechef.com/",
            "https://www.codechef.com/START159A",
            "https://www.codechef.com/users/tourist",
            "https://www.codechef.com/problems/",
        ] {
            assert!(
                matches!(CodeChefProblem::parse(url), Err(EditorialError::InvalidUrl(_))),
                "{url}"
            );
        }
    }

    #[test]
    fn codeforces_equivalent_urls_should_agree() {
        let expected = CodeforcesProblem {
            contest_id: "1741".to_string(),
            index: "B".to_string(),
        };
        for url in [
            "https://codeforces.com/contest/1741/problem/B",
            "https://codeforces.com/contest/1741/B",
            "https://codeforces.com/problemset/problem/1741/B/",
            "https://codeforces.com/contest/1741/problem/B?locale=en",
        ] {
            assert_eq!(CodeforcesProblem::parse(url).unwrap(), expected, "{url}");
        }
    }

    #[test]
    fn codeforces_index_should_keep_case() {
        let parsed = CodeforcesProblem::parse("https://codeforces.com/contest/1900/problem/d1").unwrap();
        assert_eq!(parsed.index, "d1");
    }

    #[test]
    fn codeforces_bad_urls_should_fail() {
        for url in [
            "",
            "https://codeforces.com/contest/abc/problem/B",
            "https://codeforces.com/blog/entry/107908",
            "https://codeforces.com/contest/1741",
            "https://codeforces.com/contest/1741/problem",
        ] {
            assert!(
                matches!(CodeforcesProblem::parse(url), Err(EditorialError::InvalidUrl(_))),
                "{url}"
            );
        }
    }

    #[test]
    fn problem_ref_should_serialize_with_platform_tag() {
        let problem = ProblemRef::parse(
            Platform::Codeforces,
            "https://codeforces.com/contest/1741/problem/B",
        )
        .unwrap();
        assert_eq!(problem.platform(), Platform::Codeforces);
        assert_eq!(problem.code(), "1741B");
        assert_eq!(
            serde_json::to_value(&problem).unwrap(),
            serde_json::json!({"platform": "codeforces", "contest_id": "1741", "index": "B"})
        );
    }

    #[test]
    fn platform_should_be_detected_from_host() {
        assert_eq!(
            Platform::detect("https://www.codechef.com/problems/FLOW001"),
            Some(Platform::CodeChef)
        );
        assert_eq!(
            Platform::detect("https://codeforces.com/contest/1741/B"),
            Some(Platform::Codeforces)
        );
        assert_eq!(Platform::detect("https://atcoder.jp/contests/abc300"), None);
        assert_eq!(Platform::detect("not a url"), None);
        assert_eq!("CodeForces".parse::<Platform>().unwrap(), Platform::Codeforces);
    }

    #[test]
    fn page_urls_should_use_host() {
        let chef = CodeChefProblem::parse("https://www.codechef.com/START159A/problems/MAXFUN").unwrap();
        assert_eq!(
            chef.page_url("https://www.codechef.com/"),
            "https://www.codechef.com/START159A/problems/MAXFUN"
        );

        let cf = CodeforcesProblem::parse("https://codeforces.com/contest/1741/B").unwrap();
        assert_eq!(
            cf.page_urls("https://codeforces.com"),
            vec![
                "https://codeforces.com/contest/1741/problem/B",
                "https://codeforces.com/problemset/problem/1741/B",
            ]
        );
    }
}
