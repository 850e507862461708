use crate::{
    assemble::{assemble, EditorialResult, ExtractedEditorial, MetadataLookup, ProblemMetadata},
    config::EditorialConfig,
    error::{EditorialError, Result},
    locate::{element_text, parse_page, Strategy},
    normalize::{normalize_text, truncate_chars},
    problem::{CodeforcesProblem, Platform, ProblemRef},
    render::{absolute_url, Renderer},
};
use async_trait::async_trait;
use derive_builder::Builder;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static ROUND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Round\s+#?(\d+)").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

const TITLE_MARKERS: &[&str] = &["editorial", "tutorial", "разбор"];
const BLOG_CONTAINERS: &[&str] = &["div.ttypography", "div.topic", "div.content"];

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    comment: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct Standings {
    pub contest: Contest,
    pub problems: Vec<ApiProblem>,
}

#[derive(Debug, Deserialize)]
pub struct Contest {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiProblem {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub rating: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogEntry {
    pub id: u64,
    pub title: String,
}

/// Where contest names and authors' blog posts come from.
#[async_trait]
pub trait BlogDirectory: Send + Sync {
    async fn contest_name(&self, contest_id: &str) -> Result<String>;
    /// Newest first, as the platform lists them.
    async fn blog_entries(&self, handle: &str) -> Result<Vec<BlogEntry>>;
}

/// Client for the public Codeforces API.
#[derive(Debug, Clone)]
pub struct CodeforcesApi {
    client: Client,
    base: String,
}

impl CodeforcesApi {
    pub fn new(config: &EditorialConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| EditorialError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base: config.codeforces_api.trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base, method);
        debug!("codeforces api: {} {:?}", method, query);

        let response: ApiResponse<T> = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| EditorialError::fetch(&url, e))?
            .json()
            .await
            .map_err(|e| EditorialError::fetch(&url, e))?;

        unwrap_response(method, response)
    }

    pub async fn standings(&self, contest_id: &str) -> Result<Standings> {
        self.call(
            "contest.standings",
            &[("contestId", contest_id), ("from", "1"), ("count", "1")],
        )
        .await
    }
}

fn unwrap_response<T>(method: &str, response: ApiResponse<T>) -> Result<T> {
    if response.status != "OK" {
        let comment = response.comment.unwrap_or_else(|| response.status.clone());
        return Err(EditorialError::Api(format!("{}: {}", method, comment)));
    }
    response
        .result
        .ok_or_else(|| EditorialError::Api(format!("{}: empty result", method)))
}

#[async_trait]
impl MetadataLookup for CodeforcesApi {
    async fn lookup(&self, problem: &ProblemRef) -> Result<ProblemMetadata> {
        let ProblemRef::Codeforces(cf) = problem else {
            return Err(EditorialError::NotFound(format!(
                "{} is not a Codeforces problem",
                problem.code()
            )));
        };
        problem_metadata(self.standings(&cf.contest_id).await?, cf)
    }
}

#[async_trait]
impl BlogDirectory for CodeforcesApi {
    async fn contest_name(&self, contest_id: &str) -> Result<String> {
        Ok(self.standings(contest_id).await?.contest.name)
    }

    async fn blog_entries(&self, handle: &str) -> Result<Vec<BlogEntry>> {
        self.call("user.blogEntries", &[("handle", handle)]).await
    }
}

pub fn problem_metadata(standings: Standings, problem: &CodeforcesProblem) -> Result<ProblemMetadata> {
    let found = standings
        .problems
        .into_iter()
        .find(|p| p.index == problem.index)
        .ok_or_else(|| {
            EditorialError::NotFound(format!(
                "problem {} in contest {}",
                problem.index, problem.contest_id
            ))
        })?;

    Ok(ProblemMetadata {
        code: format!("{}{}", problem.contest_id, problem.index),
        contest: Some(problem.contest_id.clone()),
        name: Some(found.name),
        difficulty: found.rating.map(|r| r.to_string()),
        tags: found.tags,
        success_rate: None,
    })
}

/// Editorial lookup for Codeforces problems.
#[derive(Debug, Builder)]
#[builder(pattern = "owned")]
pub struct CodeforcesEditorials<R, A> {
    renderer: R,
    api: A,
    #[builder(default)]
    config: EditorialConfig,
}

impl<R, A> CodeforcesEditorials<R, A>
where
    R: Renderer,
    A: MetadataLookup + BlogDirectory,
{
    /// Never fails: problems along the way end up in `EditorialResult::error`.
    pub async fn get_editorial(&self, url: &str) -> EditorialResult {
        let problem = match CodeforcesProblem::parse(url) {
            Ok(problem) => problem,
            Err(e) => {
                warn!("codeforces: {}", e);
                return EditorialResult::failure(Platform::Codeforces, None, &e);
            }
        };

        match self.fetch_editorial(&problem).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "codeforces: {}/{} failed: {}",
                    problem.contest_id, problem.index, e
                );
                let bare = ProblemMetadata::bare(&ProblemRef::Codeforces(problem));
                EditorialResult::failure(Platform::Codeforces, Some(bare), &e)
            }
        }
    }

    pub async fn metadata(&self, url: &str) -> Result<ProblemMetadata> {
        let problem = CodeforcesProblem::parse(url)?;
        self.api.lookup(&ProblemRef::Codeforces(problem)).await
    }

    /// The tutorial blog post for a problem: linked from the problem page if
    /// possible, otherwise searched for among known editorial authors' posts.
    pub async fn find_tutorial(&self, problem: &CodeforcesProblem) -> Option<String> {
        if let Some(url) = self.tutorial_from_pages(problem).await {
            info!("codeforces: tutorial linked from problem page: {}", url);
            return Some(url);
        }
        info!("codeforces: no tutorial link on problem page, searching author blogs");
        self.tutorial_from_authors(problem).await
    }

    async fn fetch_editorial(&self, problem: &CodeforcesProblem) -> Result<EditorialResult> {
        info!(
            "codeforces: fetching editorial for contest {} problem {}",
            problem.contest_id, problem.index
        );
        let metadata = self
            .api
            .lookup(&ProblemRef::Codeforces(problem.clone()))
            .await?;

        let extracted = match self.find_tutorial(problem).await {
            Some(url) => match self.renderer.render(&url).await {
                Ok(page) => {
                    let raw = blog_text(&parse_page(&page.html), self.config.blog_text_limit);
                    Some(ExtractedEditorial {
                        text: normalize_text(&raw),
                        source: Strategy::LinkFollow,
                        url: Some(url),
                    })
                }
                Err(e) => {
                    warn!("codeforces: tutorial unreadable: {}", e);
                    Some(ExtractedEditorial::link_only(url))
                }
            },
            None => None,
        };

        Ok(assemble(
            Platform::Codeforces,
            metadata,
            extracted,
            self.config.available_min_chars,
        ))
    }

    async fn tutorial_from_pages(&self, problem: &CodeforcesProblem) -> Option<String> {
        for url in problem.page_urls(&self.config.codeforces_host) {
            match self.renderer.render(&url).await {
                Ok(page) => {
                    let document = parse_page(&page.html);
                    if let Some(link) = find_tutorial_link(&document, &self.config.codeforces_host) {
                        return Some(link);
                    }
                }
                Err(e) => warn!("codeforces: {}", e),
            }
        }
        None
    }

    async fn tutorial_from_authors(&self, problem: &CodeforcesProblem) -> Option<String> {
        let name = match self.api.contest_name(&problem.contest_id).await {
            Ok(name) => name,
            Err(e) => {
                warn!("codeforces: contest {} name lookup failed: {}", problem.contest_id, e);
                return None;
            }
        };
        let Some(round) = round_number(&name) else {
            info!("codeforces: no round number in {:?}", name);
            return None;
        };
        debug!("codeforces: {:?} is round {}", name, round);

        for author in &self.config.editorial_authors {
            let entries = match self.api.blog_entries(author).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("codeforces: blog entries of {} unavailable: {}", author, e);
                    continue;
                }
            };
            if let Some(id) = editorial_entry(&entries, &round, self.config.recent_entries) {
                info!("codeforces: round {} editorial by {}: entry {}", round, author, id);
                return absolute_url(
                    &self.config.codeforces_host,
                    &format!("/blog/entry/{}", id),
                )
                .ok();
            }
        }
        None
    }
}

/// Find the tutorial link on a problem page, resolved against `host`.
pub fn find_tutorial_link(document: &Html, host: &str) -> Option<String> {
    let selector = Selector::parse("a[href]").unwrap();
    let anchors = document
        .select(&selector)
        .filter_map(|a| Some((element_text(a), a.value().attr("href")?)))
        .collect::<Vec<_>>();

    let exact = anchors.iter().find(|(text, _)| text == "Tutorial");
    let partial = || anchors.iter().find(|(text, _)| text.contains("Tutorial"));
    let blog = || {
        anchors.iter().find(|(text, href)| {
            let text = text.to_lowercase();
            (text.contains("tutorial") || text.contains("editorial")) && href.contains("/blog/")
        })
    };

    exact
        .or_else(partial)
        .or_else(blog)
        .and_then(|(_, href)| absolute_url(host, href).ok())
}

/// `"Codeforces Round 826 (Div. 3)"` -> `"826"`.
pub fn round_number(contest_name: &str) -> Option<String> {
    ROUND_RE
        .captures(contest_name)
        .map(|caps| caps[1].to_string())
}

/// First of the newest `limit` entries whose title names the round and
/// reads like an editorial.
pub fn editorial_entry(entries: &[BlogEntry], round: &str, limit: usize) -> Option<u64> {
    entries
        .iter()
        .take(limit)
        .find(|entry| {
            let title = TAG_RE.replace_all(&entry.title, "").to_lowercase();
            mentions_number(&title, round) && TITLE_MARKERS.iter().any(|m| title.contains(m))
        })
        .map(|entry| entry.id)
}

/// `number` appears in `text` with no digit directly before or after it.
fn mentions_number(text: &str, number: &str) -> bool {
    text.match_indices(number).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + number.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

/// Body text of a blog post, or the capped page text when no post body is found.
pub fn blog_text(document: &Html, limit: usize) -> String {
    BLOG_CONTAINERS
        .iter()
        .find_map(|css| document.select(&Selector::parse(css).unwrap()).next())
        .map(element_text)
        .unwrap_or_else(|| {
            truncate_chars(&element_text(document.root_element()), limit).to_string()
        })
}
