use crate::{
    assemble::{assemble, EditorialResult, ExtractedEditorial, ProblemMetadata},
    config::EditorialConfig,
    error::Result,
    locate::{element_text, locate, parse_page, Located, Strategy},
    normalize::{normalize_text, truncate_chars},
    problem::{CodeChefProblem, Platform, ProblemRef},
    render::{absolute_url, Renderer},
};
use derive_builder::Builder;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{info, warn};

static DIFFICULTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(simple|easy|medium|hard|challenge)\b").unwrap());

/// Editorial lookup for CodeChef problems.
///
/// ```no_run
/// # async fn run() -> anyhow::Result<()> {
/// use cp_editorial::{codechef::CodeChefEditorialsBuilder, config::EditorialConfig, render::HttpRenderer};
///
/// let editorials = CodeChefEditorialsBuilder::default()
///     .renderer(HttpRenderer::new(&EditorialConfig::default())?)
///     .build()?;
/// let result = editorials.get_editorial("https://www.codechef.com/problems/FLOW001").await;
/// println!("{}", result.available);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Builder)]
#[builder(pattern = "owned")]
pub struct CodeChefEditorials<R> {
    renderer: R,
    #[builder(default)]
    config: EditorialConfig,
}

impl<R: Renderer> CodeChefEditorials<R> {
    /// Never fails: problems along the way end up in `EditorialResult::error`.
    pub async fn get_editorial(&self, url: &str) -> EditorialResult {
        let problem = match CodeChefProblem::parse(url) {
            Ok(problem) => problem,
            Err(e) => {
                warn!("codechef: {}", e);
                return EditorialResult::failure(Platform::CodeChef, None, &e);
            }
        };

        match self.fetch_editorial(&problem).await {
            Ok(result) => result,
            Err(e) => {
                warn!("codechef: {} failed: {}", problem.problem_code, e);
                let bare = ProblemMetadata::bare(&ProblemRef::CodeChef(problem));
                EditorialResult::failure(Platform::CodeChef, Some(bare), &e)
            }
        }
    }

    /// Problem metadata only, without looking for the editorial.
    pub async fn metadata(&self, url: &str) -> Result<ProblemMetadata> {
        let problem = CodeChefProblem::parse(url)?;
        let page = self
            .renderer
            .render(&problem.page_url(&self.config.codechef_host))
            .await?;
        Ok(extract_problem_metadata(&parse_page(&page.html), &problem))
    }

    async fn fetch_editorial(&self, problem: &CodeChefProblem) -> Result<EditorialResult> {
        info!(
            "codechef: fetching editorial for {} (contest: {})",
            problem.problem_code,
            problem.contest_code.as_deref().unwrap_or("-")
        );

        let page = self
            .renderer
            .render(&problem.page_url(&self.config.codechef_host))
            .await?;
        let (metadata, located) = {
            let document = parse_page(&page.html);
            (
                extract_problem_metadata(&document, problem),
                locate(&document, &self.config),
            )
        };
        info!(
            "codechef: {} is {:?} ({:?})",
            metadata.code, metadata.name, metadata.difficulty
        );

        let extracted = match located {
            Some(Located::Text(candidate)) => {
                info!("codechef: editorial found by {}", candidate.source_strategy);
                Some(ExtractedEditorial {
                    text: normalize_text(&candidate.raw_text),
                    source: candidate.source_strategy,
                    url: None,
                })
            }
            Some(Located::Link(href)) => self.follow_link(&href).await,
            None => {
                info!("codechef: no editorial content on {}", page.url);
                None
            }
        };

        Ok(assemble(
            Platform::CodeChef,
            metadata,
            extracted,
            self.config.available_min_chars,
        ))
    }

    /// A linked page that cannot be loaded leaves the editorial unavailable
    /// without failing the request.
    async fn follow_link(&self, href: &str) -> Option<ExtractedEditorial> {
        let url = match absolute_url(&self.config.codechef_host, href) {
            Ok(url) => url,
            Err(e) => {
                warn!("codechef: unusable editorial link {:?}: {}", href, e);
                return None;
            }
        };
        info!("codechef: following editorial link {}", url);

        let page = match self.renderer.render(&url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("codechef: {}", e);
                return Some(ExtractedEditorial::link_only(url));
            }
        };
        let raw = linked_page_text(&parse_page(&page.html), self.config.linked_text_limit);

        Some(ExtractedEditorial {
            text: normalize_text(&raw),
            source: Strategy::LinkFollow,
            url: Some(url),
        })
    }
}

pub fn extract_problem_metadata(document: &Html, problem: &CodeChefProblem) -> ProblemMetadata {
    let name = document
        .select(&Selector::parse("h1").unwrap())
        .map(element_text)
        .find(|text| !text.is_empty());

    let difficulty = text_labelled(document, "difficulty:")
        .into_iter()
        .chain(elements_with_class(document, "difficulty").map(element_text))
        .find_map(|text| DIFFICULTY_RE.captures(&text).map(|caps| capitalize(&caps[1])));

    let tags = elements_with_class(document, "tag")
        .next()
        .map(|container| {
            container
                .select(&Selector::parse("a").unwrap())
                .map(element_text)
                .filter(|tag| !tag.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    ProblemMetadata {
        code: problem.problem_code.clone(),
        contest: problem.contest_code.clone(),
        name,
        difficulty,
        tags,
        success_rate: text_labelled(document, "success rate:"),
    }
}

/// Main text of an editorial page reached through a link.
pub fn linked_page_text(document: &Html, limit: usize) -> String {
    let content = ["editorial", "content", "post"]
        .iter()
        .find_map(|name| elements_with_class(document, name).next());

    match content {
        Some(el) => element_text(el),
        None => truncate_chars(&element_text(document.root_element()), limit).to_string(),
    }
}

fn elements_with_class<'a>(
    document: &'a Html,
    needle: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |el| {
            el.value()
                .classes()
                .any(|class| class.to_ascii_lowercase().contains(needle))
        })
}

/// Text of the element holding the first text node that contains `label`.
fn text_labelled(document: &Html, label: &str) -> Option<String> {
    document
        .root_element()
        .descendants()
        .find(|node| {
            node.value()
                .as_text()
                .is_some_and(|text| text.to_lowercase().contains(label))
        })
        .and_then(|node| node.parent())
        .and_then(ElementRef::wrap)
        .map(element_text)
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
