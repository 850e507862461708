use crate::config::EditorialConfig;
use html5ever::tree_builder::TreeSink;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

/// Where an editorial was found on a problem page.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    Tab,
    HeaderScan,
    LinkFollow,
    HeuristicScan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorialCandidate {
    pub source_strategy: Strategy,
    pub raw_text: String,
    pub confident: bool,
}

/// What the locator settled on: text to clean up, or a page to fetch next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Text(EditorialCandidate),
    Link(String),
}

type StrategyFn = fn(&Html, &EditorialConfig) -> Option<Located>;

/// Tried top to bottom; the first one that produces something wins.
pub const STRATEGIES: &[(Strategy, StrategyFn)] = &[
    (Strategy::Tab, by_container),
    (Strategy::HeaderScan, by_header),
    (Strategy::LinkFollow, by_link),
    (Strategy::HeuristicScan, by_keywords),
];

/// Parse a page and drop nodes whose text is never prose.
pub fn parse_page(html: &str) -> Html {
    let mut document = Html::parse_document(html);
    let noise = document
        .select(&Selector::parse("script, style, noscript, template").unwrap())
        .map(|node| node.id())
        .collect::<Vec<_>>();

    for id in noise {
        document.remove_from_parent(&id);
    }
    document
}

pub fn locate(document: &Html, config: &EditorialConfig) -> Option<Located> {
    STRATEGIES.iter().find_map(|(strategy, run)| {
        let found = run(document, config);
        if found.is_some() {
            debug!("locator: {} matched", strategy);
        }
        found
    })
}

pub fn run_strategy(strategy: Strategy, document: &Html, config: &EditorialConfig) -> Option<Located> {
    STRATEGIES
        .iter()
        .find(|(s, _)| *s == strategy)
        .and_then(|(_, run)| run(document, config))
}

/// Text nodes trimmed and joined one per line, blank ones skipped.
pub fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl EditorialCandidate {
    pub fn new(source_strategy: Strategy, raw_text: String, min_chars: usize) -> Self {
        Self {
            confident: char_len(&raw_text) > min_chars,
            source_strategy,
            raw_text,
        }
    }
}

fn accept(strategy: Strategy, raw_text: String, min_chars: usize) -> Option<Located> {
    let candidate = EditorialCandidate::new(strategy, raw_text, min_chars);
    candidate.confident.then_some(Located::Text(candidate))
}

fn names_editorial(element: &ElementRef) -> bool {
    let el = element.value();
    if matches!(el.name(), "html" | "body") {
        return false;
    }
    el.id()
        .is_some_and(|id| id.to_ascii_lowercase().contains("editorial"))
        || el
            .classes()
            .any(|class| class.to_ascii_lowercase().contains("editorial"))
}

fn by_container(document: &Html, config: &EditorialConfig) -> Option<Located> {
    document
        .select(&Selector::parse("[id], [class]").unwrap())
        .filter(names_editorial)
        .find_map(|el| accept(Strategy::Tab, element_text(el), config.tab_min_chars))
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn statement_scope(document: &Html) -> ElementRef<'_> {
    document
        .select(&Selector::parse("div[class]").unwrap())
        .find(|el| {
            el.value().classes().any(|class| {
                let class = class.to_ascii_lowercase();
                class.contains("problem-statement") || class.contains("problem_description")
            })
        })
        .unwrap_or_else(|| document.root_element())
}

fn by_header(document: &Html, config: &EditorialConfig) -> Option<Located> {
    let scope = statement_scope(document);

    scope
        .select(&Selector::parse("h2, h3, h4").unwrap())
        .filter(|header| {
            let title = element_text(*header).to_lowercase();
            config.header_keywords.iter().any(|kw| title.contains(kw.as_str()))
        })
        .find_map(|header| {
            let level = heading_level(header.value().name())?;
            let section = header
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .take_while(|sibling| {
                    heading_level(sibling.value().name()).map_or(true, |l| l > level)
                })
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n");

            accept(Strategy::HeaderScan, section, config.header_min_chars)
        })
}

fn by_link(document: &Html, config: &EditorialConfig) -> Option<Located> {
    document
        .select(&Selector::parse("a[href]").unwrap())
        .filter_map(|a| a.value().attr("href"))
        .find(|href| {
            let href = href.to_ascii_lowercase();
            config.link_markers.iter().any(|m| href.contains(m.as_str()))
        })
        .map(|href| Located::Link(href.to_string()))
}

fn by_keywords(document: &Html, config: &EditorialConfig) -> Option<Located> {
    document
        .select(&Selector::parse("div, section, article, main, p").unwrap())
        .map(element_text)
        .find(|text| looks_like_editorial(text, config))
        .and_then(|text| accept(Strategy::HeuristicScan, text, config.heuristic_min_chars))
}

/// Mentions solution vocabulary, is long enough, and is not just the
/// statement's input section.
fn looks_like_editorial(text: &str, config: &EditorialConfig) -> bool {
    if char_len(text) <= config.heuristic_min_chars {
        return false;
    }
    let lower = text.to_lowercase();
    if !config.editorial_keywords.iter().any(|kw| lower.contains(kw.as_str())) {
        return false;
    }
    !lower.contains("input format") || text.matches('\n').count() > config.statement_max_newlines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn filler(n: usize) -> String {
        vec!["the prefix sums give each answer"; n].join(" ")
    }

    fn text_of(found: Option<Located>) -> (Strategy, String) {
        match found {
            Some(Located::Text(candidate)) => (candidate.source_strategy, candidate.raw_text),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn tab_container_should_beat_longer_heuristic_block() {
        let html = format!(
            r#"<html><body>
            <div id="problem-editorial"><p>Approach: {}</p></div>
            <section><p>Solution approach and time complexity: {}</p></section>
            </body></html>"#,
            filler(5),
            filler(40)
        );
        let document = parse_page(&html);
        let (strategy, text) = text_of(locate(&document, &EditorialConfig::default()));

        assert_eq!(strategy, Strategy::Tab);
        assert!(text.starts_with("Approach:"));
    }

    #[test]
    fn short_container_should_fall_through() {
        let html = format!(
            r#"<div class="editorial-tab">soon</div>
            <div class="problem-statement">
              <h2>Statement</h2><p>Read the input.</p>
              <h3>Explanation</h3><p>{}</p><ul><li>{}</li></ul>
              <h3>Sample</h3><p>not part of it</p>
            </div>"#,
            filler(3),
            filler(2)
        );
        let document = parse_page(&html);
        let (strategy, text) = text_of(locate(&document, &EditorialConfig::default()));

        assert_eq!(strategy, Strategy::HeaderScan);
        assert!(!text.contains("not part of it"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn page_level_editorial_class_should_not_count_as_tab() {
        let html = format!(
            r#"<html class="editorial-page"><body class="editorial-view">
            <nav>Home</nav><p>{}</p></body></html>"#,
            filler(10)
        );
        let document = parse_page(&html);
        assert_eq!(run_strategy(Strategy::Tab, &document, &EditorialConfig::default()), None);

        let html = format!(
            r#"<body class="editorial-view"><nav>Home</nav>
            <section id="editorial-body"><p>{}</p></section></body>"#,
            filler(5)
        );
        let document = parse_page(&html);
        let (strategy, text) = text_of(locate(&document, &EditorialConfig::default()));
        assert_eq!(strategy, Strategy::Tab);
        assert!(!text.contains("Home"));
    }

    #[test]
    fn header_section_should_include_deeper_headers() {
        let html = format!(
            "<body><h2>Editorial</h2><p>{}</p><h3>Complexity</h3><p>O(n)</p><h2>Comments</h2><p>nice</p></body>",
            filler(4)
        );
        let document = parse_page(&html);
        let found = run_strategy(Strategy::HeaderScan, &document, &EditorialConfig::default());
        let (_, text) = text_of(found);

        assert!(text.contains("Complexity\nO(n)"));
        assert!(!text.contains("nice"));
    }

    #[test]
    fn link_should_be_returned_as_reference() {
        let html = r#"<body><p>Nothing here.</p><a href="/users/chef">chef</a>
            <a href="https://discuss.codechef.com/t/flow001-editorial/1">Editorial</a></body>"#;
        let document = parse_page(html);

        assert_eq!(
            locate(&document, &EditorialConfig::default()),
            Some(Located::Link("https://discuss.codechef.com/t/flow001-editorial/1".to_string()))
        );
    }

    #[test]
    fn heuristic_should_skip_plain_statement() {
        let statement = format!(
            "<div><p>Find a solution. {} Input Format: one line.</p></div>",
            filler(10)
        );
        let document = parse_page(&statement);
        assert_eq!(locate(&document, &EditorialConfig::default()), None);

        let long_statement = format!(
            "<div><p>Input format and solution. {}</p>{}</div>",
            filler(10),
            "<p>line</p>".repeat(25)
        );
        let document = parse_page(&long_statement);
        let (strategy, _) = text_of(locate(&document, &EditorialConfig::default()));
        assert_eq!(strategy, Strategy::HeuristicScan);
    }

    #[test]
    fn scripts_should_not_leak_into_text() {
        let document = parse_page(
            "<body><div id='editorial'><script>var approach = 1;</script><p>Greedy works.</p></div></body>",
        );
        let el = document
            .select(&Selector::parse("#editorial").unwrap())
            .next()
            .unwrap();
        assert_eq!(element_text(el), "Greedy works.");
    }

    #[test]
    fn fixture_page_should_use_tab() {
        let content = fs::read_to_string("fixtures/codechef_problem.html").unwrap();
        let document = parse_page(&content);
        let (strategy, text) = text_of(locate(&document, &EditorialConfig::default()));

        assert_eq!(strategy, Strategy::Tab);
        assert!(text.contains("QUICK EXPLANATION"));
        assert!(!text.contains("Input Format"));
    }

    #[test]
    fn strategy_names_should_be_kebab_case() {
        assert_eq!(Strategy::HeaderScan.to_string(), "header-scan");
        assert_eq!("link-follow".parse::<Strategy>().unwrap(), Strategy::LinkFollow);
    }
}
