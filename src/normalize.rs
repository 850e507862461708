use regex::Regex;
use std::sync::LazyLock;

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());
static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+([,.])").unwrap());
static STANDALONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Z]|\d+|-|\*)$").unwrap());

const MATH_GLYPHS: &[(&str, &str)] = &[
    ("\u{22C5}", "*"),
    ("\u{2260}", "!="),
    ("\u{2264}", "<="),
    ("\u{2265}", ">="),
    ("\u{2192}", "->"),
];

/// Lines this short are usually debris from split inline markup or MathJax.
const ORPHAN_MAX_CHARS: usize = 2;
/// A neighbour must be longer than this to absorb an orphan.
const NEIGHBOUR_MIN_CHARS: usize = 3;

/// Turn text scraped out of an editorial page into readable prose.
///
/// The passes run in a fixed order and the function is idempotent: feeding
/// the output back in returns it unchanged.
pub fn normalize_text(raw: &str) -> String {
    let text = collapse(raw);
    let text = text.replace("\\n", " ");
    let text = SPACE_BEFORE_PUNCT_RE.replace_all(&text, "$1");
    let text = merge_orphans(&text);
    let text = replace_math_glyphs(&text);
    let text = collapse(&text);

    text.split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Cut `text` to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn collapse(text: &str) -> String {
    let text = BLANK_RUN_RE.replace_all(text, "\n\n");
    SPACE_RUN_RE.replace_all(&text, " ").into_owned()
}

fn is_orphan(line: &str) -> bool {
    line.chars().count() <= ORPHAN_MAX_CHARS && !STANDALONE_RE.is_match(line)
}

fn has_content(line: &str) -> bool {
    line.trim().chars().count() > NEIGHBOUR_MIN_CHARS
}

/// Fold orphan lines into a neighbour, preferring the following line, and
/// squeeze blank runs down to a single paragraph break.
fn merge_orphans(text: &str) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let mut kept: Vec<String> = Vec::with_capacity(lines.len());

    for i in 0..lines.len() {
        let line = std::mem::take(&mut lines[i]);
        let stripped = line.trim();

        if stripped.is_empty() {
            if kept.last().is_some_and(|last| !last.trim().is_empty()) {
                kept.push(String::new());
            }
            continue;
        }

        if !is_orphan(stripped) {
            kept.push(line);
            continue;
        }

        if let Some(next) = lines.get_mut(i + 1).filter(|next| has_content(next)) {
            *next = format!("{} {}", stripped, next.trim());
            continue;
        }

        if let Some(prev) = kept.last_mut().filter(|prev| has_content(prev)) {
            prev.push(' ');
            prev.push_str(stripped);
        }
    }

    kept.join("\n")
}

fn replace_math_glyphs(text: &str) -> String {
    MATH_GLYPHS
        .iter()
        .fold(text.to_string(), |acc, (glyph, ascii)| acc.replace(glyph, ascii))
}
