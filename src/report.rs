use crate::{
    assemble::EditorialResult,
    error::{EditorialError, Result},
};
use askama::Template;
use std::fmt::Write;

const MIN_HINTS: usize = 3;
const MAX_HINTS: usize = 5;

/// Standalone HTML page for one editorial result.
#[derive(Debug, Template)]
#[template(path = "editorial.html.j2")]
pub struct Report<'a> {
    pub title: String,
    pub result: &'a EditorialResult,
    pub paragraphs: Vec<&'a str>,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a EditorialResult) -> Self {
        let paragraphs = result
            .text
            .as_deref()
            .map(|text| {
                text.split("\n\n")
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title: title(result),
            result,
            paragraphs,
        }
    }

    pub fn generate(&self) -> Result<String> {
        Ok(self.render()?)
    }
}

fn title(result: &EditorialResult) -> String {
    match &result.problem {
        Some(problem) => match &problem.name {
            Some(name) => format!("{} - {}", problem.code, name),
            None => problem.code.clone(),
        },
        None => format!("{} problem", result.platform),
    }
}

/// Plain-text rendering for terminals.
pub fn render_text(result: &EditorialResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", title(result), result.platform);

    if let Some(problem) = &result.problem {
        if let Some(difficulty) = &problem.difficulty {
            let _ = writeln!(out, "Difficulty: {}", difficulty);
        }
        if !problem.tags.is_empty() {
            let _ = writeln!(out, "Tags: {}", problem.tags.join(", "));
        }
        if let Some(rate) = &problem.success_rate {
            let _ = writeln!(out, "Success rate: {}", rate);
        }
    }
    if let Some(url) = &result.editorial_url {
        let _ = writeln!(out, "Editorial: {}", url);
    }
    if let Some(source) = result.source {
        let _ = writeln!(
            out,
            "Found by: {} ({} chars)",
            source,
            result.text_length.unwrap_or_default()
        );
    }
    out.push('\n');

    match (&result.text, &result.message, &result.error) {
        (_, _, Some(error)) => out.push_str(error),
        (Some(text), _, _) => out.push_str(text),
        (None, Some(message), None) => out.push_str(message),
        (None, None, None) => {}
    }
    out.push('\n');
    out
}

/// Prompt asking a language model for `hints` graduated hints, clamped to 3..=5.
///
/// Only the last hint may describe the whole approach; the earlier ones are
/// meant to nudge without giving the solution away.
pub fn hint_prompt(result: &EditorialResult, hints: usize) -> Result<String> {
    let text = match (&result.text, result.available) {
        (Some(text), true) => text,
        _ => {
            let code = result
                .problem
                .as_ref()
                .map(|p| p.code.as_str())
                .unwrap_or("problem");
            return Err(EditorialError::NotFound(format!("editorial for {}", code)));
        }
    };
    let hints = hints.clamp(MIN_HINTS, MAX_HINTS);

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are helping a competitive programmer who is stuck on {}.",
        title(result)
    );
    let _ = writeln!(
        prompt,
        "Based on the editorial below, write {} hints, each more detailed than the one before.",
        hints
    );
    let _ = writeln!(prompt);
    for n in 1..=hints {
        let guidance = match n {
            1 => "a subtle push: name the key observation without formulas or code",
            n if n == hints => "the full idea of the solution and its complexity, still without code",
            2 => "a moderate conceptual insight that narrows the approach",
            _ => "the main algorithm or data structure and how it applies",
        };
        let _ = writeln!(prompt, "Hint {}: {}.", n, guidance);
    }
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Never include a complete program. Label each hint \"Hint N:\".");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Editorial:");
    prompt.push_str(text);
    prompt.push('\n');
    Ok(prompt)
}
