//! Natural-language prompt back to a command string, best effort.
//!
//! The inverse direction is inherently lossy: the recovered command keeps
//! whatever action, subject, specifiers and modifiers the keyword scan can
//! pick out of the prose, and drops the rest. The output always re-parses,
//! and the same prompt always yields the same command.

use crate::ast::Bucket;
use crate::transpile::ActionTemplates;

/// Keyword vocabulary for must-modifier detection. Scanned in order; every
/// group whose keyword appears contributes its modifier.
const MUST_KEYWORDS: &[(&str, &[&str])] = &[
    ("short", &["short", "brief", "concise"]),
    ("detailed", &["detailed", "comprehensive", "thorough"]),
    ("professional", &["professional"]),
    ("formal", &["formal"]),
    ("casual", &["casual", "informal"]),
    ("simple", &["simple", "easy to understand", "eli5"]),
    ("examples", &["example", "examples"]),
    ("typed", &["type hint", "typed", "type annotation"]),
];

const SUBJECT_MARKERS: &[&str] = &["about ", "for ", "of ", "on "];
const VERB_MARKERS: &[&str] = &["write ", "create ", "generate ", "make "];
const PRIORITY_MARKERS: &[&str] = &["focus on", "prioritize"];
const AVOID_MARKERS: &[&str] = &["don't", "do not", "avoid", "no "];

const LANGUAGES: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "rust",
    "go",
    "java",
    "ruby",
    "c++",
    "c#",
];
const FORMATS: &[&str] = &["json", "csv", "xml", "yaml", "markdown", "html"];

/// Recover a command string from a prompt.
///
/// Action detection probes the template table's keys and falls back to
/// `write`; the subject comes from the first quoted span, or failing that
/// from the text after a preposition or verb marker.
pub fn to_command(prompt: &str, templates: &ActionTemplates) -> String {
    let lower = prompt.to_lowercase();

    let action = detect_action(&lower, templates);
    let subject = quoted_subject(prompt).or_else(|| marker_subject(&lower));

    let mut parts = vec![action.to_string()];
    if let Some(subject) = subject {
        parts.push(format!("\"{}\"", subject));
    }
    for spec in detect_specifiers(&lower) {
        parts.push(format!("[{}]", spec));
    }
    parts.extend(detect_modifiers(&lower));
    parts.join(" ")
}

fn detect_action<'a>(lower: &str, templates: &'a ActionTemplates) -> &'a str {
    templates
        .templates
        .keys()
        .find(|action| lower.contains(action.as_str()))
        .map(String::as_str)
        .unwrap_or("write")
}

fn quoted_subject(prompt: &str) -> Option<String> {
    let start = prompt.find('"')? + 1;
    let len = prompt[start..].find('"')?;
    Some(prompt[start..start + len].to_string())
}

fn marker_subject(lower: &str) -> Option<String> {
    let (idx, marker_len) = find_leftmost(lower, SUBJECT_MARKERS)
        .or_else(|| find_leftmost(lower, VERB_MARKERS))?;
    let mut rest = &lower[idx + marker_len..];
    rest = rest.strip_prefix("a ").unwrap_or(rest);
    let end = rest.find(['.', ',']).unwrap_or(rest.len());
    let subject = rest[..end].trim();
    if subject.is_empty() {
        None
    } else {
        Some(subject.to_string())
    }
}

/// Position and length of the leftmost occurrence of any marker.
fn find_leftmost(text: &str, markers: &[&str]) -> Option<(usize, usize)> {
    markers
        .iter()
        .filter_map(|marker| text.find(marker).map(|idx| (idx, marker.len())))
        .min()
}

fn detect_specifiers(lower: &str) -> Vec<&'static str> {
    let mut specs = Vec::new();
    if let Some(lang) = LANGUAGES.iter().find(|lang| lower.contains(*lang)) {
        specs.push(*lang);
    }
    if let Some(fmt) = FORMATS.iter().find(|fmt| lower.contains(*fmt)) {
        specs.push(*fmt);
    }
    specs
}

fn detect_modifiers(lower: &str) -> Vec<String> {
    let mut modifiers = Vec::new();

    for (key, keywords) in MUST_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            modifiers.push(format!("{}{}", Bucket::Must.sigil(), key));
        }
    }

    if let Some((idx, marker_len)) = find_leftmost(lower, PRIORITY_MARKERS) {
        if let Some(word) = word_after(&lower[idx + marker_len..]) {
            modifiers.push(format!("{}{}", Bucket::Priority.sigil(), word));
        }
    }

    for marker in AVOID_MARKERS {
        if let Some(idx) = lower.find(marker) {
            if let Some(word) = word_after(&lower[idx + marker.len()..]) {
                modifiers.push(format!("{}{}", Bucket::Avoid.sigil(), word));
            }
        }
    }

    modifiers
}

/// The word following a marker, demanding at least one whitespace separator.
fn word_after(rest: &str) -> Option<String> {
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let word: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}
