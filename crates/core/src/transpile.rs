//! AST to natural-language prompt.
//!
//! A pure, deterministic tree walk: the same program and bindings always
//! produce byte-identical text. Clause order per node is fixed — base
//! sentence, specifiers, must, priority, nice, avoid — then the iteration
//! wrap, parallel siblings ("Also, "), the chain successor ("After that, ")
//! and finally the persona prefix for the whole program.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::{CommandNode, Program, Subject};
use crate::error::{LoadError, TranspileError};
use crate::resolve::AliasTable;

/// Placeholder name -> substitution value.
pub type Bindings = BTreeMap<String, String>;

/// Per-action sentence templates, keyed by the action identifier. `{subject}`
/// marks the subject position. Actions without an entry get a generic
/// sentence, so new actions need no code changes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTemplates {
    pub templates: BTreeMap<String, String>,
}

impl ActionTemplates {
    pub fn from_json(src: &str) -> Result<ActionTemplates, LoadError> {
        serde_json::from_str(src).map_err(|e| LoadError::new(format!("action templates: {}", e)))
    }

    pub fn get(&self, action: &str) -> Option<&str> {
        self.templates.get(action).map(String::as_str)
    }

    pub fn builtin() -> ActionTemplates {
        let entries: &[(&str, &str)] = &[
            // Text
            ("write", "Write {subject}"),
            ("rewrite", "Rewrite the following: {subject}"),
            ("summarize", "Summarize {subject}"),
            ("expand", "Expand on {subject} with more detail"),
            ("translate", "Translate {subject}"),
            ("explain", "Explain {subject}"),
            ("list", "List {subject}"),
            ("compare", "Compare {subject}"),
            ("reply", "Write a reply to {subject}"),
            ("title", "Generate a title for {subject}"),
            // Image
            ("img", "Generate an image of {subject}"),
            ("logo", "Design a logo for {subject}"),
            ("icon", "Create an icon for {subject}"),
            ("diagram", "Create a diagram showing {subject}"),
            ("mockup", "Create a UI mockup for {subject}"),
            // Code
            ("code", "Write code for {subject}"),
            ("fix", "Fix the following code: {subject}"),
            ("refactor", "Refactor the following code: {subject}"),
            ("test", "Write tests for {subject}"),
            ("review", "Review this code: {subject}"),
            ("convert", "Convert this code: {subject}"),
            ("api", "Design an API for {subject}"),
            ("query", "Write a database query for {subject}"),
            ("regex", "Create a regex pattern for {subject}"),
            ("docs", "Write documentation for {subject}"),
            // Analysis
            ("analyze", "Analyze {subject}"),
            ("evaluate", "Evaluate {subject}"),
            ("predict", "Predict {subject}"),
            ("diagnose", "Diagnose issues in {subject}"),
            ("recommend", "Recommend {subject}"),
            ("rank", "Rank {subject}"),
            ("verify", "Verify {subject}"),
            ("extract", "Extract {subject}"),
            ("classify", "Classify {subject}"),
            ("sentiment", "Analyze the sentiment of {subject}"),
            // Creative
            ("brainstorm", "Brainstorm ideas for {subject}"),
            ("name", "Generate names for {subject}"),
            ("story", "Write a story about {subject}"),
            ("joke", "Write a joke about {subject}"),
            ("poem", "Write a poem about {subject}"),
            ("script", "Write a script for {subject}"),
            ("pitch", "Create a pitch for {subject}"),
            ("slogan", "Create a slogan for {subject}"),
            ("recipe", "Create a recipe for {subject}"),
            ("playlist", "Create a playlist for {subject}"),
            // Data
            ("format", "Format {subject}"),
            ("merge", "Merge {subject}"),
            ("split", "Split {subject}"),
            ("filter", "Filter {subject}"),
            ("sort", "Sort {subject}"),
            ("dedupe", "Remove duplicates from {subject}"),
            ("validate", "Validate {subject}"),
            ("parse", "Parse {subject}"),
        ];
        ActionTemplates {
            templates: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Transpile a resolved program into prompt text.
///
/// Fails with [`TranspileError::UnboundPlaceholder`] before producing any
/// output if a referenced placeholder has no binding.
pub fn transpile(
    program: &Program,
    aliases: &AliasTable,
    templates: &ActionTemplates,
    bindings: &Bindings,
) -> Result<String, TranspileError> {
    let mut parts = Vec::with_capacity(program.commands().len());
    for command in program.commands() {
        parts.push(node_text(command, aliases, templates, bindings)?);
    }
    let body = parts.join(" ");
    Ok(match program.persona() {
        Some(persona) => format!("Acting as {}: {}", persona, body),
        None => body,
    })
}

fn node_text(
    node: &CommandNode,
    aliases: &AliasTable,
    templates: &ActionTemplates,
    bindings: &Bindings,
) -> Result<String, TranspileError> {
    let subject = match &node.subject {
        Some(Subject::Literal(text)) => substitute(text, bindings)?,
        Some(Subject::Placeholder(name)) => lookup(name, bindings)?.to_string(),
        None => String::new(),
    };

    let mut clauses = vec![base_sentence(&node.action, &subject, templates)];

    for spec in &node.specifiers {
        clauses.push(specifier_clause(&node.action, spec));
    }
    for key in &node.must {
        clauses.push(match aliases.expansion(crate::ast::Bucket::Must, key) {
            Some(phrase) => phrase.to_string(),
            // `under_N` is dynamic, not table-driven: the limit rides in the key.
            None => match key.strip_prefix("under_") {
                Some(limit) if !limit.is_empty() => {
                    format!("Keep it under {} characters.", limit)
                }
                _ => format!("Must be {}.", key),
            },
        });
    }
    for key in &node.priority {
        clauses.push(match aliases.expansion(crate::ast::Bucket::Priority, key) {
            Some(phrase) => phrase.to_string(),
            None => format!("Prioritize {}.", key),
        });
    }
    for key in &node.nice {
        clauses.push(match aliases.expansion(crate::ast::Bucket::Nice, key) {
            Some(phrase) => format!("If possible, {}", decapitalize(phrase)),
            None => format!("If possible, make it {}.", key),
        });
    }
    for key in &node.avoid {
        clauses.push(match aliases.expansion(crate::ast::Bucket::Avoid, key) {
            Some(phrase) => phrase.to_string(),
            None => format!("Do not {}.", key),
        });
    }

    let mut text = clauses.join(" ");

    if !node.iterate_over.is_empty() {
        text = format!("For each of: {}: {}", node.iterate_over.join(", "), text);
    }

    for sibling in &node.parallel {
        let sibling_text = node_text(sibling, aliases, templates, bindings)?;
        text = format!("{} Also, {}", text, decapitalize(&sibling_text));
    }

    if let Some(next) = node.then.as_deref() {
        let next_text = node_text(next, aliases, templates, bindings)?;
        text = format!("{} After that, {}", text, decapitalize(&next_text));
    }

    Ok(text)
}

fn base_sentence(action: &str, subject: &str, templates: &ActionTemplates) -> String {
    let mut sentence = match templates.get(action) {
        Some(template) => {
            if subject.is_empty() {
                template
                    .replace(" {subject}", "")
                    .replace("{subject}", "")
                    .trim_end_matches([' ', ':'])
                    .to_string()
            } else {
                template.replace("{subject}", subject)
            }
        }
        None if subject.is_empty() => format!("Do the following regarding {}", action),
        None => format!("Do the following regarding {}: {}", action, subject),
    };
    if !sentence.ends_with(['.', '!', '?']) {
        sentence.push('.');
    }
    sentence
}

fn specifier_clause(action: &str, spec: &str) -> String {
    match action {
        "code" | "convert" | "query" => format!("Use {}.", spec),
        "translate" => format!("Translate to {}.", spec),
        "img" => format!("Style: {}.", spec),
        _ if spec.chars().all(|c| c.is_ascii_digit()) && !spec.is_empty() => {
            format!("Provide {} items.", spec)
        }
        _ => format!("Format: {}.", spec),
    }
}

/// Substitute every `{name}` reference in a literal subject. Any reference
/// without a binding is a hard error; nothing is left unresolved in output.
fn substitute(text: &str, bindings: &Bindings) -> Result<String, TranspileError> {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] == '{' {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            if end > start && end < chars.len() && chars[end] == '}' {
                let name: String = chars[start..end].iter().collect();
                out.push_str(lookup(&name, bindings)?);
                i = end + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    Ok(out)
}

fn lookup<'a>(name: &str, bindings: &'a Bindings) -> Result<&'a str, TranspileError> {
    bindings
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| TranspileError::UnboundPlaceholder {
            name: name.to_string(),
        })
}

fn decapitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
