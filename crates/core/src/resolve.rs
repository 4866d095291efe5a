//! Modifier resolution: shorthand aliases to canonical keys, canonical keys
//! into their buckets, conflict handling.
//!
//! The alias table is read-only configuration. The host loads it once (or
//! takes the built-in defaults) and passes it by reference; nothing here
//! mutates it, so unsynchronized concurrent reads are safe.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::{Bucket, CommandNode, Program};
use crate::error::{LoadError, SemanticWarning};

/// Canonical modifier vocabulary: per-bucket expansion clauses plus a
/// shorthand alias map. Unknown keys are permitted everywhere — the
/// transpiler falls back to a generic clause, so the vocabulary stays open
/// without code changes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AliasTable {
    /// shorthand -> canonical key
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// canonical key -> clause for `!` modifiers
    #[serde(default)]
    pub must: BTreeMap<String, String>,
    /// canonical key -> clause for `~` modifiers
    #[serde(default)]
    pub nice: BTreeMap<String, String>,
    /// canonical key -> clause for `^` modifiers
    #[serde(default)]
    pub priority: BTreeMap<String, String>,
    /// canonical key -> clause for `_` modifiers
    #[serde(default)]
    pub avoid: BTreeMap<String, String>,
}

impl AliasTable {
    /// Load a table from JSON. This is the `alias_table_load` boundary
    /// operation; reading the source (file, embedded string) is the host's
    /// concern.
    pub fn from_json(src: &str) -> Result<AliasTable, LoadError> {
        serde_json::from_str(src).map_err(|e| LoadError::new(format!("alias table: {}", e)))
    }

    /// Map a stated key through the alias table to its canonical form.
    pub fn canonical<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Expansion clause for a canonical key in a bucket, if the vocabulary
    /// has one. `~` keys without a dedicated entry borrow the `!` clause —
    /// the transpiler softens it with an "If possible" lead-in.
    pub fn expansion(&self, bucket: Bucket, key: &str) -> Option<&str> {
        let table = match bucket {
            Bucket::Must => &self.must,
            Bucket::Nice => &self.nice,
            Bucket::Priority => &self.priority,
            Bucket::Avoid => &self.avoid,
        };
        let direct = table.get(key).map(String::as_str);
        if direct.is_none() && bucket == Bucket::Nice {
            return self.must.get(key).map(String::as_str);
        }
        direct
    }

    /// Built-in vocabulary.
    pub fn builtin() -> AliasTable {
        fn to_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        AliasTable {
            aliases: to_map(&[
                ("perf", "performance"),
                ("pro", "professional"),
                ("tech", "technical"),
                ("docs", "documented"),
            ]),
            must: to_map(&[
                ("short", "Keep it concise and brief."),
                ("brief", "Keep it brief."),
                ("concise", "Be concise."),
                ("detailed", "Include thorough details."),
                ("long", "Make it comprehensive and detailed."),
                ("simple", "Use simple, easy-to-understand language."),
                ("technical", "Use technical terminology."),
                ("formal", "Use a formal tone."),
                ("casual", "Use a casual, conversational tone."),
                ("professional", "Maintain a professional tone."),
                ("friendly", "Use a friendly, approachable tone."),
                ("examples", "Include examples."),
                ("typed", "Include type annotations."),
                ("tested", "Include unit tests."),
                ("commented", "Include code comments."),
                ("documented", "Include documentation."),
                ("explained", "Explain your reasoning."),
                ("photo", "Make it photorealistic."),
                ("art", "Make it artistic/illustrated."),
                ("minimal", "Use a minimalist style."),
                ("honest", "Be honest and direct."),
                ("creative", "Be creative and original."),
                ("accurate", "Ensure accuracy."),
                ("structured", "Use a clear structure with sections."),
                ("bullets", "Format as bullet points."),
                ("numbered", "Format as a numbered list."),
                ("bare", "Return only the result, no explanations."),
            ]),
            nice: BTreeMap::new(),
            priority: to_map(&[
                ("speed", "Optimize for speed/performance."),
                ("fast", "Optimize for speed."),
                ("performance", "Prioritize performance."),
                ("quality", "Prioritize quality over speed."),
                ("readable", "Prioritize readability."),
                ("clarity", "Prioritize clarity."),
                ("security", "Focus on security."),
                ("memory", "Optimize for memory efficiency."),
                ("creative", "Prioritize creativity."),
                ("accuracy", "Prioritize accuracy."),
                ("seo", "Optimize for SEO."),
                ("engagement", "Optimize for engagement."),
                ("conversion", "Optimize for conversion."),
                ("cinematic", "Use cinematic composition and lighting."),
                ("detailed", "Include rich details."),
                ("vibrant", "Use vibrant colors."),
            ]),
            avoid: to_map(&[
                ("verbose", "Avoid being verbose."),
                ("technical", "Avoid technical jargon."),
                ("jargon", "Avoid jargon."),
                ("emoji", "Do not use emojis."),
                ("text", "Do not include text in the image."),
                ("generic", "Avoid generic or cliché approaches."),
                ("boring", "Don't be boring."),
                ("repetitive", "Avoid repetition."),
                ("complex", "Avoid unnecessary complexity."),
                ("deps", "Avoid external dependencies."),
                ("offensive", "Avoid offensive content."),
            ]),
        }
    }
}

/// Classify every stated modifier on every node into its bucket.
///
/// Identical (bucket, key) pairs are deduplicated. A key landing in two
/// different buckets on one command is a semantic conflict: the most
/// recently stated bucket wins and a [`SemanticWarning`] is recorded on the
/// node. Returns all warnings across the tree, in encounter order.
pub fn resolve(program: &mut Program, table: &AliasTable) -> Vec<SemanticWarning> {
    let mut warnings = Vec::new();
    for command in program.commands_mut() {
        resolve_node(command, table, &mut warnings);
    }
    warnings
}

fn resolve_node(node: &mut CommandNode, table: &AliasTable, warnings: &mut Vec<SemanticWarning>) {
    for modifier in std::mem::take(&mut node.modifiers) {
        let key = table.canonical(&modifier.key).to_string();

        if bucket_keys(node, modifier.bucket).contains(&key) {
            continue; // restated in the same bucket: dedupe
        }

        let conflicting = [Bucket::Must, Bucket::Nice, Bucket::Priority, Bucket::Avoid]
            .into_iter()
            .find(|b| *b != modifier.bucket && bucket_keys(node, *b).contains(&key));
        if let Some(dropped) = conflicting {
            bucket_keys_mut(node, dropped).retain(|k| k != &key);
            let warning = SemanticWarning::BucketConflict {
                key: key.clone(),
                kept: modifier.bucket,
                dropped,
            };
            node.warnings.push(warning.clone());
            warnings.push(warning);
        }

        bucket_keys_mut(node, modifier.bucket).push(key);
    }

    for sibling in &mut node.parallel {
        resolve_node(sibling, table, warnings);
    }
    if let Some(next) = node.then.as_deref_mut() {
        resolve_node(next, table, warnings);
    }
}

fn bucket_keys(node: &CommandNode, bucket: Bucket) -> &[String] {
    match bucket {
        Bucket::Must => &node.must,
        Bucket::Nice => &node.nice,
        Bucket::Priority => &node.priority,
        Bucket::Avoid => &node.avoid,
    }
}

fn bucket_keys_mut(node: &mut CommandNode, bucket: Bucket) -> &mut Vec<String> {
    match bucket {
        Bucket::Must => &mut node.must,
        Bucket::Nice => &mut node.nice,
        Bucket::Priority => &mut node.priority,
        Bucket::Avoid => &mut node.avoid,
    }
}
