//! incant-core: command language core.
//!
//! Turns a terse command string (action, subject, specifiers, modifier
//! sigils, `>` chains, `&` parallel branches, `@as` persona blocks) into a
//! natural-language prompt, and validates structured provider replies
//! against declared output contracts.
//!
//! # Pipeline
//!
//! command string → [`lexer::lex`] → [`parser::parse`] → AST →
//! [`resolve::resolve`] (modifier buckets) → [`transpile::transpile`] →
//! prompt text → \[host sends to a provider\] → [`contract::validate`] →
//! typed result or aggregated failure.
//!
//! Every stage is a pure function over immutable inputs; the only shared
//! state is the read-only [`AliasTable`]/[`ActionTemplates`] configuration,
//! loaded once and passed by reference. Network, retries, and provider
//! choice are the host's concern.

pub mod ast;
pub mod contract;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod reverse;
pub mod transpile;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Bucket, CommandNode, PersonaScope, Program, RawModifier, Subject};
pub use contract::{
    validate, ContractResult, ContractSchema, FieldFailure, FieldType, FieldValue, Reason,
    SchemaField, ValidationError,
};
pub use error::{Error, LexError, LoadError, ParseError, SemanticWarning, TranspileError};
pub use resolve::{resolve, AliasTable};
pub use reverse::to_command;
pub use transpile::{transpile, ActionTemplates, Bindings};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use parser::parse;

/// Parse, resolve, and transpile a command string in one step, using the
/// built-in alias and template tables. Returns the prompt text and any
/// semantic warnings recorded during resolution.
pub fn render(src: &str, bindings: &Bindings) -> Result<(String, Vec<SemanticWarning>), Error> {
    let mut program = parse(src)?;
    let aliases = AliasTable::builtin();
    let warnings = resolve(&mut program, &aliases);
    let prompt = transpile(&program, &aliases, &ActionTemplates::builtin(), bindings)?;
    Ok((prompt, warnings))
}
