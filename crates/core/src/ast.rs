//! AST produced by the parser.
//!
//! One concrete node shape (`CommandNode`) covers every action; per-action
//! behavior lives in the transpiler's template table, not in the tree. Nodes
//! own their chain successor and parallel siblings exclusively, and the
//! grammar only links forward, so the tree is acyclic by construction.

use serde::{Deserialize, Serialize};

use crate::error::SemanticWarning;

/// Modifier bucket, selected by the sigil in the surface syntax:
/// `!` must, `~` nice-to-have, `^` priority, `_` avoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Must,
    Nice,
    Priority,
    Avoid,
}

impl Bucket {
    pub fn sigil(&self) -> char {
        match self {
            Bucket::Must => '!',
            Bucket::Nice => '~',
            Bucket::Priority => '^',
            Bucket::Avoid => '_',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Must => "must",
            Bucket::Nice => "nice-to-have",
            Bucket::Priority => "priority",
            Bucket::Avoid => "avoid",
        }
    }
}

/// What a command operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Subject {
    /// Quoted string. May itself contain `{name}` references, substituted at
    /// transpile time.
    Literal(String),
    /// Bare `{name}` reference, resolved entirely from bindings.
    Placeholder(String),
}

/// A modifier as stated in the source, before alias expansion. Source order
/// is preserved so the resolver can apply last-write-wins on conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawModifier {
    pub bucket: Bucket,
    pub key: String,
}

/// One action invocation.
///
/// `must`/`nice`/`priority`/`avoid` hold canonical modifier keys in
/// insertion order; they are empty until [`crate::resolve::resolve`] runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommandNode {
    pub action: String,
    pub subject: Option<Subject>,
    /// Bracket-group contents, left-to-right. Order is significant.
    pub specifiers: Vec<String>,
    /// Modifiers as stated, consumed by the resolver.
    pub modifiers: Vec<RawModifier>,
    pub must: Vec<String>,
    pub nice: Vec<String>,
    pub priority: Vec<String>,
    pub avoid: Vec<String>,
    /// Literal values from a trailing `*[a, b, c]`. The command is described
    /// once per value at transpile time.
    pub iterate_over: Vec<String>,
    /// `&` siblings at the same chain position.
    pub parallel: Vec<CommandNode>,
    /// `>` successor.
    pub then: Option<Box<CommandNode>>,
    /// Non-fatal findings from resolution.
    pub warnings: Vec<SemanticWarning>,
}

impl CommandNode {
    pub fn new(action: impl Into<String>) -> Self {
        CommandNode {
            action: action.into(),
            ..CommandNode::default()
        }
    }

    /// Length of the `then` chain starting at this node, counting this node.
    pub fn chain_len(&self) -> usize {
        1 + self.then.as_deref().map_or(0, CommandNode::chain_len)
    }
}

/// A `@as "persona" { ... }` block: one or more command sequences described
/// under a persona. Exists only as structural nesting; transpilation stays a
/// pure tree walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaScope {
    pub persona: String,
    pub commands: Vec<CommandNode>,
}

/// A fully parsed command string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Program {
    Plain { command: CommandNode },
    Persona { scope: PersonaScope },
}

impl Program {
    /// Top-level command roots, persona or not.
    pub fn commands(&self) -> &[CommandNode] {
        match self {
            Program::Plain { command } => std::slice::from_ref(command),
            Program::Persona { scope } => &scope.commands,
        }
    }

    pub fn commands_mut(&mut self) -> &mut [CommandNode] {
        match self {
            Program::Plain { command } => std::slice::from_mut(command),
            Program::Persona { scope } => &mut scope.commands,
        }
    }

    pub fn persona(&self) -> Option<&str> {
        match self {
            Program::Plain { .. } => None,
            Program::Persona { scope } => Some(&scope.persona),
        }
    }
}
