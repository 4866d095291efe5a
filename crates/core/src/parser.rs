//! Recursive-descent parser over the token stream.
//!
//! One left-to-right pass with a single token of lookahead, no backtracking.
//! Precedence: `&` binds tighter than `>` — parallel siblings are grouped
//! onto a node before the chain link is made.

use crate::ast::{Bucket, CommandNode, PersonaScope, Program, RawModifier, Subject};
use crate::error::{Error, ParseError};
use crate::lexer::{lex, Spanned, Token};

/// Parse a command string into a [`Program`].
///
/// Lex and parse errors abort immediately; no partial AST is returned.
pub fn parse(src: &str) -> Result<Program, Error> {
    let tokens = lex(src)?;
    let mut parser = Parser::new(&tokens);
    let program = parser.parse_program()?;
    Ok(program)
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, expected: impl Into<String>) -> ParseError {
        ParseError::new(self.cur().pos, expected, self.peek().describe())
    }

    fn take_word(&mut self, expected: &str) -> Result<String, ParseError> {
        if let Token::Word(w) = self.peek().clone() {
            self.advance();
            Ok(w)
        } else {
            Err(self.err(expected))
        }
    }

    fn take_str(&mut self, expected: &str) -> Result<String, ParseError> {
        if let Token::Str(s) = self.peek().clone() {
            self.advance();
            Ok(s)
        } else {
            Err(self.err(expected))
        }
    }

    // ── Grammar ──────────────────────────────────────────────

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let program = if self.peek() == &Token::As {
            Program::Persona {
                scope: self.parse_persona_block()?,
            }
        } else {
            Program::Plain {
                command: self.parse_sequence()?,
            }
        };
        if self.peek() != &Token::Eof {
            return Err(self.err("end of input"));
        }
        Ok(program)
    }

    fn parse_persona_block(&mut self) -> Result<PersonaScope, ParseError> {
        self.advance(); // @as
        let persona = self.take_str("persona string after '@as'")?;
        if self.peek() != &Token::LBrace {
            return Err(self.err("'{' opening the persona block"));
        }
        self.advance();
        let mut commands = Vec::new();
        while self.peek() != &Token::RBrace {
            if self.peek() == &Token::Eof {
                return Err(self.err("'}' closing the persona block"));
            }
            commands.push(self.parse_sequence()?);
        }
        self.advance(); // }
        Ok(PersonaScope { persona, commands })
    }

    /// `command ( '>' command )*` — chain links are right-owned: the first
    /// node owns its successor through `then`.
    fn parse_sequence(&mut self) -> Result<CommandNode, ParseError> {
        let mut nodes = vec![self.parse_group()?];
        while self.peek() == &Token::Chain {
            self.advance();
            nodes.push(self.parse_group()?);
        }
        let mut iter = nodes.into_iter().rev();
        let mut acc = iter.next().unwrap_or_default();
        for mut node in iter {
            node.then = Some(Box::new(acc));
            acc = node;
        }
        Ok(acc)
    }

    /// `command ( '&' command )*` at one chain position. Siblings attach to
    /// the first command's `parallel` list.
    fn parse_group(&mut self) -> Result<CommandNode, ParseError> {
        let mut first = self.parse_command()?;
        while self.peek() == &Token::Amp {
            self.advance();
            first.parallel.push(self.parse_command()?);
        }
        Ok(first)
    }

    /// `action subject? specifier* modifier* ( '*' '[' literals ']' )?`
    fn parse_command(&mut self) -> Result<CommandNode, ParseError> {
        let action = self.take_word("action identifier")?;
        let mut node = CommandNode::new(action);

        match self.peek().clone() {
            Token::Str(s) => {
                self.advance();
                node.subject = Some(Subject::Literal(s));
            }
            Token::Placeholder(name) => {
                self.advance();
                node.subject = Some(Subject::Placeholder(name));
            }
            _ => {}
        }

        while let Token::Group(content) = self.peek().clone() {
            self.advance();
            node.specifiers.push(content);
        }

        loop {
            let bucket = match self.peek() {
                Token::Bang => Bucket::Must,
                Token::Tilde => Bucket::Nice,
                Token::Caret => Bucket::Priority,
                Token::Under => Bucket::Avoid,
                _ => break,
            };
            self.advance();
            let key = self.take_word("modifier name after sigil")?;
            node.modifiers.push(RawModifier { bucket, key });
        }

        if self.peek() == &Token::Star {
            self.advance();
            let content = if let Token::Group(c) = self.peek().clone() {
                self.advance();
                c
            } else {
                return Err(self.err("'[' literal list after '*'"));
            };
            let values: Vec<String> = content
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                return Err(ParseError::new(
                    self.cur().pos,
                    "at least one literal in the iteration list",
                    "empty list".to_string(),
                ));
            }
            node.iterate_over = values;
        }

        Ok(node)
    }
}
