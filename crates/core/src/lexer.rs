use crate::error::LexError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identifier: action name or modifier key
    Word(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    /// `{name}` placeholder reference
    Placeholder(String),
    /// `[ ... ]` bracket group — content captured verbatim, not tokenized
    Group(String),
    // Modifier sigils
    Bang,  // !
    Tilde, // ~
    Caret, // ^
    Under, // _
    // Structure operators
    Chain, // >
    Amp,   // &
    Star,  // *
    /// `@as` persona marker
    As,
    /// Persona block braces — the body IS tokenized, unlike bracket groups
    LBrace,
    RBrace,
    // End of input
    Eof,
}

impl Token {
    /// Short description for parse error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("identifier '{}'", w),
            Token::Str(_) => "string literal".to_string(),
            Token::Placeholder(n) => format!("placeholder '{{{}}}'", n),
            Token::Group(_) => "bracket group".to_string(),
            Token::Bang => "'!'".to_string(),
            Token::Tilde => "'~'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::Under => "'_'".to_string(),
            Token::Chain => "'>'".to_string(),
            Token::Amp => "'&'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::As => "'@as'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    /// Character offset of the token's first character.
    pub pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize a command string.
///
/// Whitespace separates tokens and is otherwise insignificant. A `{` opens a
/// persona block only when it directly follows `@as "..."`; elsewhere it
/// must form a `{name}` placeholder.
pub fn lex(src: &str) -> Result<Vec<Spanned>, LexError> {
    let mut tokens: Vec<Spanned> = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut block_depth = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let tok_pos = pos;

        // String literal
        if c == '"' {
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(LexError::new(tok_pos, "unterminated string literal"));
                }
                let sc = chars[pos];
                if sc == '"' {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(LexError::new(tok_pos, "unterminated escape in string"));
                    }
                    match chars[pos] {
                        '"' => s.push('"'),
                        '\\' => s.push('\\'),
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => {
                            s.push('\\');
                            s.push(other);
                        }
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                pos: tok_pos,
            });
            continue;
        }

        // Bracket group — verbatim capture up to the closing ']'
        if c == '[' {
            pos += 1;
            let start = pos;
            while pos < chars.len() && chars[pos] != ']' {
                pos += 1;
            }
            if pos >= chars.len() {
                return Err(LexError::new(tok_pos, "unterminated bracket group"));
            }
            let content: String = chars[start..pos].iter().collect();
            pos += 1; // consume ']'
            tokens.push(Spanned {
                token: Token::Group(content.trim().to_string()),
                pos: tok_pos,
            });
            continue;
        }

        // Brace: persona block open after `@as "..."`, placeholder otherwise
        if c == '{' {
            let after_persona_header = tokens.len() >= 2
                && matches!(tokens[tokens.len() - 1].token, Token::Str(_))
                && tokens[tokens.len() - 2].token == Token::As;
            if after_persona_header {
                block_depth += 1;
                tokens.push(Spanned {
                    token: Token::LBrace,
                    pos: tok_pos,
                });
                pos += 1;
                continue;
            }
            pos += 1;
            let start = pos;
            while pos < chars.len() && is_ident_char(chars[pos]) {
                pos += 1;
            }
            if pos >= chars.len() {
                return Err(LexError::new(tok_pos, "unterminated placeholder"));
            }
            if chars[pos] != '}' || pos == start {
                return Err(LexError::new(
                    tok_pos,
                    "expected placeholder of the form {name}",
                ));
            }
            let name: String = chars[start..pos].iter().collect();
            pos += 1; // consume '}'
            tokens.push(Spanned {
                token: Token::Placeholder(name),
                pos: tok_pos,
            });
            continue;
        }

        if c == '}' {
            if block_depth == 0 {
                return Err(LexError::new(tok_pos, "'}' outside a persona block"));
            }
            block_depth -= 1;
            tokens.push(Spanned {
                token: Token::RBrace,
                pos: tok_pos,
            });
            pos += 1;
            continue;
        }

        // Persona marker
        if c == '@' {
            pos += 1;
            let start = pos;
            while pos < chars.len() && is_ident_char(chars[pos]) {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            if word != "as" {
                return Err(LexError::new(
                    tok_pos,
                    format!("unknown marker '@{}'", word),
                ));
            }
            tokens.push(Spanned {
                token: Token::As,
                pos: tok_pos,
            });
            continue;
        }

        // Operators
        let op = match c {
            '!' => Some(Token::Bang),
            '~' => Some(Token::Tilde),
            '^' => Some(Token::Caret),
            '_' => Some(Token::Under),
            '>' => Some(Token::Chain),
            '&' => Some(Token::Amp),
            '*' => Some(Token::Star),
            _ => None,
        };
        if let Some(token) = op {
            tokens.push(Spanned {
                token,
                pos: tok_pos,
            });
            pos += 1;
            continue;
        }

        // Identifier
        if is_ident_start(c) {
            let start = pos;
            while pos < chars.len() && is_ident_char(chars[pos]) {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Word(word),
                pos: tok_pos,
            });
            continue;
        }

        return Err(LexError::new(
            tok_pos,
            format!("unexpected character '{}'", c),
        ));
    }

    if block_depth > 0 {
        return Err(LexError::new(chars.len(), "unterminated persona block"));
    }

    tokens.push(Spanned {
        token: Token::Eof,
        pos: chars.len(),
    });
    Ok(tokens)
}
