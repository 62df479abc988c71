//! Single-pass scanner splitting a step template into literal text and
//! `{label[:domain]}` slots.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::errors::{PatternError, placeholder_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Placeholder {
        start: usize,
        label: String,
        domain: Option<String>,
    },
    OpenBrace {
        index: usize,
    },
    CloseBrace {
        index: usize,
    },
}

const INVALID: &str = "invalid placeholder in step template";
const UNCLOSED: &str = "missing closing '}' for placeholder";

fn is_label_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

/// A domain is a single name or a `|` separated union of names.
fn is_valid_domain(raw: &str) -> bool {
    raw.split('|').all(|member| {
        !member.is_empty() && !member.contains(|ch: char| ch.is_ascii_whitespace() || ch == '{')
    })
}

struct Scanner<'a> {
    chars: Peekable<CharIndices<'a>>,
    tokens: Vec<Token>,
    text: String,
}

impl<'a> Scanner<'a> {
    fn new(template: &'a str) -> Self {
        Self {
            chars: template.char_indices().peekable(),
            tokens: Vec::new(),
            text: String::new(),
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, ch)| ch == expected).is_some()
    }

    fn starts_label(&mut self) -> bool {
        self.chars
            .peek()
            .is_some_and(|&(_, ch)| ch.is_ascii_alphabetic() || ch == '_')
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some((_, ch)) = self.chars.next_if(|&(_, ch)| keep(ch)) {
            taken.push(ch);
        }
        taken
    }

    fn push(&mut self, token: Token) {
        if !self.text.is_empty() {
            self.tokens.push(Token::Literal(std::mem::take(&mut self.text)));
        }
        self.tokens.push(token);
    }

    fn scan(mut self) -> Result<Vec<Token>, PatternError> {
        while let Some((index, ch)) = self.chars.next() {
            match ch {
                '\\' => {
                    let escaped = self.chars.next().map_or('\\', |(_, next)| next);
                    self.text.push(escaped);
                }
                '{' if self.eat('{') => self.text.push('{'),
                '}' if self.eat('}') => self.text.push('}'),
                '{' if self.starts_label() => {
                    let slot = self.placeholder(index)?;
                    self.push(slot);
                }
                '{' => self.push(Token::OpenBrace { index }),
                '}' => self.push(Token::CloseBrace { index }),
                other => self.text.push(other),
            }
        }
        if !self.text.is_empty() {
            self.tokens.push(Token::Literal(self.text));
        }
        Ok(self.tokens)
    }

    /// Reads the remainder of a slot whose opening brace sits at `start`.
    fn placeholder(&mut self, start: usize) -> Result<Token, PatternError> {
        let label = self.take_while(is_label_char);
        let domain = if self.eat(':') {
            let raw = self.take_while(|ch| ch != '}');
            if !is_valid_domain(&raw) {
                return Err(placeholder_error(INVALID, start, Some(label)));
            }
            Some(raw)
        } else {
            None
        };
        if self.eat('}') {
            return Ok(Token::Placeholder {
                start,
                label,
                domain,
            });
        }
        let message = if self.chars.peek().is_some() { INVALID } else { UNCLOSED };
        Err(placeholder_error(message, start, Some(label)))
    }
}

/// Split `template` into tokens, rejecting malformed `{label[:domain]}` slots.
pub(crate) fn lex_template(template: &str) -> Result<Vec<Token>, PatternError> {
    Scanner::new(template).scan()
}
