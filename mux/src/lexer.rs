//! Lexical analysis for the command language.
//!
//! A line breaks into words and the four operators `|`, `&&`, `||`, `;`.
//! Words carry their variable references (`$NAME`, `${NAME}`) unexpanded;
//! expansion happens later against the dispatcher's environment. Quoting
//! follows the usual rules: single quotes are literal, double quotes keep
//! `$` alive, backslash escapes the next character. Redirection markers
//! (`<`, `>`, `>>`, ...) are ordinary word characters here; they are
//! interpreted only when a command is about to run.

use std::fmt;

/// A part of a word: literal text or an unexpanded variable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    Literal(String),
    Var(String),
}

/// One shell word, a sequence of parts concatenated on expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word(pub Vec<WordPart>);

impl Word {
    /// Expand the word against `lookup`; unknown variables expand empty.
    pub fn expand(&self, lookup: &dyn Fn(&str) -> Option<String>) -> String {
        let mut out = String::new();
        for part in &self.0 {
            match part {
                WordPart::Literal(s) => out.push_str(s),
                WordPart::Var(name) => {
                    if let Some(v) = lookup(name) {
                        out.push_str(&v);
                    }
                }
            }
        }
        out
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.0 {
            match part {
                WordPart::Literal(s) => write!(f, "{s}")?,
                WordPart::Var(name) => write!(f, "${name}")?,
            }
        }
        Ok(())
    }
}

/// A token produced by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(Word),
    Pipe,
    AndIf,
    OrIf,
    Semi,
}

/// Errors from lexical analysis.
///
/// `UnfinishedQuote` and `TrailingBackslash` double as continuation
/// signals: the parser reads another line and scans again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated quote")]
    UnfinishedQuote,
    #[error("unterminated `${{`")]
    UnfinishedParam,
    #[error("line continuation")]
    TrailingBackslash,
    #[error("unexpected `&`")]
    LoneAmp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InWord,
    SingleQuote,
    DoubleQuote,
}

struct Scanner {
    input: Vec<char>,
    pos: usize,
    state: State,
    parts: Vec<WordPart>,
    buffer: String,
    quoted: bool,
}

impl Scanner {
    fn new(line: &str) -> Self {
        Scanner {
            input: line.chars().collect(),
            pos: 0,
            state: State::Start,
            parts: Vec::new(),
            buffer: String::new(),
            quoted: false,
        }
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn flush_literal(&mut self) {
        if !self.buffer.is_empty() {
            self.parts
                .push(WordPart::Literal(std::mem::take(&mut self.buffer)));
        }
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        self.flush_literal();
        if self.parts.is_empty() && self.quoted {
            // `""` is a real, empty argument
            self.parts.push(WordPart::Literal(String::new()));
        }
        if !self.parts.is_empty() {
            out.push(Token::Word(Word(std::mem::take(&mut self.parts))));
        }
        self.quoted = false;
        self.state = State::Start;
    }

    /// Read a `$NAME` or `${NAME}` reference; a lone `$` stays literal.
    fn read_var(&mut self) -> Result<(), LexError> {
        if self.peek() == Some('{') {
            self.pos += 1;
            let mut name = String::new();
            loop {
                match self.next_char() {
                    Some('}') => break,
                    Some(c) => name.push(c),
                    None => return Err(LexError::UnfinishedParam),
                }
            }
            self.flush_literal();
            self.parts.push(WordPart::Var(name));
            return Ok(());
        }
        let mut name = String::new();
        while let Some(c) = self.peek() {
            let ok = if name.is_empty() {
                c.is_ascii_alphabetic() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            };
            if !ok {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        if name.is_empty() {
            self.buffer.push('$');
        } else {
            self.flush_literal();
            self.parts.push(WordPart::Var(name));
        }
        Ok(())
    }

    fn scan(mut self) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::new();
        while let Some(ch) = self.next_char() {
            match self.state {
                State::Start | State::InWord => match ch {
                    c if c.is_whitespace() => self.finish_word(&mut out),
                    '#' if self.state == State::Start => break,
                    '|' => {
                        self.finish_word(&mut out);
                        if self.peek() == Some('|') {
                            self.pos += 1;
                            out.push(Token::OrIf);
                        } else {
                            out.push(Token::Pipe);
                        }
                    }
                    '&' => {
                        if self.peek() != Some('&') {
                            return Err(LexError::LoneAmp);
                        }
                        self.pos += 1;
                        self.finish_word(&mut out);
                        out.push(Token::AndIf);
                    }
                    ';' => {
                        self.finish_word(&mut out);
                        out.push(Token::Semi);
                    }
                    '\'' => {
                        self.quoted = true;
                        self.state = State::SingleQuote;
                    }
                    '"' => {
                        self.quoted = true;
                        self.state = State::DoubleQuote;
                    }
                    '\\' => match self.next_char() {
                        Some(c) => {
                            self.buffer.push(c);
                            self.state = State::InWord;
                        }
                        None => return Err(LexError::TrailingBackslash),
                    },
                    '$' => {
                        self.read_var()?;
                        self.state = State::InWord;
                    }
                    c => {
                        self.buffer.push(c);
                        self.state = State::InWord;
                    }
                },
                State::SingleQuote => match ch {
                    '\'' => self.state = State::InWord,
                    c => self.buffer.push(c),
                },
                State::DoubleQuote => match ch {
                    '"' => self.state = State::InWord,
                    '$' => self.read_var()?,
                    '\\' => match self.next_char() {
                        Some(c @ ('"' | '$' | '\\')) => self.buffer.push(c),
                        Some(c) => {
                            self.buffer.push('\\');
                            self.buffer.push(c);
                        }
                        None => return Err(LexError::UnfinishedQuote),
                    },
                    c => self.buffer.push(c),
                },
            }
        }

        match self.state {
            State::SingleQuote | State::DoubleQuote => Err(LexError::UnfinishedQuote),
            _ => {
                self.finish_word(&mut out);
                Ok(out)
            }
        }
    }
}

/// Tokenize one (possibly multi-) line of input.
pub fn scan(line: &str) -> Result<Vec<Token>, LexError> {
    Scanner::new(line).scan()
}
