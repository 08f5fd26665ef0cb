//! From tokens to command lists.
//!
//! A [`List`] is everything typed on one logical input line: a sequence of
//! [`Cmdline`]s, each ending in a terminator. The evaluator walks the list
//! from the front, carving off pipelines (`|` runs) and boolean chains
//! (`&&`/`||`) as it goes. Parsing itself stays structural; variable
//! expansion and redirection interpretation happen when a command runs.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use anyhow::anyhow;

use crate::catline::CatlineRef;
use crate::lexer::{self, LexError, Token, Word};

/// The token after a command: nothing, `;`, `|`, `&&`, or `||`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Empty,
    Semi,
    Pipe,
    AndIf,
    OrIf,
}

impl Term {
    pub fn as_str(self) -> &'static str {
        match self {
            Term::Empty => "",
            Term::Semi => ";",
            Term::Pipe => "|",
            Term::AndIf => "&&",
            Term::OrIf => "||",
        }
    }

    /// True when the terminator promises more input: a list may not end
    /// with it.
    pub fn is_continuation(self) -> bool {
        matches!(self, Term::Pipe | Term::AndIf | Term::OrIf)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One command with its arguments and a single trailing terminator.
#[derive(Debug, Clone)]
pub struct Cmdline {
    pub words: Vec<Word>,
    pub term: Term,
}

impl Cmdline {
    /// The unexpanded spelling of the first word, used for registry
    /// probes before the command actually runs.
    pub fn name(&self) -> Option<String> {
        self.words.first().map(|w| w.to_string())
    }

    /// Split into an environment overlay and an argv.
    ///
    /// `NAME=VALUE` words before the first non-assignment word become the
    /// overlay; the rest is the argv. Both sides expand variable
    /// references through `lookup`.
    pub fn slice(
        &self,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> (HashMap<String, String>, Vec<String>) {
        let mut env = HashMap::new();
        let mut argv = Vec::new();
        for word in &self.words {
            let s = word.expand(lookup);
            if argv.is_empty() {
                if let Some((name, value)) = split_assignment(&s) {
                    env.insert(name.to_string(), value.to_string());
                    continue;
                }
            }
            argv.push(s);
        }
        (env, argv)
    }
}

fn split_assignment(s: &str) -> Option<(&str, &str)> {
    let eq = s.find('=')?;
    let name = &s[..eq];
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, &s[eq + 1..]))
}

impl fmt::Display for Cmdline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{word}")?;
        }
        if self.term != Term::Empty {
            write!(f, " {}", self.term)?;
        }
        Ok(())
    }
}

/// A sequence of cmdlines produced from one logical input line.
#[derive(Debug, Clone, Default)]
pub struct List {
    pub cmds: VecDeque<Cmdline>,
}

impl List {
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cl) in self.cmds.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{cl}")?;
        }
        Ok(())
    }
}

/// Structural errors in an otherwise lexable line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("missing command before `{0}`")]
    MissingCommand(&'static str),
}

/// Read one logical line from `catline` and parse it.
///
/// `prompt` is shown for the first read; unterminated quotes and trailing
/// backslashes pull continuation lines with a bare `> ` prompt. Returns
/// `Ok(None)` at end of input.
pub fn parse(prompt: &str, catline: &CatlineRef) -> anyhow::Result<Option<List>> {
    let mut source = catline.lock().unwrap();
    let Some(mut buffer) = source.read_line(prompt)? else {
        return Ok(None);
    };
    loop {
        match lexer::scan(&buffer) {
            Ok(tokens) => return Ok(Some(build(tokens)?)),
            Err(LexError::TrailingBackslash) => {
                buffer.pop();
                let more = source
                    .read_line("> ")?
                    .ok_or_else(|| anyhow!("unexpected end of input"))?;
                buffer.push_str(&more);
            }
            Err(LexError::UnfinishedQuote) => {
                let more = source
                    .read_line("> ")?
                    .ok_or_else(|| anyhow!("unexpected end of input"))?;
                buffer.push('\n');
                buffer.push_str(&more);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Group a token stream into cmdlines.
pub fn build(tokens: Vec<Token>) -> Result<List, ParseError> {
    let mut list = List::default();
    let mut words: Vec<Word> = Vec::new();
    for token in tokens {
        let term = match token {
            Token::Word(w) => {
                words.push(w);
                continue;
            }
            Token::Semi => Term::Semi,
            Token::Pipe => Term::Pipe,
            Token::AndIf => Term::AndIf,
            Token::OrIf => Term::OrIf,
        };
        if words.is_empty() {
            return Err(ParseError::MissingCommand(term.as_str()));
        }
        list.cmds.push_back(Cmdline {
            words: std::mem::take(&mut words),
            term,
        });
    }
    if !words.is_empty() {
        list.cmds.push_back(Cmdline {
            words,
            term: Term::Empty,
        });
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catline::{catline, Lines};

    fn parse_str(s: &str) -> List {
        build(lexer::scan(s).unwrap()).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn terminators_split_the_list() {
        let ls = parse_str("a | b && c || d ; e");
        let terms: Vec<Term> = ls.cmds.iter().map(|c| c.term).collect();
        assert_eq!(
            terms,
            vec![Term::Pipe, Term::AndIf, Term::OrIf, Term::Semi, Term::Empty]
        );
        let names: Vec<String> = ls.cmds.iter().filter_map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn missing_command_is_an_error() {
        let err = build(lexer::scan("| foo").unwrap()).unwrap_err();
        assert_eq!(err, ParseError::MissingCommand("|"));
    }

    #[test]
    fn slice_splits_assignments() {
        let ls = parse_str("FOO=1 BAR=two cmd arg FOO=late");
        let (env, argv) = ls.cmds[0].slice(&no_env);
        assert_eq!(env.get("FOO").map(String::as_str), Some("1"));
        assert_eq!(env.get("BAR").map(String::as_str), Some("two"));
        // assignments after the command name are plain arguments
        assert_eq!(argv, vec!["cmd", "arg", "FOO=late"]);
    }

    #[test]
    fn slice_expands_variables() {
        let ls = parse_str("echo $GREETING ${GREETING}!");
        let lookup = |k: &str| (k == "GREETING").then(|| "hi".to_string());
        let (_, argv) = ls.cmds[0].slice(&lookup);
        assert_eq!(argv, vec!["echo", "hi", "hi!"]);
    }

    #[test]
    fn bare_assignment_has_empty_argv() {
        let ls = parse_str("K=V");
        let (env, argv) = ls.cmds[0].slice(&no_env);
        assert!(argv.is_empty());
        assert_eq!(env.get("K").map(String::as_str), Some("V"));
    }

    #[test]
    fn invalid_assignment_names_are_arguments() {
        let ls = parse_str("1x=3 cmd");
        let (env, argv) = ls.cmds[0].slice(&no_env);
        assert!(env.is_empty());
        assert_eq!(argv, vec!["1x=3", "cmd"]);
    }

    #[test]
    fn parse_pulls_continuation_lines_for_quotes() {
        let src = catline(Lines::new(["echo 'two", "lines'"]));
        let ls = parse("$ ", &src).unwrap().unwrap();
        let (_, argv) = ls.cmds[0].slice(&no_env);
        assert_eq!(argv, vec!["echo", "two\nlines"]);
    }

    #[test]
    fn parse_joins_backslash_continuations() {
        let src = catline(Lines::new(["echo one \\", "two"]));
        let ls = parse("$ ", &src).unwrap().unwrap();
        let (_, argv) = ls.cmds[0].slice(&no_env);
        assert_eq!(argv, vec!["echo", "one", "two"]);
    }

    #[test]
    fn parse_reports_end_of_input() {
        let src = catline(Lines::new(Vec::<String>::new()));
        assert!(parse("$ ", &src).unwrap().is_none());
    }

    #[test]
    fn display_round_trips_structure() {
        let ls = parse_str("a -x | b && c");
        assert_eq!(ls.to_string(), "a -x | b && c");
    }
}
