//! Interactive line sources.
//!
//! Everything that needs another line of input — the parser chasing an
//! unterminated list, a here-document collecting its body — goes through
//! [`Catline`]: present a prompt, get back one line without its
//! terminator, or `None` at end of input. The interactive implementation
//! wraps a rustyline editor; scripts and tests use plain readers.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::{Arc, Mutex};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// A prompting line source.
pub trait Catline: Send {
    /// Show `prompt` (if the source is interactive) and read one line.
    /// Returns `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Shared handle to the dispatcher's current line source. Here-document
/// writers run on background threads, so the source sits behind a mutex.
pub type CatlineRef = Arc<Mutex<dyn Catline>>;

/// Wrap a line source into a shareable handle.
pub fn catline(source: impl Catline + 'static) -> CatlineRef {
    Arc::new(Mutex::new(source))
}

/// A source that is always at end of input.
pub struct Null;

impl Catline for Null {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Ok(None)
    }
}

/// Interactive editing and history via rustyline.
pub struct Liner {
    editor: DefaultEditor,
}

impl Liner {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Liner {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Catline for Liner {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(io::Error::other(err)),
        }
    }
}

/// Lines pulled from any buffered reader; the prompt is ignored. Used for
/// script files and `-no-liner` sessions.
pub struct Reader<R: BufRead + Send> {
    inner: R,
}

impl<R: BufRead + Send> Reader<R> {
    pub fn new(inner: R) -> Self {
        Reader { inner }
    }
}

impl<R: BufRead + Send> Catline for Reader<R> {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.inner.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// A canned sequence of lines, for tests and function bodies.
#[derive(Default)]
pub struct Lines {
    queue: VecDeque<String>,
    /// Prompts seen so far, in order. Lets tests assert on continuation
    /// behavior.
    pub prompts: Vec<String>,
}

impl Lines {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Lines {
            queue: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }
}

impl Catline for Lines {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.queue.pop_front())
    }
}
