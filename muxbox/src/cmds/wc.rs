use std::io::{Read, Write};

use anyhow::Result;
use argh::FromArgs;
use mux::{Command, Io, Mux};

use super::parse;

#[derive(FromArgs)]
/// count lines, words and bytes
struct Args {
    #[argh(positional, greedy)]
    /// files to count; standard input when none are given.
    files: Vec<String>,
}

fn counts(text: &str) -> (usize, usize, usize) {
    (
        text.lines().count(),
        text.split_whitespace().count(),
        text.len(),
    )
}

pub struct Wc;

impl Command for Wc {
    fn name(&self) -> &'static str {
        "wc"
    }

    fn usage(&self) -> &'static str {
        "wc [FILE]..."
    }

    fn apropos(&self) -> &'static str {
        "count lines, words and bytes"
    }

    fn main(&self, _mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
        let args: Args = parse("wc", args)?;
        if args.files.is_empty() {
            let mut buf = String::new();
            io.stdin.read_to_string(&mut buf)?;
            let (l, w, b) = counts(&buf);
            writeln!(io.stdout, "{l} {w} {b}")?;
            return Ok(());
        }
        for name in args.files {
            let text = std::fs::read_to_string(&name)
                .map_err(|e| anyhow::anyhow!("wc: {}: {}", name, e))?;
            let (l, w, b) = counts(&text);
            writeln!(io.stdout, "{l} {w} {b} {name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mux::{Input, Output};

    #[test]
    fn counts_stdin() {
        let mut mux = Mux::new("test");
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes("one two\nthree\n"),
            stdout,
            stderr,
        };
        Wc.main(&mut mux, &[], &mut io).unwrap();
        assert_eq!(&*buf.lock().unwrap(), b"2 3 14\n");
    }

    #[test]
    fn counts_files_with_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, "a b c\n").unwrap();

        let mut mux = Mux::new("test");
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes(""),
            stdout,
            stderr,
        };
        Wc.main(&mut mux, &[path.to_str().unwrap().to_string()], &mut io)
            .unwrap();
        let out = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert!(out.starts_with("1 3 6 "));
    }
}
