use std::io::{BufRead, BufReader, Read, Write};

use anyhow::{Context, Result};
use argh::FromArgs;
use mux::{Command, Io, Mux};
use regex::RegexBuilder;

use super::parse;

#[derive(FromArgs)]
/// print lines matching a pattern
struct Args {
    #[argh(positional)]
    /// the pattern to search for (a regular expression)
    pattern: String,

    #[argh(positional, greedy)]
    /// files to search. If none provided, reads from stdin.
    files: Vec<String>,

    #[argh(switch, short = 'w')]
    /// match only whole words (using non-word characters as boundaries)
    word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    ignore_case: bool,

    #[argh(switch, short = 'n')]
    /// prefix each matching line with its line number
    line_number: bool,
}

fn search(
    reader: &mut dyn Read,
    stdout: &mut dyn Write,
    file_name: Option<&str>,
    re: &regex::Regex,
    line_number: bool,
) -> Result<bool> {
    let reader = BufReader::new(reader);
    let prefix = file_name.map(|n| format!("{n}:")).unwrap_or_default();
    let mut matched = false;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if re.is_match(&line) {
            matched = true;
            if line_number {
                writeln!(stdout, "{prefix}{}:{line}", index + 1)?;
            } else {
                writeln!(stdout, "{prefix}{line}")?;
            }
        }
    }
    Ok(matched)
}

pub struct Grep;

impl Command for Grep {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn usage(&self) -> &'static str {
        "grep [-i] [-n] [-w] PATTERN [FILE]..."
    }

    fn apropos(&self) -> &'static str {
        "print lines matching a pattern"
    }

    fn main(&self, _mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
        let args: Args = parse("grep", args)?;

        let pattern = if args.word_regexp {
            format!(r"\b({})\b", args.pattern)
        } else {
            args.pattern.clone()
        };
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(args.ignore_case)
            .build()
            .with_context(|| format!("invalid regex pattern: {pattern}"))?;

        let mut matched = false;
        if args.files.is_empty() {
            matched = search(&mut io.stdin, &mut io.stdout, None, &re, args.line_number)?;
        } else {
            let multi = args.files.len() > 1;
            for name in &args.files {
                let mut f = std::fs::File::open(name)
                    .map_err(|e| anyhow::anyhow!("grep: {}: {}", name, e))?;
                let label = multi.then_some(name.as_str());
                matched |= search(&mut f, &mut io.stdout, label, &re, args.line_number)?;
            }
        }
        if matched {
            Ok(())
        } else {
            // no matches is the conventional "false" outcome
            Err(mux::Error::ChildExit(1).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mux::{Error, Input, Output};

    fn run(args: &[&str], stdin: &str) -> (String, Result<()>) {
        let mut mux = Mux::new("test");
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes(stdin),
            stdout,
            stderr,
        };
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let result = Grep.main(&mut mux, &args, &mut io);
        let bytes = buf.lock().unwrap().clone();
        (String::from_utf8(bytes).unwrap(), result)
    }

    #[test]
    fn matching_lines_print() {
        let (out, result) = run(&["b.r"], "bar\nbaz\nquux\n");
        result.unwrap();
        assert_eq!(out, "bar\n");
    }

    #[test]
    fn ignore_case_and_line_numbers() {
        let (out, result) = run(&["-i", "-n", "BAR"], "one\nbar\n");
        result.unwrap();
        assert_eq!(out, "2:bar\n");
    }

    #[test]
    fn word_match_respects_boundaries() {
        let (out, result) = run(&["-w", "bar"], "bar\nrebar\n");
        result.unwrap();
        assert_eq!(out, "bar\n");
    }

    #[test]
    fn no_match_is_falsey_and_silent() {
        let (out, result) = run(&["zzz"], "nothing here\n");
        let err = result.unwrap_err();
        assert!(Error::is_silent(&err));
        assert_eq!(out, "");
    }

    #[test]
    fn files_are_labelled_when_several() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, "hit\n").unwrap();
        std::fs::write(&b, "hit\nmiss\n").unwrap();
        let (out, result) = run(&["hit", a.to_str().unwrap(), b.to_str().unwrap()], "");
        result.unwrap();
        assert_eq!(
            out,
            format!("{}:hit\n{}:hit\n", a.display(), b.display())
        );
    }
}
