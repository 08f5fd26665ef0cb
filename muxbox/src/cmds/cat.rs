use std::io::{Read, Write};

use anyhow::Result;
use argh::FromArgs;
use mux::{Command, Io, Mux};

use super::parse;

#[derive(FromArgs)]
/// print file(s), or standard input, to standard output
struct Args {
    #[argh(positional, greedy)]
    /// files to concatenate; standard input when none are given.
    files: Vec<String>,
}

pub struct Cat;

impl Command for Cat {
    fn name(&self) -> &'static str {
        "cat"
    }

    fn usage(&self) -> &'static str {
        "cat [FILE]..."
    }

    fn apropos(&self) -> &'static str {
        "concatenate files to standard output"
    }

    fn main(&self, _mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
        let args: Args = parse("cat", args)?;
        if args.files.is_empty() {
            let mut buf = Vec::new();
            io.stdin.read_to_end(&mut buf)?;
            io.stdout.write_all(&buf)?;
            return Ok(());
        }
        for name in args.files {
            let mut f = std::fs::File::open(&name)
                .map_err(|e| anyhow::anyhow!("cat: {}: {}", name, e))?;
            std::io::copy(&mut f, &mut io.stdout)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mux::{Input, Output};

    #[test]
    fn copies_stdin_when_no_files() {
        let mut mux = Mux::new("test");
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes("pass through"),
            stdout,
            stderr,
        };
        Cat.main(&mut mux, &[], &mut io).unwrap();
        assert_eq!(&*buf.lock().unwrap(), b"pass through");
    }

    #[test]
    fn concatenates_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, "one\n").unwrap();
        std::fs::write(&b, "two\n").unwrap();

        let mut mux = Mux::new("test");
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes(""),
            stdout,
            stderr,
        };
        let args = vec![
            a.to_str().unwrap().to_string(),
            b.to_str().unwrap().to_string(),
        ];
        Cat.main(&mut mux, &args, &mut io).unwrap();
        assert_eq!(&*buf.lock().unwrap(), b"one\ntwo\n");
    }

    #[test]
    fn missing_file_names_the_file() {
        let mut mux = Mux::new("test");
        let (stdout, _) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes(""),
            stdout,
            stderr,
        };
        let err = Cat
            .main(&mut mux, &["/no/such/file".to_string()], &mut io)
            .unwrap_err();
        assert!(err.to_string().contains("/no/such/file"));
    }
}
