use std::io::Write;

use anyhow::Result;
use argh::FromArgs;
use mux::{Command, Io, Mux};

use super::parse;

#[derive(FromArgs)]
/// print the current working directory to standard output.
struct Args {}

pub struct Pwd;

impl Command for Pwd {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn usage(&self) -> &'static str {
        "pwd"
    }

    fn apropos(&self) -> &'static str {
        "print the working directory"
    }

    fn main(&self, _mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
        let _args: Args = parse("pwd", args)?;
        let dir = std::env::current_dir()?;
        writeln!(io.stdout, "{}", dir.display())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mux::{Input, Output};

    #[test]
    fn prints_a_nonempty_path() {
        let mut mux = Mux::new("test");
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes(""),
            stdout,
            stderr,
        };
        Pwd.main(&mut mux, &[], &mut io).unwrap();
        let out = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert!(out.trim_end().starts_with('/'));
    }
}
