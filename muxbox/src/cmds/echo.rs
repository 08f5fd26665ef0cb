use std::io::Write;

use anyhow::Result;
use argh::FromArgs;
use mux::{Command, Io, Mux};

use super::parse;

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
struct Args {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    args: Vec<String>,
}

pub struct Echo;

impl Command for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn usage(&self) -> &'static str {
        "echo [-n] [ARG]..."
    }

    fn apropos(&self) -> &'static str {
        "write arguments to standard output"
    }

    fn main(&self, _mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
        let args: Args = parse("echo", args)?;
        let line = args.args.join(" ");
        if args.no_newline {
            write!(io.stdout, "{line}")?;
        } else {
            writeln!(io.stdout, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mux::{Input, Output};

    fn run(args: &[&str]) -> String {
        let mut mux = Mux::new("test");
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes(""),
            stdout,
            stderr,
        };
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Echo.main(&mut mux, &args, &mut io).unwrap();
        let bytes = buf.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn joins_arguments_with_spaces() {
        assert_eq!(run(&["hello", "world"]), "hello world\n");
    }

    #[test]
    fn dash_n_suppresses_the_newline() {
        assert_eq!(run(&["-n", "bare"]), "bare");
    }

    #[test]
    fn no_arguments_prints_an_empty_line() {
        assert_eq!(run(&[]), "\n");
    }
}
