use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use argh::FromArgs;
use mux::{Command, Io, Kind, Mux};

use super::parse;

#[derive(FromArgs)]
/// print the environment, overlay entries included.
struct Args {
    #[argh(positional, greedy)]
    /// print only these variables.
    names: Vec<String>,
}

pub struct Env;

impl Command for Env {
    fn name(&self) -> &'static str {
        "env"
    }

    fn usage(&self) -> &'static str {
        "env [NAME]..."
    }

    fn apropos(&self) -> &'static str {
        "print the layered environment"
    }

    fn kind(&self) -> Kind {
        // the overlay lives in this process
        Kind::DONT_FORK
    }

    fn main(&self, mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
        let args: Args = parse("env", args)?;
        if !args.names.is_empty() {
            for name in &args.names {
                if let Some(value) = mux.env.get_var(name) {
                    writeln!(io.stdout, "{value}")?;
                }
            }
            return Ok(());
        }
        let mut merged: BTreeMap<String, String> = std::env::vars().collect();
        for (k, v) in &mux.env.vars {
            merged.insert(k.clone(), v.clone());
        }
        for (k, v) in merged {
            writeln!(io.stdout, "{k}={v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mux::{Input, Output};

    fn run(mux: &mut Mux, args: &[&str]) -> String {
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes(""),
            stdout,
            stderr,
        };
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Env.main(mux, &args, &mut io).unwrap();
        let bytes = buf.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn overlay_entries_win() {
        let mut mux = Mux::new("test");
        mux.env.set_var("MUXBOX_TEST_ONLY", "overlaid");
        let out = run(&mut mux, &[]);
        assert!(out.contains("MUXBOX_TEST_ONLY=overlaid"));
    }

    #[test]
    fn named_lookup_prints_values_only() {
        let mut mux = Mux::new("test");
        mux.env.set_var("MUXBOX_NAMED", "v1");
        let out = run(&mut mux, &["MUXBOX_NAMED", "MUXBOX_ABSENT"]);
        assert_eq!(out, "v1\n");
    }
}
