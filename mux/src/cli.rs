//! The `cli` command: the interactive shell and script driver.
//!
//! `cli` is the dispatcher's fallback when no subcommand matches, and the
//! executor for script files. It installs a line source (a rustyline
//! editor, a plain reader under `-no-liner`, a file, or stdin for `-`),
//! then loops: parse a list, compose it, run it. Command failures print
//! once to stderr — except the silent `exit status 1` — and stop a script
//! unless `-f` keeps it going; interactive sessions always continue.

use std::fs::File;
use std::io::{self, BufReader};

use anyhow::{Context, Result};

use crate::catline::{self, Catline};
use crate::command::{Command, Kind};
use crate::error::Error;
use crate::flags;
use crate::parser;
use crate::stream::Io;
use crate::Mux;

#[derive(Default)]
pub struct Cli;

impl Command for Cli {
    fn name(&self) -> &'static str {
        "cli"
    }

    fn usage(&self) -> &'static str {
        "cli [-x] [-f] [-no-liner] [SCRIPT | -]"
    }

    fn apropos(&self) -> &'static str {
        "command line interpreter"
    }

    fn man(&self) -> &'static str {
        "Read commands from the terminal, a script file, or standard input
and evaluate them: pipelines joined by `|`, lists joined by `&&`, `||`,
and `;`, with redirections and here-documents.

	-x	print each input line before running it
	-f	keep running a script after an error
	-no-liner
		read lines without interactive editing"
    }

    fn kind(&self) -> Kind {
        Kind::DONT_FORK | Kind::CANT_PIPE
    }

    fn main(&self, mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
        let (flags, rest) = flags::extract(args, &["-x", "-f", "-no-liner"]);
        let trace = flags.by_name("-x");
        let force = flags.by_name("-f");
        let no_liner = flags.by_name("-no-liner");
        let script = rest.first().cloned();
        let interactive = script.is_none();

        let source: Box<dyn Catline> = match script.as_deref() {
            Some("-") => Box::new(catline::Reader::new(BufReader::new(io::stdin()))),
            Some(path) => {
                let file = File::open(path).with_context(|| path.to_string())?;
                Box::new(catline::Reader::new(BufReader::new(file)))
            }
            None if no_liner => Box::new(catline::Reader::new(BufReader::new(io::stdin()))),
            None => Box::new(catline::Liner::new()?),
        };

        let previous = std::mem::replace(
            &mut mux.catline,
            std::sync::Arc::new(std::sync::Mutex::new(SourceCell(source))),
        );

        let prompt = format!("{}> ", mux.name);
        let result = drive(mux, io, &prompt, trace, force, interactive);
        mux.catline = previous;
        result
    }
}

/// Adapter so a boxed source can live behind the shared handle.
struct SourceCell(Box<dyn Catline>);

impl Catline for SourceCell {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.0.read_line(prompt)
    }
}

fn drive(
    mux: &mut Mux,
    io: &mut Io,
    prompt: &str,
    trace: bool,
    force: bool,
    interactive: bool,
) -> Result<()> {
    loop {
        let parsed = match parser::parse(prompt, &mux.catline.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                eprintln!("{err:#}");
                if interactive {
                    continue;
                }
                return Err(err);
            }
        };
        let Some(mut ls) = parsed else {
            return Ok(());
        };
        if trace {
            println!("+ {ls}");
        }
        while !ls.cmds.is_empty() {
            let (rest, _term, mut listfun) = match mux.process_list(ls) {
                Ok(parts) => parts,
                Err(err) => {
                    eprintln!("{err:#}");
                    if interactive || force {
                        break;
                    }
                    return Err(err);
                }
            };
            ls = rest;
            if let Err(err) = listfun(mux, io.try_clone()?) {
                if !Error::is_silent(&err) {
                    eprintln!("{err:#}");
                }
                if !interactive && !force {
                    // the status already carries the failure; the exit
                    // code comes from there
                    return Ok(());
                }
            }
        }
    }
}
