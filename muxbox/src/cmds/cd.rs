use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use mux::{Command, Io, Kind, Mux};

use super::parse;

#[derive(FromArgs)]
/// change the current working directory.
/// without a target, changes to the directory named by HOME.
struct Args {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current
    /// directory. Defaults to $HOME when omitted.
    target: Option<String>,
}

pub struct Cd;

impl Command for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn usage(&self) -> &'static str {
        "cd [DIRECTORY]"
    }

    fn apropos(&self) -> &'static str {
        "change the working directory"
    }

    fn kind(&self) -> Kind {
        // chdir in a child would be invisible here
        Kind::DONT_FORK
    }

    fn main(&self, mux: &mut Mux, args: &[String], _io: &mut Io) -> Result<()> {
        let args: Args = parse("cd", args)?;
        let target = match args.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => PathBuf::from(
                mux.env
                    .get_var("HOME")
                    .ok_or_else(|| anyhow::anyhow!("cd: no target and HOME not set"))?,
            ),
        };
        let canonical = std::fs::canonicalize(&target)
            .with_context(|| format!("cd: can't canonicalize {}", target.display()))?;
        std::env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        Ok(())
    }
}
