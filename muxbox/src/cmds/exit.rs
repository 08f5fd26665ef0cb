use anyhow::Result;
use argh::FromArgs;
use mux::{Command, Io, Kind, Mux};

use super::parse;

#[derive(FromArgs)]
/// end the session with the given status.
struct Args {
    #[argh(positional)]
    /// exit status; 0 when omitted.
    status: Option<i32>,
}

pub struct Exit;

impl Command for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn usage(&self) -> &'static str {
        "exit [STATUS]"
    }

    fn apropos(&self) -> &'static str {
        "end the session"
    }

    fn kind(&self) -> Kind {
        Kind::DONT_FORK
    }

    fn main(&self, mux: &mut Mux, args: &[String], _io: &mut Io) -> Result<()> {
        let args: Args = parse("exit", args)?;
        mux.drain();
        std::process::exit(args.status.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_must_not_fork() {
        assert!(Exit.kind().is_dont_fork());
    }
}
