use anyhow::Result;
use mux::{Command, Error, Io, Mux};

/// Succeed doing nothing.
pub struct True;

impl Command for True {
    fn name(&self) -> &'static str {
        "true"
    }

    fn usage(&self) -> &'static str {
        "true"
    }

    fn apropos(&self) -> &'static str {
        "do nothing, successfully"
    }

    fn main(&self, _mux: &mut Mux, _args: &[String], _io: &mut Io) -> Result<()> {
        Ok(())
    }
}

/// Fail doing nothing.
pub struct False;

impl Command for False {
    fn name(&self) -> &'static str {
        "false"
    }

    fn usage(&self) -> &'static str {
        "false"
    }

    fn apropos(&self) -> &'static str {
        "do nothing, unsuccessfully"
    }

    fn main(&self, _mux: &mut Mux, _args: &[String], _io: &mut Io) -> Result<()> {
        Err(Error::ChildExit(1).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mux::{Input, Output};

    fn io() -> Io {
        let (stdout, _) = Output::capture();
        let (stderr, _) = Output::capture();
        Io {
            stdin: Input::bytes(""),
            stdout,
            stderr,
        }
    }

    #[test]
    fn true_succeeds_false_fails_silently() {
        let mut mux = Mux::new("test");
        True.main(&mut mux, &[], &mut io()).unwrap();
        let err = False.main(&mut mux, &[], &mut io()).unwrap_err();
        assert!(Error::is_silent(&err));
    }
}
