//! The command contract.
//!
//! Every subcommand hosted by the dispatcher implements [`Command`]. The
//! trait is deliberately wide and shallow: identification and
//! documentation strings, a [`Kind`] classification, the `main` entry
//! point, and two optional capabilities — [`Blocker`] for control-flow
//! commands that consume extra cmdlines, and `close` for daemon teardown.
//! The dispatcher reaches commands through `Arc<dyn Command>`; commands
//! reach back through the `&mut Mux` handed to `main`, so there is no
//! parent cycle to manage.

use std::ops::BitOr;

use anyhow::Result;

use crate::parser::{List, Term};
use crate::stream::Io;
use crate::Mux;

/// Classification bits consulted by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Kind {
    bits: u8,
}

impl Kind {
    /// Must run under daemon supervision; direct pipeline invocation is
    /// refused with a hint.
    pub const DAEMON: Kind = Kind { bits: 1 };
    /// Must execute in the current process regardless of pipeline
    /// position (commands that mutate dispatcher or process state).
    pub const DONT_FORK: Kind = Kind { bits: 2 };
    /// Refuses any invocation whose stdio is redirected.
    pub const CANT_PIPE: Kind = Kind { bits: 4 };

    pub fn is_daemon(self) -> bool {
        self.bits & Kind::DAEMON.bits != 0
    }

    pub fn is_dont_fork(self) -> bool {
        self.bits & Kind::DONT_FORK.bits != 0
    }

    pub fn is_cant_pipe(self) -> bool {
        self.bits & Kind::CANT_PIPE.bits != 0
    }
}

impl BitOr for Kind {
    type Output = Kind;

    fn bitor(self, rhs: Kind) -> Kind {
        Kind {
            bits: self.bits | rhs.bits,
        }
    }
}

/// A runnable produced by the evaluator: one command, one composed
/// pipeline, or one composed list. The dispatcher and streams arrive at
/// call time, so runners stay free of borrows while they are composed.
pub type Runner = Box<dyn FnMut(&mut Mux, Io) -> Result<()>>;

/// A named subcommand.
pub trait Command: Send + Sync {
    /// Canonical name, the registry key.
    fn name(&self) -> &'static str;

    /// Alternate spelling used in diagnostics for the default (unnamed)
    /// command.
    fn aka(&self) -> Option<&'static str> {
        None
    }

    /// One-line invocation syntax.
    fn usage(&self) -> &'static str;

    /// One-line description.
    fn apropos(&self) -> &'static str;

    /// Longer manual text; empty when there is none.
    fn man(&self) -> &'static str {
        ""
    }

    fn kind(&self) -> Kind {
        Kind::default()
    }

    /// Run the command. `args` excludes the command name except when the
    /// dispatcher re-enters itself, in which case normalization strips it
    /// again.
    fn main(&self, mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()>;

    /// Control-flow capability: a command that consumes additional
    /// cmdlines from the current list during evaluation.
    fn as_blocker(&self) -> Option<&dyn Blocker> {
        None
    }

    /// Teardown hook invoked during daemon shutdown.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A command that extends evaluation over the cmdlines that follow it.
///
/// `block` receives the whole remaining list, with the triggering cmdline
/// at the front. It returns the residual list, the terminator that ends
/// the construct, and the runner to splice into the current pipeline.
pub trait Blocker {
    fn block(&self, mux: &mut Mux, ls: List) -> Result<(List, Term, Runner)>;
}

/// A named function: its definition as typed, plus the parsed body the
/// evaluator runs on invocation.
#[derive(Clone, Default)]
pub struct Function {
    pub name: String,
    pub definition: Vec<String>,
    pub body: List,
}

#[cfg(test)]
mod tests {
    use super::Kind;

    #[test]
    fn kind_bits_compose() {
        let k = Kind::DONT_FORK | Kind::CANT_PIPE;
        assert!(k.is_dont_fork());
        assert!(k.is_cant_pipe());
        assert!(!k.is_daemon());

        let plain = Kind::default();
        assert!(!plain.is_daemon() && !plain.is_dont_fork() && !plain.is_cant_pipe());
    }
}
