use std::fmt;
use std::sync::Arc;

/// Dispatch-level failures.
///
/// Most commands report errors through [`anyhow`]; this enum covers the
/// failures the dispatcher itself produces, so callers can tell a missing
/// command from a policy violation from a child exit without parsing
/// message text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The name resolved to nothing: not a function, command, or builtin.
    #[error("{0}: command not found")]
    NotFound(String),

    /// The name matched no registry entry, even as a prefix, or matched
    /// more than one.
    #[error("{0}: ambiguous or missing command")]
    Ambiguous(String),

    /// A command classified cant-pipe was invoked with redirected stdio.
    #[error("{0}: can't pipe")]
    CantPipe(String),

    /// A daemon was invoked directly instead of through the daemon manager.
    #[error("use `{prog}-daemons start {name}`")]
    Daemon { prog: String, name: String },

    /// Script or interactive input was requested but no `cli` command is
    /// registered.
    #[error("has no cli")]
    NoCli,

    /// A child process exited non-zero. Exit status 1 is the conventional
    /// "false" outcome: it still fails short-circuit checks but is never
    /// echoed to stderr.
    #[error("exit status {0}")]
    ChildExit(i32),
}

/// An error that is simultaneously stored in the dispatcher status and
/// returned to the caller. Cloning an [`anyhow::Error`] is not possible, so
/// both sides share one allocation.
#[derive(Debug, Clone)]
pub struct Shared(pub Arc<anyhow::Error>);

impl fmt::Display for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render the whole context chain; the Arc hides it from anyhow's
        // own alternate formatting.
        write!(f, "{:#}", self.0)
    }
}

impl std::error::Error for Shared {}

impl Error {
    /// True when `err` is the silent "false" outcome (`exit status 1`).
    pub fn is_silent(err: &anyhow::Error) -> bool {
        Self::find_exit(err) == Some(1)
    }

    /// The process exit code an error maps to: the child's own code when
    /// one is recorded, 1 for everything else.
    pub fn exit_code(err: &anyhow::Error) -> i32 {
        Self::find_exit(err).unwrap_or(1)
    }

    fn find_exit(err: &anyhow::Error) -> Option<i32> {
        for cause in err.chain() {
            if let Some(Error::ChildExit(code)) = cause.downcast_ref::<Error>() {
                return Some(*code);
            }
            if let Some(shared) = cause.downcast_ref::<Shared>() {
                if let Some(code) = Self::find_exit(&shared.0) {
                    return Some(code);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn exit_status_one_is_silent() {
        let err: anyhow::Error = Error::ChildExit(1).into();
        assert!(Error::is_silent(&err));
        assert_eq!(Error::exit_code(&err), 1);
    }

    #[test]
    fn other_exits_are_loud() {
        let err: anyhow::Error = Error::ChildExit(2).into();
        assert!(!Error::is_silent(&err));
        assert_eq!(Error::exit_code(&err), 2);
    }

    #[test]
    fn wrapping_preserves_classification() {
        let err = anyhow::Error::from(Error::ChildExit(1)).context("false");
        assert!(Error::is_silent(&err));

        let shared = anyhow::Error::new(Shared(Arc::new(err)));
        assert!(Error::is_silent(&shared));
    }

    #[test]
    fn lookup_failure_maps_to_one() {
        let err: anyhow::Error = Error::NotFound("nope".into()).into();
        assert!(!Error::is_silent(&err));
        assert_eq!(Error::exit_code(&err), 1);
        assert_eq!(err.to_string(), "nope: command not found");
    }
}
