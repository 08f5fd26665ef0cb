//! Boolean flag extraction for dispatch preludes.
//!
//! The dispatcher recognizes a handful of hyphen flags (`-debug`, `-f`,
//! `-x`, `-no-liner`) before it knows which command will run, so it cannot
//! use a per-command parser. `extract` pulls the named flags out of an
//! argv, accepting one or two leading dashes, and returns what is left.

use std::collections::HashSet;

/// The set of flags found by [`extract`].
#[derive(Debug, Default)]
pub struct Flags {
    set: HashSet<&'static str>,
}

impl Flags {
    /// True when `name` (in its canonical single-dash form) was present.
    pub fn by_name(&self, name: &str) -> bool {
        self.set.contains(name)
    }
}

/// Split `args` into recognized flags and the residual argv.
///
/// `names` are canonical single-dash spellings; a double-dash spelling of
/// the same flag also matches.
pub fn extract(args: &[String], names: &[&'static str]) -> (Flags, Vec<String>) {
    let mut flags = Flags::default();
    let mut rest = Vec::with_capacity(args.len());
    'args: for arg in args {
        for &name in names {
            if arg == name || (arg.starts_with("--") && arg[1..] == *name) {
                flags.set.insert(name);
                continue 'args;
            }
        }
        rest.push(arg.clone());
    }
    (flags, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_and_double_dash_match() {
        let (flags, rest) = extract(&argv(&["-debug", "--x", "run"]), &["-debug", "-x"]);
        assert!(flags.by_name("-debug"));
        assert!(flags.by_name("-x"));
        assert_eq!(rest, argv(&["run"]));
    }

    #[test]
    fn unknown_flags_stay_in_argv() {
        let (flags, rest) = extract(&argv(&["-v", "cmd"]), &["-debug"]);
        assert!(!flags.by_name("-debug"));
        assert_eq!(rest, argv(&["-v", "cmd"]));
    }

    #[test]
    fn empty_args() {
        let (flags, rest) = extract(&[], &["-f"]);
        assert!(!flags.by_name("-f"));
        assert!(rest.is_empty());
    }
}
