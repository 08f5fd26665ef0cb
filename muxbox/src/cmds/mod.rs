//! The commands this installation registers.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use argh::FromArgs;
use mux::Command;

mod cat;
mod cd;
mod echo;
mod envcmd;
mod exit;
mod function;
mod grep;
mod pwd;
mod sleep;
mod tr;
mod truth;
mod uptimed;
mod wc;

/// Everything except `cli`, which the caller wires separately.
pub fn all() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(cat::Cat),
        Arc::new(cd::Cd),
        Arc::new(echo::Echo),
        Arc::new(envcmd::Env),
        Arc::new(exit::Exit),
        Arc::new(function::Function),
        Arc::new(grep::Grep),
        Arc::new(pwd::Pwd),
        Arc::new(sleep::Sleep),
        Arc::new(tr::Tr),
        Arc::new(truth::True),
        Arc::new(truth::False),
        Arc::new(uptimed::Uptimed),
        Arc::new(wc::Wc),
    ]
}

/// Parse a command's argv with argh; usage problems surface as plain
/// errors carrying argh's help text.
pub(crate) fn parse<T: FromArgs>(name: &str, args: &[String]) -> Result<T> {
    let strs: Vec<&str> = args.iter().map(String::as_str).collect();
    T::from_args(&[name], &strs).map_err(|exit| anyhow!("{}", exit.output.trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_has_metadata() {
        for cmd in all() {
            assert!(!cmd.name().is_empty());
            assert!(!cmd.usage().is_empty());
            assert!(!cmd.apropos().is_empty());
        }
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = all().iter().map(|c| c.name()).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
