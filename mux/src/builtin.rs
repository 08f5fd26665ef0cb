//! Dispatcher builtins.
//!
//! Builtins are plain closures over the dispatcher, never forked and
//! never part of a pipeline. They present the registry's own metadata:
//! usage lines, one-line descriptions, manual text, completion
//! candidates, and the installation's version, license, and patent
//! notices.

use std::io::Write;

use anyhow::Result;

use crate::error::Error;
use crate::stream::Io;
use crate::Mux;

/// An argv-taking closure run in the dispatcher's process.
pub type Builtin = fn(&mut Mux, &[String], &mut Io) -> Result<()>;

const TABLE: &[(&str, Builtin)] = &[
    ("apropos", apropos),
    ("complete", complete),
    ("help", help),
    ("license", license),
    ("man", man),
    ("patents", patents),
    ("usage", usage),
    ("version", version),
];

/// Find a builtin by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
}

/// Builtin names, sorted.
pub fn names() -> impl Iterator<Item = &'static str> {
    TABLE.iter().map(|(n, _)| *n)
}

/// The top-level usage text: the installation's own line followed by one
/// line per registered command.
pub(crate) fn usage_text(mux: &Mux) -> String {
    let mut text = String::new();
    if mux.usage.is_empty() {
        text.push_str(&format!("usage:\t{} COMMAND [ARG]...\n", mux.name));
    } else {
        text.push_str(&format!("usage:\t{}\n", mux.usage));
    }
    for (name, cmd) in mux.registry.iter() {
        if name.is_empty() {
            continue;
        }
        text.push_str(&format!("\t{}\n", cmd.usage()));
    }
    text.trim_end().to_string()
}

fn matches_filter(name: &str, args: &[String]) -> bool {
    args.is_empty() || args.iter().any(|a| name.starts_with(a.as_str()))
}

fn apropos(mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
    for (name, cmd) in mux.registry.iter() {
        if name.is_empty() || !matches_filter(name, args) {
            continue;
        }
        writeln!(io.stdout, "{name:<15} {}", cmd.apropos())?;
    }
    Ok(())
}

fn complete(mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
    let prefix = args.last().map(String::as_str).unwrap_or("");
    let mut candidates: Vec<String> = mux
        .registry
        .names()
        .filter(|n| !n.is_empty())
        .map(String::from)
        .chain(names().map(String::from))
        .chain(mux.functions.keys().cloned())
        .filter(|n| n.starts_with(prefix))
        .collect();
    candidates.sort_unstable();
    candidates.dedup();
    for name in candidates {
        writeln!(io.stdout, "{name}")?;
    }
    Ok(())
}

fn help(mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
    if args.is_empty() {
        writeln!(io.stdout, "{}", usage_text(mux))?;
        writeln!(io.stdout)?;
        return apropos(mux, args, io);
    }
    for name in args {
        let cmd = mux
            .registry
            .get(name)
            .ok_or_else(|| Error::NotFound(name.clone()))?
            .clone();
        writeln!(io.stdout, "usage:\t{}", cmd.usage())?;
        writeln!(io.stdout, "{}", cmd.apropos())?;
    }
    Ok(())
}

fn man(mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
    if args.is_empty() {
        anyhow::bail!("usage: man COMMAND...");
    }
    for name in args {
        let cmd = mux
            .registry
            .get(name)
            .ok_or_else(|| Error::NotFound(name.clone()))?
            .clone();
        let text = cmd.man();
        if text.is_empty() {
            writeln!(io.stdout, "{}\n\t{}", cmd.usage(), cmd.apropos())?;
        } else {
            writeln!(io.stdout, "{}", text.trim_end())?;
        }
    }
    Ok(())
}

fn usage(mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
    if args.is_empty() {
        writeln!(io.stdout, "{}", usage_text(mux))?;
        return Ok(());
    }
    for name in args {
        let cmd = mux
            .registry
            .get(name)
            .ok_or_else(|| Error::NotFound(name.clone()))?
            .clone();
        writeln!(io.stdout, "usage:\t{}", cmd.usage())?;
    }
    Ok(())
}

fn license(mux: &mut Mux, _args: &[String], io: &mut Io) -> Result<()> {
    if mux.license.is_empty() {
        writeln!(io.stdout, "{}: no license text", mux.name)?;
    } else {
        writeln!(io.stdout, "{}", mux.license.trim_end())?;
    }
    Ok(())
}

fn patents(mux: &mut Mux, _args: &[String], io: &mut Io) -> Result<()> {
    if mux.patents.is_empty() {
        writeln!(io.stdout, "{}: no patent notices", mux.name)?;
    } else {
        writeln!(io.stdout, "{}", mux.patents.trim_end())?;
    }
    Ok(())
}

fn version(_mux: &mut Mux, _args: &[String], io: &mut Io) -> Result<()> {
    writeln!(io.stdout, "{}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
