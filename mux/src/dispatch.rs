//! The dispatcher.
//!
//! [`Mux`] owns the registry, the environment overlay, the status of the
//! last completed command, and the shutdown plumbing. Its [`Mux::main`]
//! is the single entry point the binary calls with its argv, and the
//! entry point re-entered in-process when a pipeline stage runs without a
//! fork. Dispatch normalizes the argv (argv0 stripping, help-flag swap,
//! unambiguous prefix shift, script detection), then routes to a
//! registered command, a dispatcher builtin, or the `cli` fallback.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::builtin;
use crate::catline::{self, CatlineRef};
use crate::command::{Command, Function};
use crate::env::Environment;
use crate::error::{Error, Shared};
use crate::flags;
use crate::registry::Registry;
use crate::stream::Io;
use crate::task::{self, Stop, Tasks};

/// The name every installation answers to, next to its own `NAME`.
pub const PROG: &str = "muxbox";

/// Scripts handed to the binary must open with this line.
pub(crate) const SHEBANG: &[u8] = b"#!/usr/bin/muxbox";

/// How chatty evaluation is. `Verify` echoes each forked command with a
/// `+` prefix; `Debug` additionally traces dispatch decisions to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    Verify,
    Debug,
}

/// One dispatcher instance.
pub struct Mux {
    /// The installation name, e.g. `muxbox`. Used for argv0 stripping,
    /// prompts, and the daemon hint.
    pub name: String,
    /// Top-level usage line shown by the `usage` builtin.
    pub usage: &'static str,
    /// One-line description of the installation.
    pub apropos: &'static str,
    /// Text printed by the `license` builtin.
    pub license: &'static str,
    /// Text printed by the `patents` builtin.
    pub patents: &'static str,

    pub registry: Registry,
    pub env: Environment,
    pub functions: HashMap<String, Function>,
    /// The interactive line source used by here-documents and list
    /// continuations. The `cli` command installs the real one.
    pub catline: CatlineRef,

    /// The last completed command's error, `None` after a success.
    pub status: Option<Arc<anyhow::Error>>,
    pub verbosity: Verbosity,
    /// Run every registry command in-process. Set by tests.
    pub in_test: bool,

    pub stop: Stop,
    pub tasks: Tasks,

    pub(crate) argv0: Option<String>,
    path: Vec<String>,
}

impl Mux {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Mux {
            path: vec![name.clone()],
            name,
            usage: "",
            apropos: "",
            license: "",
            patents: "",
            registry: Registry::new(),
            env: Environment::new(),
            functions: HashMap::new(),
            catline: catline::catline(catline::Null),
            status: None,
            verbosity: Verbosity::default(),
            in_test: false,
            stop: Stop::new(),
            tasks: Tasks::new(),
            argv0: None,
        }
    }

    /// The command-name chain from the binary down to this dispatcher.
    /// Re-exec'd children receive it as their leading argv.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Top-level entry point: fresh stop token, inherited streams.
    pub fn main(&mut self, args: Vec<String>) -> Result<()> {
        self.stop = Stop::new();
        self.argv0 = args.first().cloned();
        let mut io = Io::inherit();
        self.main_io(args, &mut io)
    }

    /// Dispatch with explicit streams. Pipeline stages that execute
    /// in-process re-enter here with their stage streams.
    pub fn main_io(&mut self, mut args: Vec<String>, io: &mut Io) -> Result<()> {
        if args.first().map(String::as_str) == Some("/proc/self/exe") {
            args.remove(0);
        }
        if let Some(first) = args.first() {
            let base = Path::new(first)
                .file_name()
                .map(|b| b.to_string_lossy().into_owned())
                .unwrap_or_default();
            if base == self.name || base == PROG {
                args.remove(0);
            }
        }

        swap(&mut args);
        let mut found = args.first().and_then(|n| self.registry.get(n)).cloned();

        if found.is_none() {
            let cli = self.registry.get("cli").cloned();
            let (cli_flags, mut cli_args) =
                flags::extract(&args, &["-debug", "-f", "-no-liner", "-x"]);
            if cli_flags.by_name("-debug") && self.verbosity < Verbosity::Debug {
                self.verbosity = Verbosity::Debug;
            }
            match cli_args.len() {
                0 => {
                    return if let Some(cli) = cli {
                        let mut pass = Vec::new();
                        for flag in ["-no-liner", "-x"] {
                            if cli_flags.by_name(flag) {
                                pass.push(flag.to_string());
                            }
                        }
                        let r = cli.main(self, &pass, io);
                        self.finish(r)
                    } else if let Some(def) = self.registry.get("").cloned() {
                        let r = def.main(self, &[], io);
                        self.finish(r)
                    } else {
                        println!("{}", builtin::usage_text(self));
                        self.status = None;
                        Ok(())
                    };
                }
                1 => {
                    if is_script(&cli_args[0]) {
                        let Some(cli) = cli else {
                            return Err(self.fail(Error::NoCli.into()));
                        };
                        for flag in ["-f", "-x"] {
                            if cli_flags.by_name(flag) {
                                cli_args.push(flag.to_string());
                            }
                        }
                        let r = cli.main(self, &cli_args, io);
                        return self.finish(r);
                    }
                    args = cli_args;
                }
                _ => {
                    args = cli_args;
                }
            }
        }

        // The zero-argument case returned above; args[0] exists.
        if let Some(b) = builtin::lookup(&args[0]) {
            let rest = args[1..].to_vec();
            let r = b(self, &rest, io);
            return self.finish(r);
        }
        if args.len() == 1 && args[0].starts_with('-') {
            let name = args[0].trim_start_matches('-').to_string();
            if let Some(b) = builtin::lookup(&name) {
                let r = b(self, &[], io);
                return self.finish(r);
            }
        }

        if self.shift(&mut args) {
            found = self.registry.get(&args[0]).cloned();
        }

        log::debug!("dispatch {args:?}");

        let cmd = match found {
            Some(cmd) => cmd,
            None => match self.registry.get("").cloned() {
                Some(def) => {
                    args.insert(0, String::new());
                    def
                }
                None => {
                    return Err(self.fail(Error::Ambiguous(args[0].clone()).into()));
                }
            },
        };

        let rest = args[1..].to_vec();
        if cmd.kind().is_daemon() {
            return self.supervise(cmd, &rest, io);
        }

        match cmd.main(self, &rest, io) {
            Ok(()) => {
                self.status = None;
                Ok(())
            }
            Err(err) => {
                let mut name = args[0].clone();
                if name.is_empty() {
                    if let Some(aka) = cmd.aka() {
                        name = format!("({aka})");
                    }
                }
                Err(self.fail(err.context(name)))
            }
        }
    }

    /// Run a daemon under SIGTERM supervision: the watcher trips the stop
    /// token and invokes the command's `close` hook; after the daemon's
    /// `main` returns, every background task is joined before the result
    /// propagates unchanged.
    fn supervise(
        &mut self,
        cmd: Arc<dyn Command>,
        args: &[String],
        io: &mut Io,
    ) -> Result<()> {
        task::arm_sigterm()?;
        let (quit_tx, quit_rx) = mpsc::channel::<()>();
        let stop = self.stop.clone();
        let closer = cmd.clone();
        self.tasks.spawn(move || loop {
            match quit_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => return,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if task::sigterm_seen() {
                        log::info!("SIGTERM");
                        stop.trip();
                        if let Err(err) = closer.close() {
                            log::warn!("close: {err:#}");
                        }
                        return;
                    }
                }
            }
        });
        let result = cmd.main(self, args, io);
        drop(quit_tx);
        self.tasks.wait();
        task::disarm_sigterm();
        result
    }

    /// A child command ready to re-exec this binary under the dispatch
    /// path plus `args`.
    pub fn fork(&self, args: &[String]) -> process::Command {
        log::debug!("fork {args:?}");
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from(&self.path[0]));
        let mut cmd = process::Command::new(exe);
        cmd.args(&self.path[1..]);
        cmd.args(args);
        cmd
    }

    /// Join every outstanding background task. A binary calls this once
    /// before exiting so that mid-pipeline children are drained.
    pub fn drain(&self) {
        self.tasks.wait();
    }

    /// The process exit code implied by the current status.
    pub fn exit_code(&self) -> i32 {
        match &self.status {
            None => 0,
            Some(err) => Error::exit_code(err),
        }
    }

    /// Record a failure in `status` and return the error to the caller;
    /// both sides share one allocation.
    pub(crate) fn fail(&mut self, err: anyhow::Error) -> anyhow::Error {
        if let Some(shared) = err.downcast_ref::<Shared>() {
            self.status = Some(shared.0.clone());
            return err;
        }
        let shared = Arc::new(err);
        self.status = Some(shared.clone());
        anyhow::Error::new(Shared(shared))
    }

    fn finish(&mut self, r: Result<()>) -> Result<()> {
        match r {
            Ok(()) => {
                self.status = None;
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Move the first token that names a registry entry — exactly, or as
    /// an unambiguous prefix of exactly one name — to the front, shifting
    /// the tokens before it right by one. `-s li` becomes `link -s` when
    /// `link` is the only name starting with `li`.
    pub(crate) fn shift(&self, args: &mut Vec<String>) -> bool {
        for i in 0..args.len() {
            if self.registry.contains(&args[i]) {
                args[..=i].rotate_right(1);
                return true;
            }
            let prefix = args[i].clone();
            if prefix.is_empty() {
                continue;
            }
            let mut candidates = self
                .registry
                .names()
                .filter(|name| !name.is_empty() && name.starts_with(prefix.as_str()));
            let first = candidates.next().map(str::to_string);
            let ambiguous = candidates.next().is_some();
            if let (Some(only), false) = (first, ambiguous) {
                args[..=i].rotate_right(1);
                args[0] = only;
                return true;
            }
        }
        false
    }
}

/// Rewrite hyphenated helper flags so the builtin leads: `-help` becomes
/// `help`, and `COMMAND -help` becomes `help COMMAND`.
fn swap(args: &mut [String]) {
    if args.is_empty() {
        return;
    }
    if args[0].starts_with('-') {
        let opt = args[0].trim_start_matches('-').to_string();
        if builtin::lookup(&opt).is_some() {
            args[0] = opt;
        }
    } else if args.len() > 1 && args[1].starts_with('-') {
        let opt = args[1].trim_start_matches('-').to_string();
        if builtin::lookup(&opt).is_some() {
            args[1] = std::mem::replace(&mut args[0], opt);
        }
    }
}

fn is_script(arg: &str) -> bool {
    if arg == "-" {
        return true;
    }
    match std::fs::read(arg) {
        Ok(buf) => buf.starts_with(SHEBANG) && std::str::from_utf8(&buf).is_ok(),
        Err(_) => false,
    }
}
