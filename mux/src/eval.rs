//! The evaluator: one command, one pipeline, one list.
//!
//! Evaluation happens in two phases. Composition walks a parsed [`List`]
//! from the front and produces [`Runner`]s: `process_command` builds the
//! runner for a single cmdline, `process_pipeline` links a `|` run of
//! them, `process_list` chains pipelines under `&&`/`||`. Execution then
//! calls the composed runner with the dispatcher and a stream triple.
//! Name resolution, variable expansion, and redirection binding all
//! happen at execution time, so an earlier command in a list can change
//! what a later one sees.

use std::process::ExitStatus;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use crate::builtin;
use crate::command::{Function, Runner};
use crate::error::{Error, Shared};
use crate::parser::{self, Cmdline, List, Term};
use crate::redirect;
use crate::stream::{Closers, Input, Io, Output};
use crate::{Mux, Verbosity};

impl Mux {
    /// Build the runner for one cmdline. `closers` collects redirection
    /// resources for the enclosing pipeline to release.
    pub fn process_command(&self, cl: Cmdline, closers: &Closers) -> Runner {
        let closers = closers.clone();
        Box::new(move |mux: &mut Mux, io: Io| -> Result<()> {
            let Io {
                stdin,
                stdout,
                stderr,
            } = io;
            let (env_map, mut args) = cl.slice(&|k| mux.env.get_var(k));

            // A line of nothing but assignments persists into the
            // dispatcher for the commands that follow.
            if args.is_empty() {
                if !env_map.is_empty() {
                    mux.env.extend(env_map);
                    mux.status = None;
                }
                return Ok(());
            }

            let name = args[0].clone();
            if let Some(f) = mux.functions.get(&name).cloned() {
                let mut io = Io {
                    stdin,
                    stdout,
                    stderr,
                };
                return mux.run_function(&f, &mut io);
            }

            let redirected = stdin.is_redirected()
                || stdout.is_redirected()
                || stderr.is_redirected();

            let cmd = match mux.registry.get(&name) {
                Some(cmd) => cmd.clone(),
                None => {
                    if let Some(b) = builtin::lookup(&name) {
                        let rest = args[1..].to_vec();
                        let mut io = Io {
                            stdin,
                            stdout,
                            stderr,
                        };
                        return b(mux, &rest, &mut io);
                    }
                    return Err(Error::NotFound(name).into());
                }
            };

            let kind = cmd.kind();
            if kind.is_daemon() {
                return Err(Error::Daemon {
                    prog: mux.name.clone(),
                    name,
                }
                .into());
            }
            if redirected && kind.is_cant_pipe() {
                return Err(Error::CantPipe(name).into());
            }
            if kind.is_dont_fork() || mux.in_test || Some(&name) == mux.argv0.as_ref() {
                let mut io = Io {
                    stdin,
                    stdout,
                    stderr,
                };
                return mux.main_io(args, &mut io);
            }

            // Fork path. Whether this stage is awaited depends on its
            // position in the pipeline, decided before redirections may
            // replace the streams.
            let terminal = !stdout.is_redirected();
            let mut input = stdin;
            if !input.is_redirected() {
                let (rest, replacement) =
                    redirect::bind_stdin(&mux.catline, args, &closers)?;
                args = rest;
                if let Some(r) = replacement {
                    input = r;
                }
            }
            let mut output = stdout;
            if !output.is_redirected() {
                let (rest, replacement) = redirect::bind_stdout(args, &closers)?;
                args = rest;
                if let Some(o) = replacement {
                    output = o;
                }
            }

            if mux.verbosity >= Verbosity::Verify {
                let mut echo = String::new();
                for (k, v) in &env_map {
                    echo.push_str(&format!("{k}={v} "));
                }
                println!("+ {echo}{}", args.join(" "));
            }

            let mut child = mux.fork(&args);
            if !env_map.is_empty() {
                child.envs(env_map);
            }
            child
                .stdin(input.into_stdio(&mux.tasks)?)
                .stdout(output.into_stdio(&mux.tasks)?)
                .stderr(stderr.into_stdio(&mux.tasks)?);
            let mut child = child
                .spawn()
                .with_context(|| format!("child: {args:?}"))?;

            if terminal {
                let status = child.wait()?;
                if status.success() {
                    mux.status = None;
                } else {
                    let code = exit_code(status);
                    if code != 1 {
                        eprintln!("exit status {code}");
                    }
                    mux.status = Some(Arc::new(Error::ChildExit(code).into()));
                }
            } else {
                mux.tasks.spawn(move || match child.wait() {
                    Ok(status) => {
                        if !status.success() {
                            let code = exit_code(status);
                            if code != 1 {
                                eprintln!("exit status {code}");
                            }
                        }
                    }
                    Err(err) => eprintln!("{err}"),
                });
            }
            Ok(())
        })
    }

    /// Carve one pipeline (a maximal `|` run) off the front of `ls`.
    ///
    /// Returns the residual list, the terminator that ended the pipeline,
    /// and the composed runner.
    pub fn process_pipeline(&mut self, mut ls: List) -> Result<(List, Term, Runner)> {
        let closers = Closers::new();
        let mut stages: Vec<Runner> = Vec::new();
        let mut term = Term::Empty;

        while !ls.cmds.is_empty() {
            let name = ls.cmds.front().and_then(Cmdline::name);
            let blocker = name
                .as_deref()
                .and_then(|n| self.registry.get(n))
                .filter(|cmd| cmd.as_blocker().is_some())
                .cloned();
            if let Some(cmd) = blocker {
                let (rest, t, runner) = cmd
                    .as_blocker()
                    .expect("probed above")
                    .block(self, ls)?;
                ls = rest;
                term = t;
                stages.push(runner);
            } else {
                let cl = ls.cmds.pop_front().expect("checked non-empty");
                term = cl.term;
                stages.push(self.process_command(cl, &closers));
            }
            if term != Term::Pipe {
                break;
            }
        }

        Ok((ls, term, make_pipefun(stages, closers)))
    }

    /// Compose everything up to (and including) the first pipeline whose
    /// terminator is not `&&`/`||`.
    pub fn process_list(&mut self, ls: List) -> Result<(List, Term, Runner)> {
        let mut ls = self.ensure_terminated(ls)?;
        let mut items: Vec<(Runner, Term)> = Vec::new();
        let mut term = Term::Empty;

        while !ls.cmds.is_empty() {
            let (rest, t, runner) = self.process_pipeline(ls)?;
            ls = rest;
            term = t;
            items.push((runner, t));
            if t != Term::AndIf && t != Term::OrIf {
                break;
            }
        }

        Ok((ls, term, make_listfun(items)))
    }

    /// A list may not end on `|`, `&&`, or `||`; keep asking the line
    /// source for more until some cmdline carries a closing terminator.
    /// The continuation prompt is the dangling terminator followed by
    /// `>>`.
    pub(crate) fn ensure_terminated(&mut self, mut ls: List) -> Result<List> {
        loop {
            let mut term = Term::Empty;
            let mut done = ls.cmds.is_empty();
            for cl in &ls.cmds {
                term = cl.term;
                if !term.is_continuation() {
                    done = true;
                    break;
                }
            }
            if done {
                return Ok(ls);
            }
            let prompt = format!("{}>>", term.as_str());
            let more = parser::parse(&prompt, &self.catline.clone())?
                .ok_or_else(|| anyhow!("unexpected end of input"))?;
            ls.cmds.extend(more.cmds);
        }
    }

    /// Run a stored function body with the caller's streams.
    pub fn run_function(&mut self, f: &Function, io: &mut Io) -> Result<()> {
        let mut ls = f.body.clone();
        while !ls.cmds.is_empty() {
            let (rest, _term, mut listfun) = self.process_list(ls)?;
            ls = rest;
            listfun(self, io.try_clone()?)?;
        }
        Ok(())
    }
}

/// Link stages with OS pipes into one runner.
///
/// Stage `i` writes the fresh pipe consumed by stage `i + 1`; the last
/// stage writes the caller's stdout; every stage shares the caller's
/// stderr. Stages launch in order, a stage error stops the launch, and
/// the closer list drains (LIFO) once the pipeline is done either way.
pub(crate) fn make_pipefun(mut stages: Vec<Runner>, closers: Closers) -> Runner {
    Box::new(move |mux: &mut Mux, io: Io| -> Result<()> {
        if stages.is_empty() {
            return Ok(());
        }
        let Io {
            stdin,
            stdout,
            stderr,
        } = io;
        let end = stages.len() - 1;
        let mut input = stdin;
        let mut result = Ok(());

        for (i, stage) in stages.iter_mut().enumerate() {
            let step = (|| -> Result<()> {
                let (out, next) = if i == end {
                    (stdout.try_clone()?, None)
                } else {
                    let (r, w) = os_pipe::pipe()?;
                    (Output::Pipe(w), Some(Input::Pipe(r)))
                };
                let stage_io = Io {
                    stdin: std::mem::replace(&mut input, Input::Stdin),
                    stdout: out,
                    stderr: stderr.try_clone()?,
                };
                stage(mux, stage_io)?;
                if let Some(next) = next {
                    input = next;
                }
                Ok(())
            })();
            if let Err(err) = step {
                result = Err(err);
                break;
            }
        }
        closers.drain();
        result
    })
}

/// Chain pipelines with short-circuit semantics.
///
/// After every slot — executed or skipped — the skip flag is recomputed
/// from the dispatcher status and the slot's terminator: a failure arms
/// the skip across `&&`, a success arms it across `||`. The runner's
/// return value is the last executed pipeline's result.
pub(crate) fn make_listfun(items: Vec<(Runner, Term)>) -> Runner {
    let mut items = items;
    Box::new(move |mux: &mut Mux, io: Io| -> Result<()> {
        let mut result: Result<()> = Ok(());
        let mut skip_next = false;
        for (run, term) in items.iter_mut() {
            if !skip_next {
                match run(mux, io.try_clone()?) {
                    Ok(()) => result = Ok(()),
                    Err(err) => {
                        let shared = Arc::new(err);
                        mux.status = Some(shared.clone());
                        result = Err(anyhow::Error::new(Shared(shared)));
                    }
                }
            }
            skip_next = match mux.status {
                Some(_) => *term == Term::AndIf,
                None => *term == Term::OrIf,
            };
        }
        result
    })
}

/// Map a child's wait status to a shell-style exit code; signal deaths
/// report as 128 plus the signal number.
#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(code) = status.code() {
        code
    } else if let Some(signal) = status.signal() {
        128 + signal
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
