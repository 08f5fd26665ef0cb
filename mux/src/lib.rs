//! An embeddable command multiplexer.
//!
//! One binary hosts many named subcommands: foreground utilities,
//! long-running daemons, and an interactive `cli`. This crate provides
//! the machinery between the binary's `main` and the commands it
//! registers — argv normalization and dispatch, a small pipeline/list
//! evaluator with redirections and here-documents, daemon supervision,
//! and the dispatcher builtins (`help`, `apropos`, `usage`, ...).
//!
//! A binary wires itself up by filling a [`Registry`] with [`Command`]
//! implementations and handing its argv to [`Mux::main`]:
//!
//! ```ignore
//! let mut mux = Mux::new("muxbox");
//! mux.registry.register_all(commands());
//! mux.registry.register(Arc::new(mux::cli::Cli::default()));
//! let result = mux.main(std::env::args().collect());
//! mux.drain();
//! std::process::exit(mux.exit_code());
//! ```

pub mod builtin;
pub mod catline;
pub mod cli;
pub mod command;
mod dispatch;
pub mod env;
mod error;
mod eval;
pub mod flags;
pub mod lexer;
pub mod parms;
pub mod parser;
mod redirect;
pub mod registry;
pub mod stream;
pub mod task;
pub mod url;

pub use command::{Blocker, Command, Function, Kind, Runner};
pub use dispatch::{Mux, Verbosity, PROG};
pub use env::Environment;
pub use error::{Error, Shared};
pub use parser::{parse, Cmdline, List, Term};
pub use registry::Registry;
pub use stream::{Closers, Input, Io, Output};
pub use task::{Stop, Tasks};
