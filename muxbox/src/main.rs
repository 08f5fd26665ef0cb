//! muxbox: one binary, many commands.
//!
//! The binary wires its command set into a dispatcher and hands over the
//! process argv. Subcommands either run in-process or re-exec this same
//! binary under a different leading argument, so a single installed file
//! serves the whole toolbox.

use std::sync::Arc;

use mux::Mux;

mod cmds;

const LICENSE: &str = "\
Distributed under the MIT license; see the LICENSE file in the source
distribution for the full text.";

fn new_mux() -> Mux {
    let mut mux = Mux::new("muxbox");
    mux.usage = "muxbox [-debug] [COMMAND [ARG]...]";
    mux.apropos = "one binary, many commands";
    mux.license = LICENSE;
    mux.registry.register_all(cmds::all());
    mux.registry.register(Arc::new(mux::cli::Cli));
    mux
}

fn main() {
    env_logger::init();
    let mut mux = new_mux();
    let args: Vec<String> = std::env::args().collect();
    if let Err(err) = mux.main(args) {
        if !mux::Error::is_silent(&err) {
            eprintln!("{err:#}");
        }
    }
    mux.drain();
    std::process::exit(mux.exit_code());
}
