use std::time::{Duration, Instant};

use anyhow::Result;
use argh::FromArgs;
use mux::{Command, Io, Kind, Mux};

use super::parse;

#[derive(FromArgs)]
/// periodically log how long the service has been up.
struct Args {
    #[argh(positional)]
    /// seconds between reports; 60 when omitted.
    period: Option<u64>,
}

/// A minimal supervised service. It runs until the stop token trips
/// (SIGTERM under daemon supervision) and is refused direct pipeline
/// invocation like every daemon.
pub struct Uptimed;

impl Command for Uptimed {
    fn name(&self) -> &'static str {
        "uptimed"
    }

    fn usage(&self) -> &'static str {
        "uptimed [PERIOD]"
    }

    fn apropos(&self) -> &'static str {
        "log uptime periodically"
    }

    fn kind(&self) -> Kind {
        Kind::DAEMON
    }

    fn main(&self, mux: &mut Mux, args: &[String], _io: &mut Io) -> Result<()> {
        let args: Args = parse("uptimed", args)?;
        let period = Duration::from_secs(args.period.unwrap_or(60));
        let start = Instant::now();
        log::info!("uptimed: started");
        while !mux.stop.wait(period) {
            log::info!("up {}s", start.elapsed().as_secs());
        }
        log::info!("uptimed: stopped");
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
