use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;
use mux::{Command, Io, Mux};

use super::parse;

#[derive(FromArgs)]
/// pause for a number of seconds.
struct Args {
    #[argh(positional)]
    /// how long to sleep, in whole seconds.
    seconds: u64,
}

pub struct Sleep;

impl Command for Sleep {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn usage(&self) -> &'static str {
        "sleep SECONDS"
    }

    fn apropos(&self) -> &'static str {
        "pause for a while"
    }

    fn main(&self, mux: &mut Mux, args: &[String], _io: &mut Io) -> Result<()> {
        let args: Args = parse("sleep", args)?;
        // wake early on shutdown
        mux.stop.wait(Duration::from_secs(args.seconds));
        Ok(())
    }
}
