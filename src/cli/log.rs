//! Log command implementation.

use clap::Args;

use crate::error::Result;
use crate::logging::{read_log, TAIL_LINES};
use crate::output::display_path;

use super::Context;

/// Show the processing log
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Print the whole log instead of the last lines
    #[arg(short, long)]
    pub full: bool,
}

pub fn run(args: LogArgs, ctx: &Context) -> Result<()> {
    let path = &ctx.manifest.log_file;
    if !path.exists() {
        ctx.printer
            .warning("Missing", &format!("Log file does not exist: {}", display_path(path)));
        return Ok(());
    }

    let count = if args.full { None } else { Some(TAIL_LINES) };
    for line in read_log(path, count)? {
        println!("{}", line);
    }
    Ok(())
}
