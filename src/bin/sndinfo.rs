#![forbid(unsafe_code)]

use clap::Parser;
use sndkit::cli::{self, CommonArgs};
use std::path::PathBuf;
use std::process::ExitCode;

/// Print a summary of a CS229, WAV or ABC229 file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// File to describe; standard input when omitted.
    file: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    cli::init_logging();
    cli::report(sndinfo(Args::parse()))
}

fn sndinfo(args: Args) -> sndkit::Result<()> {
    let (_, file) = cli::read_detected(args.file.as_deref(), &args.common.read_options())?;
    println!("{}", file);

    Ok(())
}
