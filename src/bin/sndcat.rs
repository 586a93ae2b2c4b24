#![forbid(unsafe_code)]

use clap::Parser;
use sndkit::cli::{self, CommonArgs};
use sndkit::Format;
use std::path::PathBuf;
use std::process::ExitCode;

/// Concatenate sound files, one after another.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Files to join in order; standard input when omitted.
    files: Vec<PathBuf>,

    /// Output file; standard output when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write WAV instead of CS229.
    #[arg(short, long)]
    wav: bool,

    /// Silence a channel (0-based) of the result. May be repeated.
    #[arg(short, long)]
    mute: Vec<usize>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    cli::init_logging();
    cli::report(sndcat(Args::parse()))
}

fn sndcat(args: Args) -> sndkit::Result<()> {
    let options = args.common.read_options();

    let mut inputs = args.files.iter().map(|path| {
        cli::read_detected(Some(path.as_path()), &options).map(|(_, file)| file)
    });
    let mut output = match inputs.next() {
        Some(file) => file?,
        None => cli::read_detected(None, &options)?.1,
    };
    for file in inputs {
        output = output.concat(&file?)?;
    }
    output.make_valid();
    cli::mute_channels(&mut output, &args.mute)?;

    let format = if args.wav { Format::Wav } else { Format::Cs229 };
    cli::write_output(&output, format, args.output.as_deref())
}
