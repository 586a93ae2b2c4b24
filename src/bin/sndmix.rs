#![forbid(unsafe_code)]

use clap::Parser;
use sndkit::cli::{self, CommonArgs};
use sndkit::{AudioFile, Error, Format};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

/// Mix sound files, each scaled by a multiplier in [-10, 10].
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Pairs of `<file> <mult>`.
    #[arg(required = true, allow_negative_numbers = true)]
    inputs: Vec<String>,

    /// Output file; standard output when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Silence a channel (0-based) of the result. May be repeated.
    #[arg(short, long)]
    mute: Vec<usize>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    cli::init_logging();
    cli::report(sndmix(Args::parse()))
}

fn sndmix(args: Args) -> sndkit::Result<()> {
    if args.inputs.len() % 2 != 0 {
        return Err(Error::Config(
            "arguments must come in `<file> <mult>` pairs".to_string(),
        ));
    }
    let options = args.common.read_options();

    let mut output: Option<AudioFile> = None;
    for pair in args.inputs.chunks(2) {
        let multiplier = cli::parse_multiplier(&pair[1])?;
        debug!(file = %pair[0], multiplier, "mixing");

        let (_, file) = cli::read_detected(Some(Path::new(&pair[0])), &options)?;
        let scaled = file.scale(multiplier)?;
        output = Some(match output {
            Some(mix) => mix.add(&scaled)?,
            None => scaled,
        });
    }

    let mut output = output.ok_or_else(|| Error::Config("nothing to mix".to_string()))?;
    output.make_valid();
    cli::mute_channels(&mut output, &args.mute)?;

    cli::write_output(&output, Format::Cs229, args.output.as_deref())
}
