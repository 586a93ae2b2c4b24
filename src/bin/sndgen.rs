#![forbid(unsafe_code)]

use clap::Parser;
use sndkit::cli::{self, CommonArgs, SynthArgs};
use sndkit::{Format, Reader, ScoreReader};
use std::path::PathBuf;
use std::process::ExitCode;

/// Synthesize an ABC229 score.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Score to render; standard input when omitted.
    score: Option<PathBuf>,

    /// Output file; standard output when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write CS229 instead of WAV.
    #[arg(long)]
    cs229: bool,

    /// Silence an instrument's channel (0-based). May be repeated.
    #[arg(short, long)]
    mute: Vec<usize>,

    #[command(flatten)]
    synth: SynthArgs,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    cli::init_logging();
    cli::report(sndgen(Args::parse()))
}

fn sndgen(args: Args) -> sndkit::Result<()> {
    let options = args.synth.read_options(&args.common)?;
    let reader = ScoreReader::new(options.sample_rate, options.bit_res, options.strict);
    let (name, bytes) = cli::read_input(args.score.as_deref())?;
    let mut file = reader.read(&bytes[..], &name)?;
    cli::mute_channels(&mut file, &args.mute)?;

    let format = if args.cs229 { Format::Cs229 } else { Format::Wav };
    cli::write_output(&file, format, args.output.as_deref())
}
