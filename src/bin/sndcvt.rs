#![forbid(unsafe_code)]

use clap::Parser;
use sndkit::cli::{self, CommonArgs};
use sndkit::Format;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

/// Convert between formats: cs229 -> wav, wav -> cs229, abc229 -> wav.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// File to convert; standard input when omitted.
    file: Option<PathBuf>,

    /// Output file; standard output when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    cli::init_logging();
    cli::report(sndcvt(Args::parse()))
}

fn sndcvt(args: Args) -> sndkit::Result<()> {
    let options = args.common.read_options();
    let (format, file) = cli::read_detected(args.file.as_deref(), &options)?;
    if format == Format::Abc229 {
        warn!(
            "input is a score, synthesized at {} Hz and {} bits",
            options.sample_rate, options.bit_res
        );
    }

    cli::write_output(&file, format.converted(), args.output.as_deref())
}
