//! Plumbing shared by the command-line utilities.

use clap::Args;
use colored::Colorize;
use error_iter::ErrorIter as _;
use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::audio::AudioFile;
use crate::channel::BitRes;
use crate::consts::{DEFAULT_BIT_RES, DEFAULT_SAMPLE_RATE};
use crate::error::{Error, Result};
use crate::format::{detect, Format, ReadOptions};

/// Multipliers accepted by the mixer lie in `-MAX_MULTIPLIER..=MAX_MULTIPLIER`.
pub const MAX_MULTIPLIER: f64 = 10.0;

/// Options accepted by every utility.
#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    /// Allow inputs with mismatched resolutions, lengths or rates.
    #[arg(long, env = "SNDKIT_LENIENT")]
    pub lenient: bool,
}

impl CommonArgs {
    /// Reader settings with the default synthesis rate and resolution.
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            strict: !self.lenient,
            ..ReadOptions::default()
        }
    }
}

/// Options for utilities that synthesize scores.
#[derive(Args, Clone, Debug)]
pub struct SynthArgs {
    /// Sample rate for synthesized audio, in Hz.
    #[arg(long, env = "SNDKIT_SAMPLE_RATE", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Bit resolution for synthesized audio: 8, 16 or 32.
    #[arg(long, env = "SNDKIT_BIT_RES", default_value_t = DEFAULT_BIT_RES)]
    pub bit_res: u32,
}

impl SynthArgs {
    pub fn read_options(&self, common: &CommonArgs) -> Result<ReadOptions> {
        if self.sample_rate == 0 {
            return Err(Error::config("sample rate must be positive"));
        }

        Ok(ReadOptions {
            strict: !common.lenient,
            sample_rate: self.sample_rate,
            bit_res: BitRes::try_from(self.bit_res)?,
        })
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

/// Print `result`'s error chain, if any, and turn it into an exit status.
pub fn report(result: Result<()>) -> ExitCode {
    match result {
        Err(e) => {
            eprintln!("{} {}", "error:".red(), e);

            for cause in e.sources().skip(1) {
                eprintln!("{} {}", "caused by:".bright_red(), cause);
            }

            ExitCode::FAILURE
        }
        Ok(()) => ExitCode::SUCCESS,
    }
}

/// All bytes of `path`, or of stdin when there is none, with a display name.
pub fn read_input(path: Option<&Path>) -> Result<(String, Vec<u8>)> {
    match path {
        Some(path) => Ok((path.display().to_string(), std::fs::read(path)?)),
        None => {
            let mut bytes = Vec::new();
            io::stdin().lock().read_to_end(&mut bytes)?;
            Ok(("stdin".to_string(), bytes))
        }
    }
}

/// Read `path` (or stdin) in the format its extension names. Stdin and
/// unknown extensions go to whichever format accepts the bytes first.
pub fn read_detected(path: Option<&Path>, options: &ReadOptions) -> Result<(Format, AudioFile)> {
    let (name, bytes) = read_input(path)?;
    match path.and_then(Format::from_path) {
        Some(format) => {
            let file = format.read(&bytes[..], &name, options)?;
            Ok((format, file))
        }
        None => detect(&bytes, &name, options),
    }
}

/// Write `file` as `format` to `path`, or to stdout when there is none.
pub fn write_output(file: &AudioFile, format: Format, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => format.write(file, BufWriter::new(File::create(path)?)),
        None => format.write(file, io::stdout().lock()),
    }
}

pub fn mute_channels(file: &mut AudioFile, channels: &[usize]) -> Result<()> {
    for &channel in channels {
        file.mute_channel(channel)?;
    }

    Ok(())
}

/// Parse a mixer multiplier, rejecting anything outside the allowed range.
pub fn parse_multiplier(text: &str) -> Result<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("`{}` is not a number", text)))?;
    if !(-MAX_MULTIPLIER..=MAX_MULTIPLIER).contains(&value) {
        return Err(Error::config(format!(
            "multiplier {} is outside [-{}, {}]",
            value, MAX_MULTIPLIER, MAX_MULTIPLIER
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::Reader;
    use crate::score::ScoreReader;
    use crate::wav::WavReader;

    #[test]
    fn multipliers() {
        assert_eq!(parse_multiplier("2.5").unwrap(), 2.5);
        assert_eq!(parse_multiplier("-10").unwrap(), -10.0);
        assert_eq!(parse_multiplier("10.5").unwrap_err().kind(), ErrorKind::Config);
        assert_eq!(parse_multiplier("NaN").unwrap_err().kind(), ErrorKind::Config);
        assert_eq!(parse_multiplier("x").unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn synth_options() {
        let common = CommonArgs { lenient: true };
        let synth = SynthArgs {
            sample_rate: 8000,
            bit_res: 16,
        };
        let options = synth.read_options(&common).unwrap();

        assert!(!options.strict);
        assert_eq!(options.sample_rate, 8000);
        assert_eq!(options.bit_res, BitRes::Sixteen);

        let synth = SynthArgs {
            sample_rate: 8000,
            bit_res: 12,
        };
        assert_eq!(synth.read_options(&common).unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn detect_from_path_and_write_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.cs229");
        let output = dir.path().join("out.wav");

        let text = "CS229\nSampleRate 100\nChannels 2\nBitRes 16\nStartData\n1 2\n3 4\n";
        std::fs::write(&input, text).unwrap();

        let options = ReadOptions::default();
        let (format, mut audio) = read_detected(Some(input.as_path()), &options).unwrap();
        assert_eq!(format, Format::Cs229);
        assert_eq!(audio.name(), input.display().to_string());

        mute_channels(&mut audio, &[1]).unwrap();
        assert_eq!(mute_channels(&mut audio, &[2]).unwrap_err().kind(), ErrorKind::Config);

        write_output(&audio, format.converted(), Some(output.as_path())).unwrap();
        let copy = WavReader::default().read_path(&output).unwrap();
        assert_eq!(copy[0].samples(), &[1, 3]);
        assert_eq!(copy[1].samples(), &[0, 0]);
    }

    #[test]
    fn extension_picks_the_reader() {
        let dir = tempfile::tempdir().unwrap();
        let text = "CS229\nSampleRate 8\nChannels 1\nBitRes 8\nStartData\n1\n2\n500\n";

        let named = dir.path().join("bad.cs229");
        std::fs::write(&named, text).unwrap();
        let err = read_detected(Some(named.as_path()), &ReadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(err.line(), Some(8));

        let good = dir.path().join("clip.snd");
        std::fs::write(&good, "CS229\nSampleRate 8\nChannels 1\nBitRes 8\nStartData\n1\n").unwrap();
        let (format, file) = read_detected(Some(good.as_path()), &ReadOptions::default()).unwrap();
        assert_eq!(format, Format::Cs229);
        assert_eq!(file[0].samples(), &[1]);
    }

    #[test]
    fn render_score_and_mute_instrument() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duet.txt");
        let score = "ABC229\nTempo 60\n\
                     Instrument 0\nWaveform Sine\nScore\n[\nA\n]\n\
                     Instrument 1\nWaveform Sawtooth\nScore\n[\nC\n]\n";
        std::fs::write(&path, score).unwrap();

        let (name, bytes) = read_input(Some(path.as_path())).unwrap();
        let mut file = ScoreReader::new(100, BitRes::Sixteen, true)
            .read(&bytes[..], &name)
            .unwrap();
        mute_channels(&mut file, &[0]).unwrap();

        assert_eq!(file.num_samples(), 100);
        assert!(file[0].samples().iter().all(|&s| s == 0));
        assert!(file[1].samples().iter().any(|&s| s != 0));
        assert_eq!(mute_channels(&mut file, &[2]).unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(Some(dir.path().join("nope").as_path())).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
