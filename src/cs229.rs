use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::audio::AudioFile;
use crate::consts::*;
use crate::error::{Error, Result};
use crate::format::{check_keyword, DataLines, Reader, Writer};

/// Values collected from a CS229 header.
#[derive(Debug, Default)]
struct Header {
    samples: Option<usize>,
    bit_res: Option<u32>,
    sample_rate: Option<u32>,
    channels: Option<usize>,
}

impl Header {
    /// Record one `Key Value` line.
    fn set(&mut self, line: &str) -> Result<()> {
        let mut tokens = line.split_whitespace();
        let key = tokens.next().unwrap_or_default();
        let value = tokens
            .next()
            .ok_or_else(|| Error::header(format!("missing value for `{}`", key)))?;
        if let Some(extra) = tokens.next() {
            return Err(Error::grammar(extra));
        }

        fn store<T: FromStr>(slot: &mut Option<T>, key: &str, value: &str) -> Result<()> {
            if slot.is_some() {
                return Err(Error::header(format!("`{}` is defined twice", key)));
            }
            let value = value.parse().map_err(|_| {
                Error::header(format!("`{}` needs an integer, found `{}`", key, value))
            })?;
            *slot = Some(value);
            Ok(())
        }

        match key.to_ascii_lowercase().as_str() {
            "samples" => store(&mut self.samples, key, value),
            "bitres" => store(&mut self.bit_res, key, value),
            "samplerate" => store(&mut self.sample_rate, key, value),
            "channels" => store(&mut self.channels, key, value),
            _ => Err(Error::header(format!("unrecognized key `{}`", key))),
        }
    }
}

fn missing(key: &str) -> Error {
    Error::header(format!("missing `{}`", key))
}

/// Reads the line-oriented CS229 sample format.
#[derive(Clone, Copy, Debug)]
pub struct Cs229Reader {
    strict: bool,
}

impl Cs229Reader {
    pub fn new(strict: bool) -> Self {
        Cs229Reader { strict }
    }

    /// Push one row of samples, one per channel.
    fn read_row(file: &mut AudioFile, line: &str) -> Result<()> {
        let mut tokens = line.split_whitespace();
        for i in 0..file.num_channels() {
            let token = tokens.next().ok_or_else(|| Error::grammar(line))?;
            let sample = token.parse().map_err(|_| Error::grammar(token))?;
            file[i].push(sample)?;
        }
        if let Some(extra) = tokens.next() {
            return Err(Error::grammar(extra));
        }

        Ok(())
    }
}

impl Default for Cs229Reader {
    fn default() -> Self {
        Cs229Reader::new(true)
    }
}

impl Reader for Cs229Reader {
    fn read<R: BufRead>(&self, reader: R, name: &str) -> Result<AudioFile> {
        let mut lines = DataLines::new(reader, '#');

        let (n, line) = lines
            .next_line()?
            .ok_or_else(|| Error::format("empty input"))?;
        check_keyword(&line, CS229_KEYWORD).map_err(|e| e.at_line(n))?;

        let mut header = Header::default();
        loop {
            let (n, line) = lines
                .next_line()?
                .ok_or_else(|| Error::format("missing `StartData`"))?;
            let first = line.split_whitespace().next().unwrap_or_default();
            if first.eq_ignore_ascii_case("StartData") {
                break;
            }
            header.set(&line).map_err(|e| e.at_line(n))?;
        }
        debug!(?header, file = name, "read CS229 header");

        let mut file = AudioFile::new(
            name,
            CS229_KEYWORD.to_ascii_lowercase(),
            header.sample_rate.ok_or_else(|| missing("SampleRate"))?,
            header.bit_res.ok_or_else(|| missing("BitRes"))?,
            header.channels.ok_or_else(|| missing("Channels"))?,
            self.strict,
        )?;

        while let Some((n, line)) = lines.next_line()? {
            Self::read_row(&mut file, &line).map_err(|e| e.at_line(n))?;
        }

        if let Some(samples) = header.samples {
            if file.num_samples() != samples {
                return Err(Error::header(format!(
                    "`Samples` is {} but {} were read",
                    samples,
                    file.num_samples()
                )));
            }
        }
        if !file.are_channels_valid() {
            warn!(file = name, "padding uneven channels");
            file.make_valid();
        }

        Ok(file)
    }
}

/// Writes the line-oriented CS229 sample format.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cs229Writer;

impl Writer for Cs229Writer {
    fn write<W: Write>(&self, file: &AudioFile, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", CS229_KEYWORD)?;
        writeln!(writer, "Samples {}", file.num_samples())?;
        writeln!(writer, "Channels {}", file.num_channels())?;
        writeln!(writer, "BitRes {}", file.bit_res())?;
        writeln!(writer, "SampleRate {}", file.sample_rate())?;
        writeln!(writer, "StartData")?;

        for i in 0..file.num_samples() {
            let mut separator = "";
            for channel in file.channels() {
                write!(writer, "{}{}", separator, channel.get(i).unwrap_or(0))?;
                separator = " ";
            }
            writeln!(writer)?;
        }
        writer.flush()?;

        Ok(())
    }
}
