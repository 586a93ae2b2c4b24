use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::audio::AudioFile;
use crate::channel::BitRes;
use crate::cs229::{Cs229Reader, Cs229Writer};
use crate::error::{Error, Result};
use crate::score::ScoreReader;
use crate::wav::{WavReader, WavWriter};

/// Something that can build an [`AudioFile`] from a byte stream.
pub trait Reader {
    /// Read a whole file from `reader`. `name` is recorded in the result.
    fn read<R: BufRead>(&self, reader: R, name: &str) -> Result<AudioFile>;

    fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<AudioFile> {
        let path = path.as_ref();
        let file = File::open(path)?;
        self.read(BufReader::new(file), &path.display().to_string())
    }
}

/// Something that can serialize an [`AudioFile`].
pub trait Writer {
    fn write<W: Write>(&self, file: &AudioFile, writer: W) -> Result<()>;

    /// Create (or truncate) `path` and write to it.
    fn write_path<P: AsRef<Path>>(&self, file: &AudioFile, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(file, &mut writer)?;
        writer.flush()?;

        Ok(())
    }
}

/// Supported file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Cs229,
    Wav,
    Abc229,
}

/// Settings shared by every reader.
#[derive(Clone, Copy, Debug)]
pub struct ReadOptions {
    pub strict: bool,
    /// Rate used when synthesizing a score.
    pub sample_rate: u32,
    /// Resolution used when synthesizing a score.
    pub bit_res: BitRes,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            strict: true,
            sample_rate: crate::consts::DEFAULT_SAMPLE_RATE,
            bit_res: BitRes::ThirtyTwo,
        }
    }
}

impl Format {
    /// Order in which [`detect`] tries formats.
    pub const DETECTION_ORDER: [Format; 3] = [Format::Cs229, Format::Wav, Format::Abc229];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Cs229 => "cs229",
            Format::Wav => "wav",
            Format::Abc229 => "abc229",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.');
        Self::DETECTION_ORDER
            .iter()
            .copied()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        Self::from_extension(extension)
    }

    /// The format a converter turns this one into.
    pub fn converted(self) -> Format {
        match self {
            Format::Cs229 | Format::Abc229 => Format::Wav,
            Format::Wav => Format::Cs229,
        }
    }

    pub fn read<R: BufRead>(
        self,
        reader: R,
        name: &str,
        options: &ReadOptions,
    ) -> Result<AudioFile> {
        match self {
            Format::Cs229 => Cs229Reader::new(options.strict).read(reader, name),
            Format::Wav => WavReader::new(options.strict).read(reader, name),
            Format::Abc229 => {
                ScoreReader::new(options.sample_rate, options.bit_res, options.strict)
                    .read(reader, name)
            }
        }
    }

    pub fn write<W: Write>(self, file: &AudioFile, writer: W) -> Result<()> {
        match self {
            Format::Cs229 => Cs229Writer.write(file, writer),
            Format::Wav => WavWriter.write(file, writer),
            Format::Abc229 => Err(Error::config("ABC229 scores cannot be written")),
        }
    }
}

/// Try each format in [`Format::DETECTION_ORDER`] on `bytes` and keep the
/// first that reads. Failures only move on to the next format; if none
/// succeed the last failure is returned.
pub fn detect(bytes: &[u8], name: &str, options: &ReadOptions) -> Result<(Format, AudioFile)> {
    let mut last = Error::format("no formats to try");
    for &format in Format::DETECTION_ORDER.iter() {
        match format.read(bytes, name, options) {
            Ok(file) => {
                debug!(?format, file = name, "detected format");
                return Ok((format, file));
            }
            Err(e) => {
                debug!(?format, file = name, error = %e, "not this format");
                last = e;
            }
        }
    }

    Err(last)
}

/// Line-oriented text input with comments and blank lines removed.
///
/// A comment starts at the first comment character anywhere on a line and
/// runs to the end of it.
pub(crate) struct DataLines<R> {
    lines: std::io::Lines<R>,
    comment: char,
    line: usize,
}

impl<R: BufRead> DataLines<R> {
    pub(crate) fn new(reader: R, comment: char) -> Self {
        DataLines {
            lines: reader.lines(),
            comment,
            line: 0,
        }
    }

    /// The next line holding data, trimmed, with its 1-based line number.
    pub(crate) fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        for line in &mut self.lines {
            let line = line?;
            self.line += 1;

            let data = strip_comment(&line, self.comment).trim();
            if !data.is_empty() {
                return Ok(Some((self.line, data.to_string())));
            }
        }

        Ok(None)
    }
}

fn strip_comment(line: &str, comment: char) -> &str {
    match line.find(comment) {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Check that a line holds exactly the format keyword, ignoring case.
pub(crate) fn check_keyword(line: &str, keyword: &str) -> Result<()> {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some(token) if token.eq_ignore_ascii_case(keyword) => {}
        _ => return Err(Error::format(format!("input is not of type {}", keyword))),
    }
    if let Some(extra) = tokens.next() {
        return Err(Error::grammar(extra));
    }

    Ok(())
}
