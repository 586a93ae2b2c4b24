use std::io::BufRead;
use std::str::FromStr;
use tracing::debug;

use crate::audio::AudioFile;
use crate::channel::BitRes;
use crate::consts::*;
use crate::error::{Error, Result};
use crate::format::{check_keyword, DataLines, Reader};
use crate::synth::{note_frequency, Synth, Waveform};

/// A parsed ABC229 score: a tempo and the instruments that play at it.
#[derive(Clone, Debug, PartialEq)]
pub struct Score {
    /// Beats per minute.
    pub tempo: u32,
    pub instruments: Vec<Instrument>,
}

/// One instrument track and the header that shapes its notes.
#[derive(Clone, Debug, PartialEq)]
pub struct Instrument {
    pub waveform: Waveform,
    pub volume: f64,
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
    pub pulse_fraction: f64,
    /// Octave shift applied on top of each note's own.
    pub octave: f64,
    pub notes: Vec<Note>,
}

/// A single note token, e.g. `C#'2.5` or `Z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Note {
    /// Semitones above A, `None` for a rest.
    pub pitch: Option<usize>,
    /// `'` marks minus `,` marks.
    pub octave_shift: i32,
    /// Duration in beats.
    pub beats: f64,
}

impl Note {
    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }

    /// Frequency in Hz with the instrument-level `octave` applied, 0 for a rest.
    pub fn frequency(&self, octave: f64) -> f64 {
        match self.pitch {
            Some(pitch) => note_frequency(pitch, f64::from(self.octave_shift) + octave),
            None => 0.0,
        }
    }
}

impl FromStr for Note {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        let invalid = || Error::grammar(token);
        let mut chars = token.chars().peekable();

        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        let mut pitch = match letter {
            'A' => Some(0),
            'B' => Some(2),
            'C' => Some(3),
            'D' => Some(5),
            'E' => Some(7),
            'F' => Some(8),
            'G' => Some(10),
            'Z' => None,
            _ => return Err(invalid()),
        };

        if chars.peek() == Some(&'#') {
            chars.next();
            pitch = match (letter, pitch) {
                ('B', _) | ('E', _) | (_, None) => return Err(invalid()),
                (_, Some(pitch)) => Some(pitch + 1),
            };
        }

        let (mut up, mut down) = (0, 0);
        while let Some(&c) = chars.peek() {
            match c {
                '\'' => up += 1,
                ',' => down += 1,
                _ => break,
            }
            chars.next();
        }
        if (up > 0 && down > 0)
            || up > MAX_OCTAVE_SHIFT
            || down > MAX_OCTAVE_SHIFT
            || (pitch.is_none() && up + down > 0)
        {
            return Err(invalid());
        }

        let length: String = chars.collect();
        let beats = if length.is_empty() {
            1.0
        } else {
            let numeric = length.chars().all(|c| c.is_ascii_digit() || c == '.');
            if !numeric || length.matches('.').count() > 1 {
                return Err(invalid());
            }
            length.parse::<f64>().map_err(|_| invalid())?
        };

        Ok(Note {
            pitch,
            octave_shift: up as i32 - down as i32,
            beats,
        })
    }
}

/// Split a `Key Value` line. Anything after the value is an error.
fn key_value(line: &str) -> Result<(&str, Option<&str>)> {
    let mut tokens = line.split_whitespace();
    let key = tokens.next().unwrap_or_default();
    let value = tokens.next();
    if let Some(extra) = tokens.next() {
        return Err(Error::grammar(extra));
    }

    Ok((key, value))
}

fn integer_value<T: FromStr>(key: &str, value: Option<&str>) -> Result<T> {
    let value = value.ok_or_else(|| Error::header(format!("missing value for `{}`", key)))?;
    value
        .parse()
        .map_err(|_| Error::header(format!("`{}` needs an integer, found `{}`", key, value)))
}

fn real_value(key: &str, value: Option<&str>) -> Result<f64> {
    let value = value.ok_or_else(|| Error::header(format!("missing value for `{}`", key)))?;
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(Error::header(format!(
            "`{}` needs a number, found `{}`",
            key, value
        ))),
    }
}

/// Instrument header values as they are collected, before defaults apply.
#[derive(Debug, Default)]
struct InstrumentHeader {
    waveform: Option<Waveform>,
    volume: Option<f64>,
    attack: Option<f64>,
    decay: Option<f64>,
    sustain: Option<f64>,
    release: Option<f64>,
    pulse_fraction: Option<f64>,
    octave: Option<f64>,
}

impl InstrumentHeader {
    fn set(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        fn store<T>(slot: &mut Option<T>, key: &str, value: T) -> Result<()> {
            if slot.is_some() {
                return Err(Error::header(format!("`{}` is defined twice", key)));
            }
            *slot = Some(value);
            Ok(())
        }

        match key.to_ascii_lowercase().as_str() {
            "waveform" => {
                let name = value.ok_or_else(|| Error::header("missing value for `Waveform`"))?;
                let waveform = Waveform::from_name(name)
                    .ok_or_else(|| Error::header(format!("unknown waveform `{}`", name)))?;
                store(&mut self.waveform, key, waveform)
            }
            "volume" => store(&mut self.volume, key, real_value(key, value)?),
            "attack" => store(&mut self.attack, key, real_value(key, value)?),
            "decay" => store(&mut self.decay, key, real_value(key, value)?),
            "sustain" => store(&mut self.sustain, key, real_value(key, value)?),
            "release" => store(&mut self.release, key, real_value(key, value)?),
            "pulsefrac" => {
                let fraction = real_value(key, value)?;
                if !(0.0..=1.0).contains(&fraction) {
                    return Err(Error::header(format!(
                        "`PulseFrac` must lie in [0, 1], not {}",
                        fraction
                    )));
                }
                store(&mut self.pulse_fraction, key, fraction)
            }
            "octave" => store(&mut self.octave, key, real_value(key, value)?),
            _ => Err(Error::header(format!("unrecognized key `{}`", key))),
        }
    }

    fn finish(self) -> Result<Instrument> {
        let waveform = self
            .waveform
            .ok_or_else(|| Error::header("instrument has no `Waveform`"))?;

        Ok(Instrument {
            waveform,
            volume: self.volume.unwrap_or(1.0),
            attack: self.attack.unwrap_or(0.0),
            decay: self.decay.unwrap_or(0.0),
            sustain: self.sustain.unwrap_or(1.0),
            release: self.release.unwrap_or(0.0),
            pulse_fraction: self.pulse_fraction.unwrap_or(0.5),
            octave: self.octave.unwrap_or(0.0),
            notes: Vec::new(),
        })
    }
}

impl Score {
    /// Parse a score from text.
    pub fn parse<R: BufRead>(reader: R) -> Result<Score> {
        let mut lines = DataLines::new(reader, '%');

        let (n, line) = lines
            .next_line()?
            .ok_or_else(|| Error::format("empty input"))?;
        check_keyword(&line, ABC229_KEYWORD).map_err(|e| e.at_line(n))?;

        let (n, line) = lines
            .next_line()?
            .ok_or_else(|| Error::format("missing `Tempo`"))?;
        let tempo = Self::parse_tempo(&line).map_err(|e| e.at_line(n))?;

        let mut instruments = Vec::new();
        while let Some((n, line)) = lines.next_line()? {
            Self::parse_instrument_number(&line, instruments.len()).map_err(|e| e.at_line(n))?;
            instruments.push(Self::parse_instrument(&mut lines)?);
        }

        if instruments.is_empty() {
            return Err(Error::format("score has no instruments"));
        }
        debug!(tempo, instruments = instruments.len(), "parsed score");

        Ok(Score { tempo, instruments })
    }

    fn parse_tempo(line: &str) -> Result<u32> {
        let (key, value) = key_value(line)?;
        if !key.eq_ignore_ascii_case("Tempo") {
            return Err(Error::header(format!("expected `Tempo`, found `{}`", key)));
        }

        let tempo: u32 = integer_value(key, value)?;
        if tempo == 0 {
            return Err(Error::header("`Tempo` must be positive"));
        }

        Ok(tempo)
    }

    fn parse_instrument_number(line: &str, expected: usize) -> Result<()> {
        let (key, value) = key_value(line)?;
        if !key.eq_ignore_ascii_case("Instrument") {
            return Err(Error::format(format!(
                "expected `Instrument`, found `{}`",
                key
            )));
        }

        let found: i64 = integer_value(key, value)?;
        if found != expected as i64 {
            return Err(Error::Order { expected, found });
        }

        Ok(())
    }

    /// Everything after `Instrument n`: header keys, `Score`, and the note block.
    fn parse_instrument<R: BufRead>(lines: &mut DataLines<R>) -> Result<Instrument> {
        let unexpected_end = || Error::format("unexpected end of file inside an instrument");

        let mut header = InstrumentHeader::default();
        let mut instrument = loop {
            let (n, line) = lines.next_line()?.ok_or_else(unexpected_end)?;
            let (key, value) = key_value(&line).map_err(|e| e.at_line(n))?;

            if key.eq_ignore_ascii_case("Score") {
                if let Some(extra) = value {
                    return Err(Error::grammar(extra).at_line(n));
                }
                break header.finish().map_err(|e| e.at_line(n))?;
            }
            header.set(key, value).map_err(|e| e.at_line(n))?;
        };

        let (n, line) = lines.next_line()?.ok_or_else(unexpected_end)?;
        if line != "[" {
            return Err(Error::format("expected `[` after `Score`").at_line(n));
        }

        loop {
            let (n, line) = lines.next_line()?.ok_or_else(unexpected_end)?;
            if line == "]" {
                return Ok(instrument);
            }

            for token in line.split_whitespace() {
                let note = token.parse().map_err(|e: Error| e.at_line(n))?;
                instrument.notes.push(note);
            }
        }
    }
}

/// Reads ABC229 scores, synthesizing one channel per instrument.
#[derive(Clone, Copy, Debug)]
pub struct ScoreReader {
    synth: Synth,
}

impl ScoreReader {
    pub fn new(sample_rate: u32, bit_res: BitRes, strict: bool) -> Self {
        ScoreReader {
            synth: Synth::new(sample_rate, bit_res, strict),
        }
    }
}

impl Default for ScoreReader {
    fn default() -> Self {
        ScoreReader::new(DEFAULT_SAMPLE_RATE, BitRes::ThirtyTwo, true)
    }
}

impl Reader for ScoreReader {
    fn read<R: BufRead>(&self, reader: R, name: &str) -> Result<AudioFile> {
        let score = Score::parse(reader)?;
        self.synth.render(&score, name)
    }
}
