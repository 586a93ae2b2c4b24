use std::f64::consts::PI;
use tracing::trace;

use crate::audio::AudioFile;
use crate::channel::{BitRes, Channel};
use crate::consts::*;
use crate::error::Result;
use crate::score::{Instrument, Note, Score};

/// Available wave forms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Pulse,
}

impl Waveform {
    /// Look up a wave form by its score name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, Waveform); 4] = [
            ("sine", Waveform::Sine),
            ("triangle", Waveform::Triangle),
            ("sawtooth", Waveform::Sawtooth),
            ("pulsewave", Waveform::Pulse),
        ];

        NAMES
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|&(_, waveform)| waveform)
    }
}

/// Map `time * frequency` into one cycle, `[0, 1)`.
fn cycle_position(value: f64) -> f64 {
    value - libm::floor(value)
}

/// Sine wave generator
fn osc_sin(value: f64) -> f64 {
    libm::sin(value * PI * 2.0)
}

/// Triangle wave generator, rising for the first half of each cycle
fn osc_tri(value: f64) -> f64 {
    let v = cycle_position(value) * 4.0;

    if v < 2.0 {
        v - 1.0
    } else {
        3.0 - v
    }
}

/// Saw wave generator
fn osc_saw(value: f64) -> f64 {
    cycle_position(value) * 2.0 - 1.0
}

/// Pulse wave generator, high for the first `fraction` of each cycle
fn osc_pulse(value: f64, fraction: f64) -> f64 {
    if cycle_position(value) < fraction {
        1.0
    } else {
        -1.0
    }
}

/// A wave form at a fixed amplitude and frequency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub amplitude: f64,
    pub frequency: f64,
    /// Only used by [`Waveform::Pulse`], in `[0, 1]`.
    pub pulse_fraction: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, amplitude: f64, frequency: f64) -> Self {
        Oscillator {
            waveform,
            amplitude,
            frequency,
            pulse_fraction: 0.5,
        }
    }

    pub fn with_pulse_fraction(mut self, pulse_fraction: f64) -> Self {
        self.pulse_fraction = pulse_fraction.max(0.0).min(1.0);
        self
    }

    /// Get a sample from the waveform generator at `time` seconds
    pub fn sample_at(&self, time: f64) -> f64 {
        let t = time * self.frequency;
        let output = match self.waveform {
            Waveform::Sine => osc_sin(t),
            Waveform::Triangle => osc_tri(t),
            Waveform::Sawtooth => osc_saw(t),
            Waveform::Pulse => osc_pulse(t, self.pulse_fraction),
        };

        output * self.amplitude
    }
}

/// Attack, decay, sustain, release envelope over a note of `length` seconds.
///
/// Phases are shortened so that they fit in `length`: the release always
/// keeps its full duration, then the attack, then the decay give way.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,
    length: f64,
}

impl Envelope {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64, length: f64) -> Self {
        let mut attack = attack.max(0.0);
        let mut decay = decay.max(0.0);
        let mut sustain = sustain.max(0.0).min(1.0);
        let release = release.max(0.0);
        let length = length.max(0.0);

        if length < release {
            // Too short to even release
            return Envelope {
                attack: 0.0,
                decay: 0.0,
                sustain: 0.0,
                release: 0.0,
                length: 0.0,
            };
        }

        if length < attack + release {
            attack = length - release;
            decay = 0.0;
            sustain = 1.0;
        } else if length < attack + decay + release {
            decay = length - release - attack;
        }

        Envelope {
            attack,
            decay,
            sustain,
            release,
            length,
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Envelope multiplier at `time` seconds, in `[0, 1]`.
    pub fn sample_at(&self, time: f64) -> f64 {
        let Envelope {
            attack: a,
            decay: d,
            sustain: s,
            release: r,
            length,
        } = *self;

        let value = if time < 0.0 || time >= length {
            0.0
        } else if time < a {
            time / a
        } else if time < a + d {
            1.0 - (1.0 - s) / d * (time - a)
        } else if time < length - r {
            s
        } else {
            s - s / r * (time - (length - r))
        };

        value.max(0.0)
    }
}

/// Get the frequency of pitch class `pitch` (semitones above A) shifted by
/// `octave` octaves, on the 12-TET scale anchored at A = 440 Hz.
pub fn note_frequency(pitch: usize, octave: f64) -> f64 {
    A4_FREQUENCY * libm::pow(2.0, octave) * libm::pow(2.0, pitch as f64 / SEMITONES as f64)
}

/// Number of samples a note of `beats` lasts at `tempo` beats per minute.
///
/// Rounds half away from zero.
pub fn samples_for_beats(sample_rate: u32, tempo: u32, beats: f64) -> usize {
    let beats_per_second = f64::from(tempo) / 60.0;
    libm::round(f64::from(sample_rate) / beats_per_second * beats) as usize
}

/// Renders a parsed [`Score`] into an [`AudioFile`] with one channel per
/// instrument.
#[derive(Clone, Copy, Debug)]
pub struct Synth {
    sample_rate: u32,
    bit_res: BitRes,
    strict: bool,
}

impl Synth {
    pub fn new(sample_rate: u32, bit_res: BitRes, strict: bool) -> Self {
        Synth {
            sample_rate,
            bit_res,
            strict,
        }
    }

    /// Render every instrument, then pad shorter tracks with silence.
    pub fn render(&self, score: &Score, name: &str) -> Result<AudioFile> {
        let mut file = AudioFile::with_bit_res(
            name,
            ABC229_KEYWORD.to_ascii_lowercase(),
            self.sample_rate,
            self.bit_res,
            score.instruments.len(),
            self.strict,
        )?;

        for (i, instrument) in score.instruments.iter().enumerate() {
            trace!(instrument = i, notes = instrument.notes.len(), "rendering");
            for note in &instrument.notes {
                self.render_note(file.channel_mut(i), score.tempo, instrument, note)?;
            }
        }
        file.make_valid();

        Ok(file)
    }

    /// Push the samples for one note.
    fn render_note(
        &self,
        channel: &mut Channel,
        tempo: u32,
        instrument: &Instrument,
        note: &Note,
    ) -> Result<()> {
        let count = samples_for_beats(self.sample_rate, tempo, note.beats);

        if note.is_rest() {
            for _ in 0..count {
                channel.push(0)?;
            }
            return Ok(());
        }

        let frequency = note.frequency(instrument.octave);
        let osc = Oscillator::new(instrument.waveform, self.bit_res.amplitude(), frequency)
            .with_pulse_fraction(instrument.pulse_fraction);
        let env = Envelope::new(
            instrument.attack,
            instrument.decay,
            instrument.sustain,
            instrument.release,
            note.beats * (f64::from(tempo) / 60.0),
        );

        for i in 0..count {
            let time = i as f64 / f64::from(self.sample_rate);
            let sample = instrument.volume * osc.sample_at(time) * env.sample_at(time);
            channel.push(libm::round(sample) as i64)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn waveform_names() {
        assert_eq!(Waveform::from_name("SINE"), Some(Waveform::Sine));
        assert_eq!(Waveform::from_name("PulseWave"), Some(Waveform::Pulse));
        assert_eq!(Waveform::from_name("square"), None);
    }

    #[test]
    fn sine_wave() {
        let osc = Oscillator::new(Waveform::Sine, 10.0, 1.0);

        assert!(approx(osc.sample_at(0.0), 0.0));
        assert!(approx(osc.sample_at(0.25), 10.0));
        assert!(approx(osc.sample_at(0.75), -10.0));
    }

    #[test]
    fn triangle_wave() {
        let osc = Oscillator::new(Waveform::Triangle, 2.0, 2.0);

        assert!(approx(osc.sample_at(0.0), -2.0));
        assert!(approx(osc.sample_at(0.125), 0.0));
        assert!(approx(osc.sample_at(0.25), 2.0));
        assert!(approx(osc.sample_at(0.375), 0.0));
        assert!(approx(osc.sample_at(0.5), -2.0));
    }

    #[test]
    fn sawtooth_wave() {
        let osc = Oscillator::new(Waveform::Sawtooth, 4.0, 1.0);

        assert!(approx(osc.sample_at(0.0), -4.0));
        assert!(approx(osc.sample_at(0.5), 0.0));
        assert!(approx(osc.sample_at(0.75), 2.0));
        assert!(approx(osc.sample_at(1.0), -4.0));
    }

    #[test]
    fn pulse_wave() {
        let osc = Oscillator::new(Waveform::Pulse, 3.0, 1.0).with_pulse_fraction(0.25);

        assert!(approx(osc.sample_at(0.0), 3.0));
        assert!(approx(osc.sample_at(0.2), 3.0));
        assert!(approx(osc.sample_at(0.25), -3.0));
        assert!(approx(osc.sample_at(0.9), -3.0));
    }

    #[test]
    fn envelope_phases() {
        let env = Envelope::new(0.2, 0.2, 0.6, 0.3, 1.0);

        assert!(approx(env.sample_at(0.0), 0.0));
        assert!(approx(env.sample_at(0.1), 0.5));
        assert!(approx(env.sample_at(0.2), 1.0));
        assert!(approx(env.sample_at(0.3), 0.8));
        assert!(approx(env.sample_at(0.5), 0.6));
        assert!(approx(env.sample_at(0.7), 0.6));
        assert!(approx(env.sample_at(0.85), 0.3));
        assert!(approx(env.sample_at(1.0), 0.0));
        assert!(approx(env.sample_at(-0.1), 0.0));
        assert!(approx(env.sample_at(1.5), 0.0));
    }

    #[test]
    fn envelope_shortening() {
        let silent = Envelope::new(0.1, 0.1, 0.5, 2.0, 1.0);
        assert!(approx(silent.sample_at(0.5), 0.0));

        // Attack cut to 0.5, no decay, full level into the release
        let short = Envelope::new(0.8, 0.3, 0.2, 0.5, 1.0);
        assert!(approx(short.sample_at(0.25), 0.5));
        assert!(approx(short.sample_at(0.5), 1.0));
        assert!(approx(short.sample_at(0.75), 0.5));

        // Decay cut to 0.2
        let clipped = Envelope::new(0.2, 0.6, 0.5, 0.6, 1.0);
        assert!(approx(clipped.sample_at(0.3), 0.75));
        assert!(approx(clipped.sample_at(0.4), 0.5));
    }

    #[test]
    fn flat_envelope_by_default() {
        let env = Envelope::new(0.0, 0.0, 1.0, 0.0, 2.0);

        assert!(approx(env.sample_at(0.0), 1.0));
        assert!(approx(env.sample_at(1.999), 1.0));
        assert!(approx(env.sample_at(2.0), 0.0));
    }

    #[test]
    fn frequencies() {
        assert!(approx(note_frequency(0, 0.0), 440.0));
        assert!(approx(note_frequency(0, 1.0), 880.0));
        assert!(approx(note_frequency(0, -2.0), 110.0));
        assert!(approx(note_frequency(4, 1.0), 880.0 * libm::pow(2.0, 4.0 / 12.0)));
    }

    #[test]
    fn note_lengths() {
        assert_eq!(samples_for_beats(8000, 120, 4.0), 16000);
        assert_eq!(samples_for_beats(8000, 120, 2.5), 10000);
        assert_eq!(samples_for_beats(10, 60, 0.25), 3);
        assert_eq!(samples_for_beats(8000, 120, 0.0), 0);
    }
}
