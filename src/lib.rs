//! Read, write, synthesize and combine sampled audio.
//!
//! Three formats are understood: the line-oriented CS229 sample format,
//! canonical PCM WAV, and ABC229 scores, which are synthesized into samples
//! when read.
//!
//! ```
//! use sndkit::{detect, Format, ReadOptions};
//!
//! let text = "CS229\nSampleRate 8000\nChannels 1\nBitRes 8\nStartData\n0\n64\n";
//! let (format, file) = detect(text.as_bytes(), "clip", &ReadOptions::default()).unwrap();
//!
//! assert_eq!(format, Format::Cs229);
//! assert_eq!(file.num_samples(), 2);
//! ```

#![forbid(unsafe_code)]

mod audio;
mod channel;
mod consts;
mod cs229;
mod error;
mod format;
mod score;
mod synth;
mod wav;

#[cfg(feature = "cli")]
pub mod cli;

pub use audio::AudioFile;
pub use channel::{BitRes, Channel};
pub use consts::{DEFAULT_BIT_RES, DEFAULT_SAMPLE_RATE, MAX_CHANNELS};
pub use cs229::{Cs229Reader, Cs229Writer};
pub use error::{Error, ErrorKind, Result};
pub use format::{detect, Format, ReadOptions, Reader, Writer};
pub use score::{Instrument, Note, Score, ScoreReader};
pub use synth::{note_frequency, samples_for_beats, Envelope, Oscillator, Synth, Waveform};
pub use wav::{WavFormat, WavReader, WavWriter};
