/// First keyword of a line sample file.
pub(crate) const CS229_KEYWORD: &str = "CS229";
/// First keyword of a score file.
pub(crate) const ABC229_KEYWORD: &str = "ABC229";

/// Channel count must stay below this.
pub const MAX_CHANNELS: usize = 128;

/// Default rate for synthesized scores, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;
/// Default resolution for synthesized scores, in bits.
pub const DEFAULT_BIT_RES: u32 = 32;

/// Reference pitch for note index 0 (A).
pub(crate) const A4_FREQUENCY: f64 = 440.0;
pub(crate) const SEMITONES: usize = 12;

/// Note octaves can shift at most this far in one direction.
pub(crate) const MAX_OCTAVE_SHIFT: usize = 2;

pub(crate) const RIFF_MAGIC: &[u8; 4] = b"RIFF";
pub(crate) const WAVE_MAGIC: &[u8; 4] = b"WAVE";
pub(crate) const FMT_MAGIC: &[u8; 4] = b"fmt ";
pub(crate) const DATA_MAGIC: &[u8; 4] = b"data";
pub(crate) const FMT_CHUNK_LENGTH: u32 = 16;
pub(crate) const PCM_FORMAT: u16 = 1;
/// `WAVE` + fmt chunk (header and body) + data chunk header.
pub(crate) const RIFF_OVERHEAD: u32 = 4 + 24 + 8;
/// Unsigned 8-bit PCM is stored offset by this much.
pub(crate) const PCM8_OFFSET: i64 = 127;
