//! RIFF/WAVE PCM reader and writer.
//!
//! Only the canonical layout is understood: a `RIFF` header, a 16-byte
//! `fmt ` chunk describing uncompressed PCM, then a single `data` chunk of
//! interleaved little-endian samples. 8-bit samples are unsigned on disk and
//! offset by 127 in memory.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{BufRead, Read, Write};
use tracing::{debug, warn};

use crate::audio::AudioFile;
use crate::channel::BitRes;
use crate::consts::*;
use crate::error::{Error, Result};
use crate::format::{Format, Reader, Writer};

/// Fields of the `fmt ` chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// The format chunk describing `file`.
    pub fn of(file: &AudioFile) -> Result<Self> {
        let channels = u16::try_from(file.num_channels())
            .map_err(|_| Error::config("too many channels for WAV"))?;
        let bits_per_sample = file.bit_res().bits() as u16;
        let block_align = channels * (bits_per_sample / 8);
        let byte_rate = file
            .sample_rate()
            .checked_mul(u32::from(block_align))
            .ok_or_else(|| Error::config("sample rate too high for WAV"))?;

        Ok(WavFormat {
            channels,
            sample_rate: file.sample_rate(),
            byte_rate,
            block_align,
            bits_per_sample,
        })
    }
}

fn expect_magic<R: Read>(reader: &mut R, magic: &[u8; 4]) -> Result<()> {
    let mut found = [0; 4];
    reader.read_exact(&mut found)?;
    if &found != magic {
        return Err(Error::format(format!(
            "expected `{}` chunk, found {:?}",
            String::from_utf8_lossy(magic),
            String::from_utf8_lossy(&found)
        )));
    }

    Ok(())
}

fn read_sample<R: Read>(reader: &mut R, bit_res: BitRes) -> Result<i64> {
    Ok(match bit_res {
        BitRes::Eight => i64::from(reader.read_u8()?) - PCM8_OFFSET,
        BitRes::Sixteen => i64::from(reader.read_i16::<LittleEndian>()?),
        BitRes::ThirtyTwo => i64::from(reader.read_i32::<LittleEndian>()?),
    })
}

fn write_sample<W: Write>(writer: &mut W, sample: i64, bit_res: BitRes) -> Result<()> {
    let overflow = || Error::Overflow {
        value: sample,
        bit_res,
    };

    match bit_res {
        BitRes::Eight => {
            let value = u8::try_from(sample + PCM8_OFFSET).map_err(|_| overflow())?;
            writer.write_u8(value)?;
        }
        BitRes::Sixteen => {
            let value = i16::try_from(sample).map_err(|_| overflow())?;
            writer.write_i16::<LittleEndian>(value)?;
        }
        BitRes::ThirtyTwo => {
            let value = i32::try_from(sample).map_err(|_| overflow())?;
            writer.write_i32::<LittleEndian>(value)?;
        }
    }

    Ok(())
}

/// Reads PCM WAV files.
#[derive(Clone, Copy, Debug)]
pub struct WavReader {
    strict: bool,
}

impl WavReader {
    pub fn new(strict: bool) -> Self {
        WavReader { strict }
    }

    fn read_format<R: Read>(reader: &mut R) -> Result<WavFormat> {
        expect_magic(reader, FMT_MAGIC)?;
        let length = reader.read_u32::<LittleEndian>()?;
        if length != FMT_CHUNK_LENGTH {
            return Err(Error::format(format!(
                "`fmt ` chunk must be {} bytes, not {}",
                FMT_CHUNK_LENGTH, length
            )));
        }
        let audio_format = reader.read_u16::<LittleEndian>()?;
        if audio_format != PCM_FORMAT {
            return Err(Error::format(format!(
                "audio format {} is not PCM",
                audio_format
            )));
        }

        Ok(WavFormat {
            channels: reader.read_u16::<LittleEndian>()?,
            sample_rate: reader.read_u32::<LittleEndian>()?,
            byte_rate: reader.read_u32::<LittleEndian>()?,
            block_align: reader.read_u16::<LittleEndian>()?,
            bits_per_sample: reader.read_u16::<LittleEndian>()?,
        })
    }
}

impl Default for WavReader {
    fn default() -> Self {
        WavReader::new(true)
    }
}

impl Reader for WavReader {
    fn read<R: BufRead>(&self, mut reader: R, name: &str) -> Result<AudioFile> {
        expect_magic(&mut reader, RIFF_MAGIC)?;
        let riff_length = reader.read_u32::<LittleEndian>()?;
        if riff_length < RIFF_OVERHEAD {
            return Err(Error::format(format!(
                "RIFF length {} is shorter than its own header",
                riff_length
            )));
        }
        expect_magic(&mut reader, WAVE_MAGIC)?;

        let format = Self::read_format(&mut reader)?;
        debug!(?format, riff_length, file = name, "read WAV header");

        let bit_res = BitRes::try_from(u32::from(format.bits_per_sample)).map_err(|_| {
            Error::format(format!(
                "unsupported bit depth {}",
                format.bits_per_sample
            ))
        })?;
        let mut file = AudioFile::with_bit_res(
            name,
            Format::Wav.extension(),
            format.sample_rate,
            bit_res,
            usize::from(format.channels),
            self.strict,
        )?;

        expect_magic(&mut reader, DATA_MAGIC)?;
        let data_length = reader.read_u32::<LittleEndian>()? as usize;
        let count = data_length / bit_res.bytes();
        let channels = file.num_channels();
        for i in 0..count {
            let sample = read_sample(&mut reader, bit_res)?;
            file[i % channels].push(sample)?;
        }

        if !file.are_channels_valid() {
            warn!(file = name, "data chunk ends mid-frame, padding");
            file.make_valid();
        }

        Ok(file)
    }
}

/// Writes PCM WAV files.
#[derive(Clone, Copy, Debug, Default)]
pub struct WavWriter;

impl Writer for WavWriter {
    fn write<W: Write>(&self, file: &AudioFile, mut writer: W) -> Result<()> {
        let format = WavFormat::of(file)?;
        let data_length = file
            .num_samples()
            .checked_mul(usize::from(format.block_align))
            .and_then(|length| u32::try_from(length).ok())
            .filter(|length| length.checked_add(RIFF_OVERHEAD).is_some())
            .ok_or_else(|| Error::config("too much audio for one WAV file"))?;

        writer.write_all(RIFF_MAGIC)?;
        writer.write_u32::<LittleEndian>(RIFF_OVERHEAD + data_length)?;
        writer.write_all(WAVE_MAGIC)?;

        writer.write_all(FMT_MAGIC)?;
        writer.write_u32::<LittleEndian>(FMT_CHUNK_LENGTH)?;
        writer.write_u16::<LittleEndian>(PCM_FORMAT)?;
        writer.write_u16::<LittleEndian>(format.channels)?;
        writer.write_u32::<LittleEndian>(format.sample_rate)?;
        writer.write_u32::<LittleEndian>(format.byte_rate)?;
        writer.write_u16::<LittleEndian>(format.block_align)?;
        writer.write_u16::<LittleEndian>(format.bits_per_sample)?;

        writer.write_all(DATA_MAGIC)?;
        writer.write_u32::<LittleEndian>(data_length)?;
        let bit_res = file.bit_res();
        for i in 0..file.num_samples() {
            for channel in file.channels() {
                write_sample(&mut writer, channel.get(i).unwrap_or(0), bit_res)?;
            }
        }
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn file(bit_res: u32, channels: &[&[i64]]) -> AudioFile {
        let mut file =
            AudioFile::new("test", "cs229", 22050, bit_res, channels.len(), true).unwrap();
        for (i, samples) in channels.iter().enumerate() {
            for &sample in samples.iter() {
                file[i].push(sample).unwrap();
            }
        }
        file
    }

    fn to_bytes(file: &AudioFile) -> Vec<u8> {
        let mut bytes = Vec::new();
        WavWriter.write(file, &mut bytes).unwrap();
        bytes
    }

    fn round_trip(original: &AudioFile) {
        let bytes = to_bytes(original);
        let copy = WavReader::default().read(&bytes[..], "copy").unwrap();

        assert_eq!(copy.sample_rate(), original.sample_rate());
        assert_eq!(copy.bit_res(), original.bit_res());
        assert_eq!(copy.num_channels(), original.num_channels());
        for i in 0..original.num_channels() {
            assert_eq!(copy[i].samples(), original[i].samples());
        }
    }

    #[test]
    fn header_layout() {
        let bytes = to_bytes(&file(16, &[&[1, -1], &[2, -2]]));

        assert_eq!(bytes.len(), 44 + 8);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[4..8], &(36_u32 + 8).to_le_bytes());
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(&bytes[16..20], &16_u32.to_le_bytes());
        assert_eq!(&bytes[20..22], &1_u16.to_le_bytes());
        assert_eq!(&bytes[22..24], &2_u16.to_le_bytes());
        assert_eq!(&bytes[24..28], &22050_u32.to_le_bytes());
        assert_eq!(&bytes[28..32], &(22050_u32 * 4).to_le_bytes());
        assert_eq!(&bytes[32..34], &4_u16.to_le_bytes());
        assert_eq!(&bytes[34..36], &16_u16.to_le_bytes());
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(&bytes[40..44], &8_u32.to_le_bytes());
        assert_eq!(&bytes[44..], &[1, 0, 2, 0, 0xff, 0xff, 0xfe, 0xff]);
    }

    #[test]
    fn eight_bit_offset() {
        let bytes = to_bytes(&file(8, &[&[-127, 0, 128]]));
        assert_eq!(&bytes[44..], &[0, 127, 255]);

        round_trip(&file(8, &[&[-127, 0, 128], &[5, -5, 100]]));
    }

    #[test]
    fn wide_round_trips() {
        round_trip(&file(16, &[&[-32767, 0, 32767], &[1, 2, 3]]));
        round_trip(&file(32, &[&[-2147483647, 0, 2147483647]]));
    }

    #[test]
    fn positive_extreme_does_not_fit() {
        let mut bytes = Vec::new();
        let err = WavWriter.write(&file(16, &[&[32768]]), &mut bytes).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn bad_headers() {
        let good = to_bytes(&file(16, &[&[1, 2]]));
        let read = |bytes: &[u8]| WavReader::default().read(bytes, "bad").unwrap_err().kind();

        let mut riff = good.clone();
        riff[0] = b'X';
        assert_eq!(read(&riff), ErrorKind::Format);

        let mut riff_length = good.clone();
        riff_length[4..8].copy_from_slice(&35_u32.to_le_bytes());
        assert_eq!(read(&riff_length), ErrorKind::Format);
        riff_length[4..8].copy_from_slice(&36_u32.to_le_bytes());
        assert!(WavReader::default().read(&riff_length[..], "exact").is_ok());

        let mut fmt_length = good.clone();
        fmt_length[16] = 18;
        assert_eq!(read(&fmt_length), ErrorKind::Format);

        let mut float = good.clone();
        float[20] = 3;
        assert_eq!(read(&float), ErrorKind::Format);

        let mut depth = good.clone();
        depth[34] = 24;
        assert_eq!(read(&depth), ErrorKind::Format);

        let mut list = good.clone();
        list[36..40].copy_from_slice(b"LIST");
        assert_eq!(read(&list), ErrorKind::Format);

        assert_eq!(read(&good[..good.len() - 1]), ErrorKind::Io);
        assert_eq!(read(b"RIF"), ErrorKind::Io);
        assert_eq!(read(b"CS229\n"), ErrorKind::Format);
    }

    #[test]
    fn partial_frame_is_padded() {
        let mut bytes = to_bytes(&file(16, &[&[1, 3], &[2, 4]]));
        bytes[40] = 6;
        bytes.truncate(44 + 6);

        let copy = WavReader::default().read(&bytes[..], "odd").unwrap();
        assert_eq!(copy[0].samples(), &[1, 3]);
        assert_eq!(copy[1].samples(), &[2, 0]);
    }
}
