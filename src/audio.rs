use arrayvec::ArrayVec;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::channel::{BitRes, Channel};
use crate::consts::MAX_CHANNELS;
use crate::error::{Error, Result};

/// Audio data independent of file format: a fixed set of [`Channel`]s that
/// share a sample rate and a bit resolution.
///
/// Combining two files (`concat`, `add`, `multiply`, `scale`) always builds a
/// new `AudioFile`; only `mute_channel` and direct channel access mutate.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioFile {
    name: String,
    extension: String,
    sample_rate: u32,
    bit_res: BitRes,
    strict: bool,
    channels: ArrayVec<Channel, MAX_CHANNELS>,
}

impl AudioFile {
    /// Create a file with `num_channels` empty channels.
    ///
    /// `num_channels` must lie in `1..128` and `bit_res` must be 8, 16 or 32.
    pub fn new(
        name: impl Into<String>,
        extension: impl Into<String>,
        sample_rate: u32,
        bit_res: u32,
        num_channels: usize,
        strict: bool,
    ) -> Result<Self> {
        let bit_res = BitRes::try_from(bit_res)?;
        Self::with_bit_res(name, extension, sample_rate, bit_res, num_channels, strict)
    }

    pub(crate) fn with_bit_res(
        name: impl Into<String>,
        extension: impl Into<String>,
        sample_rate: u32,
        bit_res: BitRes,
        num_channels: usize,
        strict: bool,
    ) -> Result<Self> {
        if num_channels < 1 || num_channels >= MAX_CHANNELS {
            return Err(Error::config(format!(
                "channel count must lie in 1..{}, not {}",
                MAX_CHANNELS, num_channels
            )));
        }

        let mut channels = ArrayVec::new();
        for _ in 0..num_channels {
            channels.push(Channel::new(bit_res, strict));
        }

        Ok(AudioFile {
            name: name.into(),
            extension: extension.into(),
            sample_rate,
            bit_res,
            strict,
            channels,
        })
    }

    /// An empty file shaped like `self`, with a channel count of its own.
    fn shaped(&self, bit_res: BitRes, num_channels: usize, strict: bool) -> Result<Self> {
        Self::with_bit_res(
            self.name.clone(),
            self.extension.clone(),
            self.sample_rate,
            bit_res,
            num_channels,
            strict,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bit_res(&self) -> BitRes {
        self.bit_res
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel, taken from the first channel.
    pub fn num_samples(&self) -> usize {
        self.channels[0].len()
    }

    /// `sample_rate * num_channels * bit_res`.
    pub fn byte_rate(&self) -> u64 {
        u64::from(self.sample_rate) * self.num_channels() as u64 * u64::from(self.bit_res.bits())
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / f64::from(self.sample_rate)
    }

    pub fn channel(&self, index: usize) -> &Channel {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut Channel {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// True when every channel holds the same number of samples.
    pub fn are_channels_valid(&self) -> bool {
        let len = self.num_samples();
        self.channels.iter().all(|channel| channel.len() == len)
    }

    /// Pad shorter channels with silence until all lengths match.
    pub fn make_valid(&mut self) {
        if self.are_channels_valid() {
            return;
        }

        let len = self.channels.iter().map(Channel::len).max().unwrap_or(0);
        for channel in self.channels.iter_mut() {
            channel.pad_to(len);
        }
    }

    /// Silence one channel in place.
    pub fn mute_channel(&mut self, index: usize) -> Result<()> {
        let num_channels = self.num_channels();
        let channel = self.channels.get_mut(index).ok_or_else(|| {
            Error::config(format!(
                "cannot mute channel {} of a {}-channel file",
                index, num_channels
            ))
        })?;
        channel.silence();

        Ok(())
    }

    /// Pair up channels by index. Channels missing from the narrower file are
    /// stood in for by empty lenient ones.
    fn pair_channels<F>(
        &self,
        other: &AudioFile,
        bit_res: BitRes,
        strict: bool,
        op: F,
    ) -> Result<Self>
    where
        F: Fn(&Channel, &Channel) -> Result<Channel>,
    {
        let num_channels = self.num_channels().max(other.num_channels());
        let mut result = self.shaped(bit_res, num_channels, strict)?;
        let empty = Channel::new(bit_res, false);

        for (i, slot) in result.channels.iter_mut().enumerate() {
            let a = self.channels.get(i).unwrap_or(&empty);
            let b = other.channels.get(i).unwrap_or(&empty);
            *slot = op(a, b)?;
        }

        Ok(result)
    }

    /// New file with `other`'s samples after this file's, channel by channel.
    ///
    /// The result is not padded; call [`AudioFile::make_valid`] when the
    /// inputs may have different lengths.
    pub fn concat(&self, other: &AudioFile) -> Result<AudioFile> {
        if self.strict || other.strict {
            if self.bit_res != other.bit_res {
                return Err(Error::Resolution(self.bit_res, other.bit_res));
            }
            if self.num_channels() != other.num_channels() {
                return Err(Error::ChannelCount(self.num_channels(), other.num_channels()));
            }
        }

        let bit_res = self.bit_res.max(other.bit_res);
        self.pair_channels(other, bit_res, self.strict && other.strict, Channel::concat)
    }

    /// Strict combination demands identical shape, rate and sample count.
    fn check_same_shape(&self, other: &AudioFile) -> Result<()> {
        if !(self.strict || other.strict) {
            return Ok(());
        }

        if self.bit_res != other.bit_res {
            return Err(Error::Resolution(self.bit_res, other.bit_res));
        }
        if self.num_channels() != other.num_channels() {
            return Err(Error::ChannelCount(self.num_channels(), other.num_channels()));
        }
        if self.sample_rate != other.sample_rate {
            return Err(Error::Rate(self.sample_rate, other.sample_rate));
        }
        let total = |file: &AudioFile| file.channels.iter().map(Channel::len).sum::<usize>();
        if total(self) != total(other) {
            return Err(Error::Length(total(self), total(other)));
        }

        Ok(())
    }

    /// Mix two files by summing samples.
    pub fn add(&self, other: &AudioFile) -> Result<AudioFile> {
        self.check_same_shape(other)?;

        let bit_res = self.bit_res.max(other.bit_res);
        self.pair_channels(other, bit_res, self.strict && other.strict, Channel::add)
    }

    /// Multiply two files sample by sample.
    pub fn multiply(&self, other: &AudioFile) -> Result<AudioFile> {
        self.check_same_shape(other)?;

        let bit_res = self.bit_res.max(other.bit_res);
        let mut product =
            self.pair_channels(other, bit_res, self.strict && other.strict, Channel::multiply)?;
        product.make_valid();

        Ok(product)
    }

    /// Scale every channel by `factor`.
    pub fn scale(&self, factor: f64) -> Result<AudioFile> {
        let mut scaled = self.clone();
        for channel in scaled.channels.iter_mut() {
            *channel = channel.scale(factor)?;
        }

        Ok(scaled)
    }
}

impl Index<usize> for AudioFile {
    type Output = Channel;

    fn index(&self, index: usize) -> &Channel {
        &self.channels[index]
    }
}

impl IndexMut<usize> for AudioFile {
    fn index_mut(&mut self, index: usize) -> &mut Channel {
        &mut self.channels[index]
    }
}

impl fmt::Display for AudioFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "File name:      {}", self.name)?;
        writeln!(f, "File format:    {}", self.extension)?;
        writeln!(f, "Sample rate:    {}", self.sample_rate)?;
        writeln!(f, "Bit resolution: {}", self.bit_res)?;
        writeln!(f, "Channels:       {}", self.num_channels())?;
        writeln!(f, "Samples:        {}", self.num_samples())?;
        write!(f, "Length:         {:.3} s", self.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn file(bit_res: u32, strict: bool, channels: &[&[i64]]) -> AudioFile {
        let mut file =
            AudioFile::new("test", "cs229", 8000, bit_res, channels.len(), strict).unwrap();
        for (i, samples) in channels.iter().enumerate() {
            for &sample in samples.iter() {
                file[i].push(sample).unwrap();
            }
        }
        file
    }

    #[test]
    fn constructor_validates_config() {
        let err = AudioFile::new("a", "wav", 8000, 16, 0, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = AudioFile::new("a", "wav", 8000, 16, 128, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = AudioFile::new("a", "wav", 8000, 12, 2, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let ok = AudioFile::new("a", "wav", 8000, 16, 127, true).unwrap();
        assert_eq!(ok.num_channels(), 127);
        assert!(ok.channels().all(|c| c.bit_res() == BitRes::Sixteen));
    }

    #[test]
    fn byte_rate_and_duration() {
        let file = file(16, true, &[&[0; 4000], &[0; 4000]]);

        assert_eq!(file.byte_rate(), 8000 * 2 * 16);
        assert!((file.duration() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn make_valid_pads_and_is_idempotent() {
        let mut uneven = file(16, true, &[&[1, 2, 3], &[4], &[]]);
        assert!(!uneven.are_channels_valid());

        uneven.make_valid();
        assert!(uneven.are_channels_valid());
        assert_eq!(uneven[1].samples(), &[4, 0, 0]);
        assert_eq!(uneven[2].samples(), &[0, 0, 0]);

        let once = uneven.clone();
        uneven.make_valid();
        assert_eq!(uneven, once);
    }

    #[test]
    fn strict_concat_rejects_channel_mismatch() {
        let a = file(16, true, &[&[1], &[2]]);
        let b = file(16, true, &[&[1], &[2], &[3]]);

        assert_eq!(a.concat(&b).unwrap_err().kind(), ErrorKind::ChannelCount);
    }

    #[test]
    fn concat_appends_channel_by_channel() {
        let a = file(16, true, &[&[1, 2], &[3, 4]]);
        let b = file(16, true, &[&[5], &[6]]);
        let joined = a.concat(&b).unwrap();

        assert_eq!(joined[0].samples(), &[1, 2, 5]);
        assert_eq!(joined[1].samples(), &[3, 4, 6]);
        assert_eq!(a[0].samples(), &[1, 2]);
    }

    #[test]
    fn lenient_concat_widens() {
        let a = file(8, false, &[&[1]]);
        let b = file(16, false, &[&[2], &[3]]);
        let mut joined = a.concat(&b).unwrap();

        assert_eq!(joined.num_channels(), 2);
        assert_eq!(joined.bit_res(), BitRes::Sixteen);
        assert!(!joined.are_channels_valid());

        joined.make_valid();
        assert_eq!(joined[1].samples(), &[3, 0]);
    }

    #[test]
    fn strict_add_checks_rate_and_length() {
        let a = file(16, true, &[&[1, 2]]);
        let mut b = file(16, true, &[&[3, 4]]);
        assert_eq!(a.add(&b).unwrap()[0].samples(), &[4, 6]);

        b.sample_rate = 44100;
        assert_eq!(a.add(&b).unwrap_err().kind(), ErrorKind::Rate);

        let c = file(16, true, &[&[3, 4, 5]]);
        assert_eq!(a.add(&c).unwrap_err().kind(), ErrorKind::Length);

        let d = file(8, true, &[&[3, 4]]);
        assert_eq!(a.add(&d).unwrap_err().kind(), ErrorKind::Resolution);
    }

    #[test]
    fn lenient_add_zero_extends() {
        let a = file(16, false, &[&[1, 2, 3]]);
        let b = file(16, false, &[&[10], &[20, 30]]);
        let sum = a.add(&b).unwrap();

        assert_eq!(sum.num_channels(), 2);
        assert_eq!(sum[0].samples(), &[11, 2, 3]);
        assert_eq!(sum[1].samples(), &[20, 30]);
    }

    #[test]
    fn multiply_repairs_lengths() {
        let a = file(16, false, &[&[2, 3, 4]]);
        let b = file(16, false, &[&[5, 5], &[7]]);
        let product = a.multiply(&b).unwrap();

        assert_eq!(product[0].samples(), &[10, 15, 0]);
        assert_eq!(product[1].samples(), &[0, 0, 0]);
    }

    #[test]
    fn scale_and_mute() {
        let a = file(16, true, &[&[10, -10], &[4, 5]]);
        let mut scaled = a.scale(1.5).unwrap();

        assert_eq!(scaled[0].samples(), &[15, -15]);
        assert_eq!(scaled[1].samples(), &[6, 7]);

        scaled.mute_channel(0).unwrap();
        assert_eq!(scaled[0].samples(), &[0, 0]);
        assert_eq!(scaled[1].samples(), &[6, 7]);
        assert_eq!(scaled.mute_channel(2).unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn display_summary() {
        let summary = file(8, true, &[&[0; 8000]]).to_string();

        assert!(summary.contains("Sample rate:    8000"));
        assert!(summary.contains("Bit resolution: 8"));
        assert!(summary.contains("Length:         1.000 s"));
    }
}
