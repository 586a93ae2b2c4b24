use std::fmt;
use std::ops::Index;

use crate::error::{Error, Result};

/// Supported sample resolutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BitRes {
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl BitRes {
    pub fn bits(self) -> u32 {
        match self {
            BitRes::Eight => 8,
            BitRes::Sixteen => 16,
            BitRes::ThirtyTwo => 32,
        }
    }

    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// Largest storable sample, `2^(bits - 1)`.
    pub fn max_sample(self) -> i64 {
        1 << (self.bits() - 1)
    }

    /// Smallest storable sample, `-(2^(bits - 1) - 1)`.
    pub fn min_sample(self) -> i64 {
        -(self.max_sample() - 1)
    }

    /// Peak amplitude used when synthesizing, symmetric around zero.
    pub fn amplitude(self) -> f64 {
        (self.max_sample() - 1) as f64
    }
}

impl TryFrom<u32> for BitRes {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(BitRes::Eight),
            16 => Ok(BitRes::Sixteen),
            32 => Ok(BitRes::ThirtyTwo),
            _ => Err(Error::config(format!(
                "bit resolution must be 8, 16 or 32, not {}",
                bits
            ))),
        }
    }
}

impl fmt::Display for BitRes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// An ordered run of integer samples that all fit in one [`BitRes`].
///
/// A `Channel` knows nothing about sample rate. The `strict` flag decides
/// whether combining it with another channel demands matching length and
/// resolution, or zero-extends and widens instead.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    samples: Vec<i64>,
    bit_res: BitRes,
    strict: bool,
}

impl Channel {
    pub fn new(bit_res: BitRes, strict: bool) -> Self {
        Channel {
            samples: Vec::new(),
            bit_res,
            strict,
        }
    }

    pub fn bit_res(&self) -> BitRes {
        self.bit_res
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[i64] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        self.samples.get(index).copied()
    }

    pub fn is_valid(&self, sample: i64) -> bool {
        sample >= self.bit_res.min_sample() && sample <= self.bit_res.max_sample()
    }

    fn check(&self, sample: i64) -> Result<i64> {
        if self.is_valid(sample) {
            Ok(sample)
        } else {
            Err(Error::Overflow {
                value: sample,
                bit_res: self.bit_res,
            })
        }
    }

    pub fn push(&mut self, sample: i64) -> Result<()> {
        let sample = self.check(sample)?;
        self.samples.push(sample);

        Ok(())
    }

    /// Replace this channel's samples with those of `other`.
    pub fn assign(&mut self, other: Channel) -> Result<()> {
        if self.strict && other.bit_res != self.bit_res {
            return Err(Error::Resolution(self.bit_res, other.bit_res));
        }
        for &sample in &other.samples {
            self.check(sample)?;
        }
        self.samples = other.samples;

        Ok(())
    }

    /// Multiply every sample by `factor`, truncating toward zero.
    pub fn scale(&self, factor: f64) -> Result<Channel> {
        let mut scaled = Channel::new(self.bit_res, self.strict);
        scaled.samples.reserve(self.len());
        for &sample in &self.samples {
            let value = (sample as f64 * factor).trunc();
            let in_range = value >= self.bit_res.min_sample() as f64
                && value <= self.bit_res.max_sample() as f64;
            if !in_range {
                return Err(Error::Overflow {
                    value: value as i64,
                    bit_res: self.bit_res,
                });
            }
            scaled.samples.push(value as i64);
        }

        Ok(scaled)
    }

    /// Invert every sample. Fails on the positive extreme, which has no
    /// negative counterpart.
    pub fn negate(&self) -> Result<Channel> {
        let mut negated = Channel::new(self.bit_res, self.strict);
        for &sample in &self.samples {
            negated.push(-sample)?;
        }

        Ok(negated)
    }

    /// Check whether two channels may be combined sample by sample.
    fn check_compatible(&self, other: &Channel) -> Result<()> {
        if self.strict || other.strict {
            if self.len() != other.len() {
                return Err(Error::Length(self.len(), other.len()));
            }
            if self.bit_res != other.bit_res {
                return Err(Error::Resolution(self.bit_res, other.bit_res));
            }
        }

        Ok(())
    }

    /// Combine two channels sample by sample. A missing sample counts as 0.
    fn zip_with<F>(&self, other: &Channel, op: F) -> Result<Channel>
    where
        F: Fn(i64, i64) -> Option<i64>,
    {
        self.check_compatible(other)?;

        let bit_res = self.bit_res.max(other.bit_res);
        let mut combined = Channel::new(bit_res, self.strict && other.strict);
        let len = self.len().max(other.len());
        combined.samples.reserve(len);
        for i in 0..len {
            let a = self.get(i).unwrap_or(0);
            let b = other.get(i).unwrap_or(0);
            let value = op(a, b).ok_or(Error::Overflow {
                value: i64::MAX,
                bit_res,
            })?;
            combined.push(value)?;
        }

        Ok(combined)
    }

    /// Elementwise sum.
    pub fn add(&self, other: &Channel) -> Result<Channel> {
        self.zip_with(other, i64::checked_add)
    }

    /// Elementwise product.
    pub fn multiply(&self, other: &Channel) -> Result<Channel> {
        self.zip_with(other, i64::checked_mul)
    }

    /// New channel with `other`'s samples after this one's.
    pub fn concat(&self, other: &Channel) -> Result<Channel> {
        if (self.strict || other.strict) && self.bit_res != other.bit_res {
            return Err(Error::Resolution(self.bit_res, other.bit_res));
        }

        let mut joined = Channel::new(
            self.bit_res.max(other.bit_res),
            self.strict && other.strict,
        );
        joined.samples.reserve(self.len() + other.len());
        joined.samples.extend_from_slice(&self.samples);
        joined.samples.extend_from_slice(&other.samples);

        Ok(joined)
    }

    /// Append `other`'s samples to this channel in place.
    pub fn append(&mut self, other: &Channel) -> Result<()> {
        if (self.strict || other.strict) && self.bit_res != other.bit_res {
            return Err(Error::Resolution(self.bit_res, other.bit_res));
        }
        for &sample in &other.samples {
            self.check(sample)?;
        }
        self.samples.extend_from_slice(&other.samples);

        Ok(())
    }

    /// Pad with silence up to `len` samples.
    pub(crate) fn pad_to(&mut self, len: usize) {
        if self.samples.len() < len {
            self.samples.resize(len, 0);
        }
    }

    pub(crate) fn silence(&mut self) {
        self.samples.iter_mut().for_each(|sample| *sample = 0);
    }
}

impl Index<usize> for Channel {
    type Output = i64;

    fn index(&self, index: usize) -> &i64 {
        &self.samples[index]
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut iter = self.samples.iter();
        if let Some(sample) = iter.next() {
            write!(f, "{}", sample)?;
        }
        for sample in iter {
            write!(f, ", {}", sample)?;
        }

        Ok(())
    }
}
