//! Sample buffer — the unit exchanged between capture, processing, and playback.

use crate::error::{Result, RigError};

/// A mono run of `f32` samples tagged with its sample rate.
///
/// The sample rate is fixed for the lifetime of the buffer. Consumers see the
/// samples as read-only; the only mutable view is [`SampleBuffer::samples_mut`],
/// which effect chains use to process a buffer in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

fn check_rate(sample_rate: u32) -> Result<()> {
    if sample_rate == 0 {
        return Err(RigError::InvalidSampleRate(sample_rate));
    }
    Ok(())
}

impl SampleBuffer {
    /// Create a zero-filled buffer of `length` samples.
    pub fn new(length: usize, sample_rate: u32) -> Result<Self> {
        check_rate(sample_rate)?;
        Ok(SampleBuffer {
            samples: vec![0.0; length],
            sample_rate,
        })
    }

    /// Wrap existing samples. Takes ownership, so nothing is copied.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        check_rate(sample_rate)?;
        Ok(SampleBuffer {
            samples,
            sample_rate,
        })
    }

    /// Copy borrowed samples into a new buffer.
    pub fn from_slice(samples: &[f32], sample_rate: u32) -> Result<Self> {
        Self::from_samples(samples.to_vec(), sample_rate)
    }

    /// Convert signed 16-bit PCM into `[-1.0, 1.0)` floats.
    pub fn from_pcm_i16(pcm: &[i16], sample_rate: u32) -> Result<Self> {
        let samples = pcm.iter().map(|&s| s as f32 / 32768.0).collect();
        Self::from_samples(samples, sample_rate)
    }

    /// Convert back to signed 16-bit PCM, clamping out-of-range samples.
    pub fn to_pcm_i16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
            .collect()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Mutable access for in-place processing.
    ///
    /// Anything written here changes the buffer for every later reader, so
    /// callers must say so where they use it.
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Copy out `length` samples starting at `start`.
    pub fn slice(&self, start: usize, length: usize) -> Result<SampleBuffer> {
        let end = start.checked_add(length).filter(|&end| end <= self.samples.len());
        match end {
            Some(end) => Ok(SampleBuffer {
                samples: self.samples[start..end].to_vec(),
                sample_rate: self.sample_rate,
            }),
            None => Err(RigError::Range {
                start,
                length,
                len: self.samples.len(),
            }),
        }
    }

    /// Return a new buffer holding `self` followed by `other`.
    pub fn concat(&self, other: &SampleBuffer) -> Result<SampleBuffer> {
        self.check_same_rate(other)?;
        let mut samples = Vec::with_capacity(self.len() + other.len());
        samples.extend_from_slice(&self.samples);
        samples.extend_from_slice(&other.samples);
        Ok(SampleBuffer {
            samples,
            sample_rate: self.sample_rate,
        })
    }

    /// Append `other` to the end of this buffer, consuming it.
    pub fn append(&mut self, other: SampleBuffer) -> Result<()> {
        self.check_same_rate(&other)?;
        self.samples.extend(other.samples);
        Ok(())
    }

    /// Iterate over consecutive sub-blocks of at most `block_size` samples.
    /// A `block_size` of zero is treated as one.
    pub fn blocks(&self, block_size: usize) -> impl Iterator<Item = &[f32]> {
        self.samples.chunks(block_size.max(1))
    }

    fn check_same_rate(&self, other: &SampleBuffer) -> Result<()> {
        if self.sample_rate != other.sample_rate {
            return Err(RigError::SampleRateMismatch {
                expected: self.sample_rate,
                found: other.sample_rate,
            });
        }
        Ok(())
    }
}
