//! Buffer Sample - an immutable windowed read of a variable buffer

use crate::error::Result;
use crate::ring_index::{compute_to_index, RingIndex};
use crate::variable_buffer::ScalarArray;

/// Snapshot of `sample_length` samples starting at `from`, possibly wrapping
/// past the end of the buffer, together with the ring index it was taken
/// against.
#[derive(Debug, Clone)]
pub struct BufferSample {
    from: usize,
    sample_length: usize,
    properties: RingIndex,
    sample: ScalarArray,
}

impl BufferSample {
    pub fn new(from: usize, sample: ScalarArray, properties: RingIndex) -> Self {
        Self {
            from,
            sample_length: sample.len(),
            properties,
            sample,
        }
    }

    pub fn from(&self) -> usize {
        self.from
    }

    /// Last buffer index covered, `(from + sample_length - 1) mod size`.
    ///
    /// # Panics
    /// When the sample is empty, longer than the buffer, or `from` is outside it.
    pub fn to(&self) -> usize {
        compute_to_index(self.from, self.sample_length, self.properties.size())
    }

    pub fn sample_length(&self) -> usize {
        self.sample_length
    }

    pub fn buffer_size(&self) -> usize {
        self.properties.size()
    }

    pub fn properties(&self) -> &RingIndex {
        &self.properties
    }

    pub fn sample(&self) -> &ScalarArray {
        &self.sample
    }

    /// Field-wise equality, an error when the samples hold different kinds
    pub fn sample_equals(&self, other: &BufferSample) -> Result<bool> {
        let content = self.sample.sample_equals(&other.sample)?;
        Ok(content
            && self.from == other.from
            && self.sample_length == other.sample_length
            && self.properties == other.properties)
    }
}

/// # Panics
/// Comparing samples of different scalar kinds is a programming error.
impl PartialEq for BufferSample {
    fn eq(&self, other: &Self) -> bool {
        match self.sample_equals(other) {
            Ok(equal) => equal,
            Err(e) => panic!("cannot compare buffer samples: {}", e),
        }
    }
}
