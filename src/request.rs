//! Requests - value carriers and descriptors exchanged with the buffer owner

use crate::error::{ChronicleError, Result};
use crate::ring_index::{compute_sub_length, RingIndex};
use crate::types::ScalarValue;
use crate::variable::Variable;

/// A value travelling from the buffer to a consumer variable
#[derive(Debug, Clone)]
pub struct PullRequest {
    destination: Variable,
    value: ScalarValue,
}

impl PullRequest {
    pub fn new(destination: Variable, value: ScalarValue) -> Result<Self> {
        check_kind(&destination, value)?;
        Ok(Self { destination, value })
    }

    pub fn destination(&self) -> &Variable {
        &self.destination
    }

    pub fn value(&self) -> ScalarValue {
        self.value
    }

    /// Apply the value, returning whether the destination changed
    pub fn pull(&self) -> bool {
        self.destination.store(self.value)
    }
}

/// A value travelling from a consumer to the buffer's variable
#[derive(Debug, Clone)]
pub struct PushRequest {
    destination: Variable,
    value: ScalarValue,
}

impl PushRequest {
    pub fn new(destination: Variable, value: ScalarValue) -> Result<Self> {
        check_kind(&destination, value)?;
        Ok(Self { destination, value })
    }

    pub fn destination(&self) -> &Variable {
        &self.destination
    }

    pub fn value(&self) -> ScalarValue {
        self.value
    }

    /// Apply the value, returning whether the destination changed
    pub fn push(&self) -> bool {
        self.destination.store(self.value)
    }
}

fn check_kind(destination: &Variable, value: ScalarValue) -> Result<()> {
    if destination.kind() != value.kind() {
        return Err(ChronicleError::KindMismatch {
            expected: destination.kind(),
            actual: value.kind(),
        });
    }
    Ok(())
}

/// Which part of a buffer a consumer wants a sample of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRequest {
    /// The whole backing array from index 0
    Entire,
    /// `[in_point, out_point]`
    ActiveOnly,
    /// From `from` up to the out-point
    StartingFrom(isize),
    /// `length` samples from `from`
    Window { from: isize, length: isize },
}

impl SampleRequest {
    /// Resolve against the ring index at hand into `(from, length)`.
    ///
    /// `Ok(None)` when the window is empty and there is nothing to sample.
    pub fn resolve(&self, properties: &RingIndex) -> Result<Option<(usize, usize)>> {
        let size = properties.size();
        let invalid = |from: isize, length: isize| ChronicleError::InvalidSampleRequest {
            from,
            length,
            size,
        };

        let (from, length) = match *self {
            SampleRequest::Entire => (0, size),
            SampleRequest::ActiveOnly => (properties.in_point(), properties.active_length()),
            SampleRequest::StartingFrom(from) => {
                if from < 0 || from as usize >= size {
                    return Err(invalid(from, -1));
                }
                let from = from as usize;
                (from, compute_sub_length(from, properties.out_point(), size))
            }
            SampleRequest::Window { from, length } => {
                if from < 0 || length < 0 || from as usize >= size || length as usize > size {
                    return Err(invalid(from, length));
                }
                (from as usize, length as usize)
            }
        };

        if length == 0 {
            return Ok(None);
        }
        Ok(Some((from, length)))
    }
}

/// Keep only `[from, to]` of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRequest {
    pub from: usize,
    pub to: usize,
}

impl CropRequest {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Size of the buffer after cropping a buffer of `size` samples
    pub fn cropped_size(&self, size: usize) -> Result<usize> {
        check_bounds(self.from, self.to, size)?;
        Ok(compute_sub_length(self.from, self.to, size))
    }
}

/// Overwrite `[from, to]` with zeros or the variables' live values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRequest {
    pub zero_fill: bool,
    pub from: usize,
    pub to: usize,
}

impl FillRequest {
    pub fn new(zero_fill: bool, from: usize, to: usize) -> Self {
        Self { zero_fill, from, to }
    }

    /// Number of samples overwritten in a buffer of `size` samples
    pub fn filled_size(&self, size: usize) -> Result<usize> {
        check_bounds(self.from, self.to, size)?;
        Ok(compute_sub_length(self.from, self.to, size))
    }
}

fn check_bounds(from: usize, to: usize, size: usize) -> Result<()> {
    for index in [from, to] {
        if index >= size {
            return Err(ChronicleError::IndexOutOfBounds { index, size });
        }
    }
    Ok(())
}
