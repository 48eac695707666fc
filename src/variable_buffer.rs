//! Variable Buffer - one circular history per variable
//!
//! The backing storage is a closed enum over the scalar kinds; all the
//! circular copy/fill logic is written once, generically, and dispatched
//! per variant.

use crate::buffer_sample::BufferSample;
use crate::error::{ChronicleError, Result};
use crate::ring_index::RingIndex;
use crate::types::{ScalarKind, ScalarValue};
use crate::variable::Variable;

/// Fixed-length array of one scalar kind
#[derive(Debug, Clone)]
pub enum ScalarArray {
    Boolean(Vec<bool>),
    Double(Vec<f64>),
    Integer(Vec<i32>),
    Long(Vec<i64>),
    Enum(Vec<Option<u8>>),
}

impl ScalarArray {
    /// `len` default-valued samples of `kind`
    pub fn zeroed(kind: ScalarKind, len: usize) -> Self {
        match kind {
            ScalarKind::Boolean => ScalarArray::Boolean(vec![false; len]),
            ScalarKind::Double => ScalarArray::Double(vec![0.0; len]),
            ScalarKind::Integer => ScalarArray::Integer(vec![0; len]),
            ScalarKind::Long => ScalarArray::Long(vec![0; len]),
            ScalarKind::Enum => ScalarArray::Enum(vec![None; len]),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarArray::Boolean(_) => ScalarKind::Boolean,
            ScalarArray::Double(_) => ScalarKind::Double,
            ScalarArray::Integer(_) => ScalarKind::Integer,
            ScalarArray::Long(_) => ScalarKind::Long,
            ScalarArray::Enum(_) => ScalarKind::Enum,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ScalarArray::Boolean(a) => a.len(),
            ScalarArray::Double(a) => a.len(),
            ScalarArray::Integer(a) => a.len(),
            ScalarArray::Long(a) => a.len(),
            ScalarArray::Enum(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<ScalarValue> {
        match self {
            ScalarArray::Boolean(a) => a.get(index).map(|v| ScalarValue::Boolean(*v)),
            ScalarArray::Double(a) => a.get(index).map(|v| ScalarValue::Double(*v)),
            ScalarArray::Integer(a) => a.get(index).map(|v| ScalarValue::Integer(*v)),
            ScalarArray::Long(a) => a.get(index).map(|v| ScalarValue::Long(*v)),
            ScalarArray::Enum(a) => a.get(index).map(|v| ScalarValue::Enum(*v)),
        }
    }

    pub fn set(&mut self, index: usize, value: ScalarValue) -> Result<()> {
        let size = self.len();
        if index >= size {
            return Err(ChronicleError::IndexOutOfBounds { index, size });
        }

        match (self, value) {
            (ScalarArray::Boolean(a), ScalarValue::Boolean(v)) => a[index] = v,
            (ScalarArray::Double(a), ScalarValue::Double(v)) => a[index] = v,
            (ScalarArray::Integer(a), ScalarValue::Integer(v)) => a[index] = v,
            (ScalarArray::Long(a), ScalarValue::Long(v)) => a[index] = v,
            (ScalarArray::Enum(a), ScalarValue::Enum(v)) => a[index] = v,
            (array, value) => {
                return Err(ChronicleError::KindMismatch {
                    expected: array.kind(),
                    actual: value.kind(),
                });
            }
        }
        Ok(())
    }

    /// Circular copy of `new_length` samples starting at `from`.
    ///
    /// # Panics
    /// When the array is not empty and `from` is outside it.
    pub fn ring_copy(&self, from: usize, new_length: usize) -> ScalarArray {
        match self {
            ScalarArray::Boolean(a) => ScalarArray::Boolean(ring_array_copy(a, from, new_length)),
            ScalarArray::Double(a) => ScalarArray::Double(ring_array_copy(a, from, new_length)),
            ScalarArray::Integer(a) => ScalarArray::Integer(ring_array_copy(a, from, new_length)),
            ScalarArray::Long(a) => ScalarArray::Long(ring_array_copy(a, from, new_length)),
            ScalarArray::Enum(a) => ScalarArray::Enum(ring_array_copy(a, from, new_length)),
        }
    }

    /// Circularly fill `length` samples from `from` with `value`
    pub fn ring_fill(&mut self, value: ScalarValue, from: usize, length: usize) -> Result<()> {
        match (self, value) {
            (ScalarArray::Boolean(a), ScalarValue::Boolean(v)) => {
                ring_array_fill(a, v, from, length)
            }
            (ScalarArray::Double(a), ScalarValue::Double(v)) => {
                ring_array_fill(a, v, from, length)
            }
            (ScalarArray::Integer(a), ScalarValue::Integer(v)) => {
                ring_array_fill(a, v, from, length)
            }
            (ScalarArray::Long(a), ScalarValue::Long(v)) => {
                ring_array_fill(a, v, from, length)
            }
            (ScalarArray::Enum(a), ScalarValue::Enum(v)) => {
                ring_array_fill(a, v, from, length)
            }
            (array, value) => {
                return Err(ChronicleError::KindMismatch {
                    expected: array.kind(),
                    actual: value.kind(),
                });
            }
        }
        Ok(())
    }

    /// Elementwise equality; comparing two different kinds is an error.
    /// Doubles compare by bit pattern.
    pub fn sample_equals(&self, other: &ScalarArray) -> Result<bool> {
        let equal = match (self, other) {
            (ScalarArray::Boolean(a), ScalarArray::Boolean(b)) => a == b,
            (ScalarArray::Double(a), ScalarArray::Double(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (ScalarArray::Integer(a), ScalarArray::Integer(b)) => a == b,
            (ScalarArray::Long(a), ScalarArray::Long(b)) => a == b,
            (ScalarArray::Enum(a), ScalarArray::Enum(b)) => a == b,
            (a, b) => {
                return Err(ChronicleError::KindMismatch {
                    expected: a.kind(),
                    actual: b.kind(),
                })
            }
        };
        Ok(equal)
    }

    /// Numeric view of the samples, enum null maps to -1
    pub fn to_doubles(&self) -> Vec<f64> {
        (0..self.len())
            .filter_map(|i| self.get(i))
            .map(|v| v.as_f64())
            .collect()
    }

    pub fn memory_size(&self) -> usize {
        self.kind().element_size() * self.len()
    }
}

/// New array of `new_length` elements read circularly from `from`.
/// Only `min(new_length, ring.len())` elements are copied, the rest stay default.
///
/// # Panics
/// When `ring` is not empty and `from` is outside `[0, ring.len())`.
pub fn ring_array_copy<T: Copy + Default>(ring: &[T], from: usize, new_length: usize) -> Vec<T> {
    let mut copy = vec![T::default(); new_length];
    if ring.is_empty() {
        return copy;
    }

    let length = new_length.min(ring.len());
    let first = length.min(ring.len() - from);
    copy[..first].copy_from_slice(&ring[from..from + first]);
    copy[first..length].copy_from_slice(&ring[..length - first]);
    copy
}

/// Fill `length` elements circularly from `from`, clamped to the ring length.
///
/// # Panics
/// When `from` is outside `[0, ring.len())`.
pub fn ring_array_fill<T: Copy>(ring: &mut [T], value: T, from: usize, length: usize) {
    let length = length.min(ring.len());
    let first = length.min(ring.len() - from);
    ring[from..from + first].fill(value);
    ring[..length - first].fill(value);
}

/// Circular history of one variable.
///
/// The buffer never owns the ring index: every index it works with is handed
/// in by the registry buffer, identically for every variable.
#[derive(Debug)]
pub struct VariableBuffer {
    variable: Variable,
    array: ScalarArray,
}

impl VariableBuffer {
    pub fn new(variable: Variable, size: usize) -> Self {
        let array = ScalarArray::zeroed(variable.kind(), size);
        Self { variable, array }
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn array(&self) -> &ScalarArray {
        &self.array
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Store the variable's live value at `index`
    pub fn write(&mut self, index: usize) {
        let value = self.variable.value();
        match (&mut self.array, value) {
            (ScalarArray::Boolean(a), ScalarValue::Boolean(v)) => a[index] = v,
            (ScalarArray::Double(a), ScalarValue::Double(v)) => a[index] = v,
            (ScalarArray::Integer(a), ScalarValue::Integer(v)) => a[index] = v,
            (ScalarArray::Long(a), ScalarValue::Long(v)) => a[index] = v,
            (ScalarArray::Enum(a), ScalarValue::Enum(v)) => a[index] = v,
            _ => unreachable!("buffer kind always matches its variable"),
        }
    }

    /// Load the sample at `index` into the variable, returning whether it changed
    pub fn read(&self, index: usize) -> bool {
        match self.array.get(index) {
            Some(value) => self.variable.store(value),
            None => panic!("index {} is outside of buffer of length {}", index, self.len()),
        }
    }

    /// Snapshot `length` samples read circularly from `from`.
    ///
    /// # Panics
    /// When `from` is outside the buffer.
    pub fn copy(&self, from: usize, length: usize, properties: RingIndex) -> BufferSample {
        BufferSample::new(from, self.array.ring_copy(from, length), properties)
    }

    /// Replace the backing array by the circular slice of `new_length` from `from`.
    ///
    /// # Panics
    /// When `from` is outside the buffer.
    pub fn resize(&mut self, from: usize, new_length: usize) {
        self.array = self.array.ring_copy(from, new_length);
    }

    /// Fill `length` samples from `from` with zero or the variable's live value
    pub fn fill(&mut self, zero_fill: bool, from: usize, length: usize) {
        let value = if zero_fill {
            ScalarValue::zero(self.variable.kind())
        } else {
            self.variable.value()
        };
        // Kinds match by construction
        let _ = self.array.ring_fill(value, from, length);
    }

    pub fn value_at(&self, index: usize) -> Option<ScalarValue> {
        self.array.get(index)
    }

    pub fn set_value_at(&mut self, index: usize, value: ScalarValue) -> Result<()> {
        self.array.set(index, value)
    }
}
