//! Ring Index - The "Playhead"
//!
//! Pure index arithmetic over a circular buffer: the capacity, the active
//! window `[in_point, out_point]` of meaningful history, and the current
//! read/write position. Holds no samples.

use crate::error::{ChronicleError, Result};
use serde::{Deserialize, Serialize};

/// Index state of a circular buffer.
///
/// Only the shared buffer mutates this; everybody else works on copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RingIndex {
    size: usize,
    in_point: usize,
    out_point: usize,
    current_index: usize,
}

impl RingIndex {
    /// Empty window at index 0 of a buffer of `size` samples
    pub fn new(size: usize) -> Result<Self> {
        Self::with_index(size, 0, 0, 0)
    }

    pub fn with_index(
        size: usize,
        in_point: usize,
        out_point: usize,
        current_index: usize,
    ) -> Result<Self> {
        if size == 0 {
            return Err(ChronicleError::InvalidLength("buffer size must be positive".to_string()));
        }
        for index in [in_point, out_point, current_index] {
            if index >= size {
                return Err(ChronicleError::IndexOutOfBounds { index, size });
            }
        }

        Ok(Self { size, in_point, out_point, current_index })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_point(&self) -> usize {
        self.in_point
    }

    pub fn out_point(&self) -> usize {
        self.out_point
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Number of samples in `[in_point, out_point]`
    pub fn active_length(&self) -> usize {
        compute_sub_length(self.in_point, self.out_point, self.size)
    }

    pub fn is_in_active_window(&self, index: usize) -> bool {
        is_inside_bounds(index, self.in_point, self.out_point, self.size)
    }

    /// Advance the current index by one sample and return it.
    ///
    /// Recording (`grow_active_window`) always moves forward and drags the
    /// out-point along; once the ring is full the in-point is pushed ahead so
    /// the oldest sample is the next one overwritten. Playback loops back to
    /// the in-point when stepping off the end of the active window.
    pub fn increment_index(&mut self, grow_active_window: bool) -> usize {
        let next = increment(self.current_index, 1, self.size);

        if grow_active_window {
            self.current_index = next;
            self.out_point = next;
            if next == self.in_point {
                self.in_point = increment(self.in_point, 1, self.size);
            }
        } else if self.is_in_active_window(self.current_index) && self.is_in_active_window(next) {
            self.current_index = next;
        } else {
            self.current_index = self.in_point;
        }

        self.current_index
    }

    /// `step` single increments, or `|step|` decrements when negative
    pub fn increment_index_by(&mut self, grow_active_window: bool, step: isize) -> usize {
        if step < 0 {
            for _ in 0..step.unsigned_abs() {
                self.decrement_index();
            }
        } else {
            for _ in 0..step {
                self.increment_index(grow_active_window);
            }
        }
        self.current_index
    }

    /// Step back one sample, looping to the out-point off the start of the window
    pub fn decrement_index(&mut self) -> usize {
        let previous = decrement(self.current_index, 1, self.size);

        if self.is_in_active_window(self.current_index) && self.is_in_active_window(previous) {
            self.current_index = previous;
        } else {
            self.current_index = self.out_point;
        }

        self.current_index
    }

    /// `step` single decrements, or `|step|` playback increments when negative
    pub fn decrement_index_by(&mut self, step: isize) -> usize {
        if step < 0 {
            for _ in 0..step.unsigned_abs() {
                self.increment_index(false);
            }
        } else {
            for _ in 0..step {
                self.decrement_index();
            }
        }
        self.current_index
    }

    /// Returns `false` when `index` is out of range or already current
    pub fn set_current_index(&mut self, index: usize) -> bool {
        Self::set_checked(&mut self.current_index, index, self.size)
    }

    pub fn set_in_point(&mut self, index: usize) -> bool {
        Self::set_checked(&mut self.in_point, index, self.size)
    }

    pub fn set_out_point(&mut self, index: usize) -> bool {
        Self::set_checked(&mut self.out_point, index, self.size)
    }

    fn set_checked(field: &mut usize, index: usize, size: usize) -> bool {
        if index >= size || *field == index {
            return false;
        }
        *field = index;
        true
    }
}

/// `index + step` wrapped into `[0, size)`, for `step <= size`
pub fn increment(index: usize, step: usize, size: usize) -> usize {
    let index = index + step;
    if index >= size {
        index - size
    } else {
        index
    }
}

/// `index - step` wrapped into `[0, size)`, for `step <= size`
pub fn decrement(index: usize, step: usize, size: usize) -> usize {
    if step > index {
        index + size - step
    } else {
        index - step
    }
}

/// Number of elements in the circular inclusive interval `[from, to]`.
///
/// # Panics
/// When `length` is zero or either bound is outside `[0, length)`.
pub fn compute_sub_length(from: usize, to: usize, length: usize) -> usize {
    assert!(length > 0, "length must be greater than zero");
    assert!(from < length, "from is out-of-bound, should be in [0, {}), but was: {}", length, from);
    assert!(to < length, "to is out-of-bound, should be in [0, {}), but was: {}", length, to);

    if to >= from {
        to - from + 1
    } else {
        to + length + 1 - from
    }
}

/// Start of the circular interval of `sub_length` elements ending at `to`.
///
/// # Panics
/// When `sub_length` is not in `[1, length]` or `to` is outside `[0, length)`.
pub fn compute_from_index(to: usize, sub_length: usize, length: usize) -> usize {
    assert!(
        sub_length > 0 && sub_length <= length,
        "sub-length must be in [1, {}], was: {}",
        length,
        sub_length
    );
    assert!(to < length, "to is out-of-bound, should be in [0, {}), but was: {}", length, to);

    decrement(to, sub_length - 1, length)
}

/// End of the circular interval of `sub_length` elements starting at `from`.
///
/// # Panics
/// When `sub_length` is not in `[1, length]` or `from` is outside `[0, length)`.
pub fn compute_to_index(from: usize, sub_length: usize, length: usize) -> usize {
    assert!(
        sub_length > 0 && sub_length <= length,
        "sub-length must be in [1, {}], was: {}",
        length,
        sub_length
    );
    assert!(from < length, "from is out-of-bound, should be in [0, {}), but was: {}", length, from);

    increment(from, sub_length - 1, length)
}

/// Circular membership of `query` in `[start, end]`
pub fn is_inside_bounds(query: usize, start: usize, end: usize, size: usize) -> bool {
    if query >= size {
        false
    } else if start <= end {
        query >= start && query <= end
    } else {
        query <= end || query >= start
    }
}
