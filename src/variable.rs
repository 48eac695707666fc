//! Variables - typed scalar cells with a stable full name
//!
//! A `Variable` is a cheap handle (`Arc`) to a cell whose value lives in an
//! `AtomicU64`, so the simulation thread and linked consumers can each hold
//! handles to their own variables from any thread.

use crate::error::{ChronicleError, Result};
use crate::types::{ScalarKind, ScalarValue};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Most constants an enum variable may declare (ordinals are `u8`, `u8::MAX` is reserved)
pub const MAX_ENUM_CONSTANTS: usize = u8::MAX as usize;

/// Shared handle to one typed scalar cell
#[derive(Clone)]
pub struct Variable {
    inner: Arc<VariableInner>,
}

struct VariableInner {
    name: String,
    namespace: String,
    full_name: String,
    kind: ScalarKind,
    enum_constants: Vec<String>,
    bits: AtomicU64,
}

impl Variable {
    /// Create a detached variable living under `namespace`
    pub fn new(namespace: &str, name: &str, kind: ScalarKind) -> Result<Self> {
        Self::build(namespace, name, kind, Vec::new())
    }

    /// Create a detached enum variable, initially holding the null constant
    pub fn new_enum(namespace: &str, name: &str, constants: &[&str]) -> Result<Self> {
        let constants = constants.iter().map(|c| c.to_string()).collect();
        Self::build(namespace, name, ScalarKind::Enum, constants)
    }

    fn build(
        namespace: &str,
        name: &str,
        kind: ScalarKind,
        enum_constants: Vec<String>,
    ) -> Result<Self> {
        validate_name(name)?;
        if enum_constants.len() > MAX_ENUM_CONSTANTS {
            return Err(ChronicleError::TooManyEnumConstants {
                name: name.to_string(),
                count: enum_constants.len(),
                max: MAX_ENUM_CONSTANTS,
            });
        }

        Ok(Self {
            inner: Arc::new(VariableInner {
                name: name.to_string(),
                namespace: namespace.to_string(),
                full_name: format!("{}.{}", namespace, name),
                kind,
                enum_constants,
                bits: AtomicU64::new(ScalarValue::zero(kind).to_bits()),
            }),
        })
    }

    /// Fresh variable with the same name, kind and constants under `namespace`.
    /// The value is copied, the cell is not shared.
    pub fn duplicate(&self, namespace: &str) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(VariableInner {
                name: inner.name.clone(),
                namespace: namespace.to_string(),
                full_name: format!("{}.{}", namespace, inner.name),
                kind: inner.kind,
                enum_constants: inner.enum_constants.clone(),
                bits: AtomicU64::new(inner.bits.load(Ordering::Acquire)),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn full_name(&self) -> &str {
        &self.inner.full_name
    }

    pub fn kind(&self) -> ScalarKind {
        self.inner.kind
    }

    pub fn enum_constants(&self) -> &[String] {
        &self.inner.enum_constants
    }

    /// Whether two handles point at the same cell
    pub fn ptr_eq(&self, other: &Variable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn value(&self) -> ScalarValue {
        ScalarValue::from_bits(self.inner.kind, self.inner.bits.load(Ordering::Acquire))
    }

    /// Set the value, returning whether it changed
    pub fn set_value(&self, value: ScalarValue) -> Result<bool> {
        if value.kind() != self.inner.kind {
            return Err(ChronicleError::KindMismatch {
                expected: self.inner.kind,
                actual: value.kind(),
            });
        }
        if let ScalarValue::Enum(Some(ordinal)) = value {
            if ordinal as usize >= self.inner.enum_constants.len() {
                return Err(ChronicleError::InvalidEnumOrdinal {
                    name: self.inner.full_name.clone(),
                    ordinal: Some(ordinal),
                    constants: self.inner.enum_constants.len(),
                });
            }
        }
        Ok(self.store(value))
    }

    /// Unchecked store for values already known to match this variable
    pub(crate) fn store(&self, value: ScalarValue) -> bool {
        debug_assert_eq!(value.kind(), self.inner.kind);
        let bits = value.to_bits();
        self.inner.bits.swap(bits, Ordering::AcqRel) != bits
    }

    pub fn get_boolean(&self) -> bool {
        self.load_bits() != 0
    }

    pub fn get_double(&self) -> f64 {
        f64::from_bits(self.load_bits())
    }

    pub fn get_integer(&self) -> i32 {
        self.load_bits() as u32 as i32
    }

    pub fn get_long(&self) -> i64 {
        self.load_bits() as i64
    }

    pub fn get_ordinal(&self) -> Option<u8> {
        match self.value() {
            ScalarValue::Enum(ordinal) => ordinal,
            _ => None,
        }
    }

    pub fn set_boolean(&self, value: bool) -> Result<bool> {
        self.set_value(ScalarValue::Boolean(value))
    }

    pub fn set_double(&self, value: f64) -> Result<bool> {
        self.set_value(ScalarValue::Double(value))
    }

    pub fn set_integer(&self, value: i32) -> Result<bool> {
        self.set_value(ScalarValue::Integer(value))
    }

    pub fn set_long(&self, value: i64) -> Result<bool> {
        self.set_value(ScalarValue::Long(value))
    }

    pub fn set_ordinal(&self, ordinal: Option<u8>) -> Result<bool> {
        self.set_value(ScalarValue::Enum(ordinal))
    }

    fn load_bits(&self) -> u64 {
        self.inner.bits.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("full_name", &self.inner.full_name)
            .field("value", &self.value())
            .finish()
    }
}

/// Names are non-empty and cannot contain the namespace separator
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('.') || name.chars().any(char::is_whitespace) {
        return Err(ChronicleError::InvalidName(name.to_string()));
    }
    Ok(())
}
