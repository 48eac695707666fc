//! RayOS Chronicle - Shared Types
//!
//! Scalar kinds and values exchanged between buffers and variables, plus the
//! configuration for a recording session.

use crate::error::{ChronicleError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The kinds of scalar a variable (and therefore its buffer) can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Boolean,
    Double,
    Integer,
    Long,
    Enum,
}

impl ScalarKind {
    /// Bytes used by one sample of this kind in a buffer
    pub fn element_size(self) -> usize {
        match self {
            ScalarKind::Boolean => std::mem::size_of::<bool>(),
            ScalarKind::Double => std::mem::size_of::<f64>(),
            ScalarKind::Integer => std::mem::size_of::<i32>(),
            ScalarKind::Long => std::mem::size_of::<i64>(),
            ScalarKind::Enum => std::mem::size_of::<Option<u8>>(),
        }
    }
}

/// One scalar value of any kind.
///
/// Equality on doubles is bitwise so that a NaN recorded in a buffer compares
/// equal to itself when samples are checked for changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ScalarValue {
    Boolean(bool),
    Double(f64),
    Integer(i32),
    Long(i64),
    /// Ordinal into the variable's constants, `None` for the null constant
    Enum(Option<u8>),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Boolean(_) => ScalarKind::Boolean,
            ScalarValue::Double(_) => ScalarKind::Double,
            ScalarValue::Integer(_) => ScalarKind::Integer,
            ScalarValue::Long(_) => ScalarKind::Long,
            ScalarValue::Enum(_) => ScalarKind::Enum,
        }
    }

    /// The value a freshly allocated buffer slot holds
    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Boolean => ScalarValue::Boolean(false),
            ScalarKind::Double => ScalarValue::Double(0.0),
            ScalarKind::Integer => ScalarValue::Integer(0),
            ScalarKind::Long => ScalarValue::Long(0),
            ScalarKind::Enum => ScalarValue::Enum(None),
        }
    }

    /// Raw bit pattern stored in a variable cell
    pub(crate) fn to_bits(self) -> u64 {
        match self {
            ScalarValue::Boolean(v) => v as u64,
            ScalarValue::Double(v) => v.to_bits(),
            ScalarValue::Integer(v) => v as u32 as u64,
            ScalarValue::Long(v) => v as u64,
            ScalarValue::Enum(None) => u64::MAX,
            ScalarValue::Enum(Some(ordinal)) => ordinal as u64,
        }
    }

    pub(crate) fn from_bits(kind: ScalarKind, bits: u64) -> Self {
        match kind {
            ScalarKind::Boolean => ScalarValue::Boolean(bits != 0),
            ScalarKind::Double => ScalarValue::Double(f64::from_bits(bits)),
            ScalarKind::Integer => ScalarValue::Integer(bits as u32 as i32),
            ScalarKind::Long => ScalarValue::Long(bits as i64),
            ScalarKind::Enum if bits == u64::MAX => ScalarValue::Enum(None),
            ScalarKind::Enum => ScalarValue::Enum(Some(bits as u8)),
        }
    }

    /// Numeric view used by the CLI summaries and processors
    pub fn as_f64(&self) -> f64 {
        match *self {
            ScalarValue::Boolean(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            ScalarValue::Double(v) => v,
            ScalarValue::Integer(v) => v as f64,
            ScalarValue::Long(v) => v as f64,
            ScalarValue::Enum(v) => v.map_or(-1.0, |o| o as f64),
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.to_bits() == other.to_bits()
    }
}

impl Eq for ScalarValue {}

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronicleConfig {
    /// Number of samples held per variable
    pub buffer_size: usize,

    /// Name of the root namespace of the recorded variables
    pub root_registry: String,

    /// Ticks the demo simulation records before stopping
    pub record_ticks: usize,

    /// How often consumers pull/push (ms), roughly a UI frame
    pub consumer_period_ms: u64,

    /// Write accepted consumer pushes at the current index
    pub write_buffer_on_push: bool,
}

impl Default for ChronicleConfig {
    fn default() -> Self {
        Self {
            buffer_size: 8192,
            root_registry: "root".to_string(),
            record_ticks: 1000,
            consumer_period_ms: 16,  // ~60 Hz
            write_buffer_on_push: true,
        }
    }
}

impl ChronicleConfig {
    /// Load a configuration from a TOML file, missing keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ChronicleConfig = toml::from_str(&content)
            .map_err(|e| ChronicleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(ChronicleError::Config("buffer_size must be positive".to_string()));
        }
        if self.root_registry.is_empty() || self.root_registry.contains('.') {
            return Err(ChronicleError::InvalidName(self.root_registry.clone()));
        }
        if self.consumer_period_ms == 0 {
            return Err(ChronicleError::Config("consumer_period_ms must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_value_bits_preserve_kind() {
        let values = [
            ScalarValue::Boolean(true),
            ScalarValue::Double(-2.5),
            ScalarValue::Integer(-7),
            ScalarValue::Long(i64::MIN),
            ScalarValue::Enum(Some(3)),
            ScalarValue::Enum(None),
        ];

        for value in values {
            assert_eq!(ScalarValue::from_bits(value.kind(), value.to_bits()), value);
        }
    }

    #[test]
    fn test_nan_equals_itself() {
        assert_eq!(ScalarValue::Double(f64::NAN), ScalarValue::Double(f64::NAN));
        assert_ne!(ScalarValue::Double(0.0), ScalarValue::Double(-0.0));
        assert_ne!(ScalarValue::Integer(1), ScalarValue::Long(1));
    }

    #[test]
    fn test_config_load_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chronicle.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "buffer_size = 64").unwrap();
        writeln!(file, "root_registry = \"sim\"").unwrap();

        let config = ChronicleConfig::load(&path).unwrap();
        assert_eq!(config.buffer_size, 64);
        assert_eq!(config.root_registry, "sim");
        assert_eq!(config.consumer_period_ms, 16);
        assert!(config.write_buffer_on_push);
    }

    #[test]
    fn test_config_rejects_empty_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chronicle.toml");
        std::fs::write(&path, "buffer_size = 0\n").unwrap();

        assert!(matches!(ChronicleConfig::load(&path), Err(ChronicleError::Config(_))));
    }

    #[test]
    fn test_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ChronicleConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ChronicleError::Io(_))));
    }
}
