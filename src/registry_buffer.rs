//! Registry Buffer - one variable buffer per variable of a namespace tree
//!
//! Buffers are stored by `VariableId`, so the namespace arena and the buffer
//! list stay in lockstep: `buffers[i]` always records `registry.variable(i)`.

use crate::error::{ChronicleError, Result};
use crate::registry::{Registry, RegistryId, VariableId};
use crate::types::ScalarKind;
use crate::variable::Variable;
use crate::variable_buffer::VariableBuffer;

#[derive(Debug)]
pub struct RegistryBuffer {
    registry: Registry,
    buffers: Vec<VariableBuffer>,
    size: usize,
}

impl RegistryBuffer {
    /// Allocate a buffer of `size` samples for every variable already in `registry`
    pub fn new(registry: Registry, size: usize) -> Self {
        let mut registry_buffer = Self {
            registry,
            buffers: Vec::new(),
            size,
        };
        registry_buffer.register_missing_buffers();
        registry_buffer
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Direct access for adding variables; call `register_missing_buffers`
    /// afterwards so they get recorded.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Length of every variable buffer
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn buffers(&self) -> &[VariableBuffer] {
        &self.buffers
    }

    /// Add (or find) a variable under `namespace` and give it a buffer
    pub fn add_variable(
        &mut self,
        namespace: &str,
        name: &str,
        kind: ScalarKind,
    ) -> Result<Variable> {
        let registry = self.registry.ensure_path_exists(namespace)?;
        let id = self.registry.add_variable(registry, name, kind)?;
        self.register_missing_buffers();
        Ok(self.registry.variable(id).clone())
    }

    pub fn add_enum_variable(
        &mut self,
        namespace: &str,
        name: &str,
        constants: &[&str],
    ) -> Result<Variable> {
        let registry = self.registry.ensure_path_exists(namespace)?;
        let id = self.registry.add_enum_variable(registry, name, constants)?;
        self.register_missing_buffers();
        Ok(self.registry.variable(id).clone())
    }

    /// Create buffers for variables added to the registry since the last
    /// call. Returns how many were created.
    pub fn register_missing_buffers(&mut self) -> usize {
        let missing = self.registry.variable_count() - self.buffers.len();

        for index in self.buffers.len()..self.registry.variable_count() {
            let variable = self.registry.variable(VariableId(index)).clone();
            log::debug!("Registering buffer for {}", variable.full_name());
            self.buffers.push(VariableBuffer::new(variable, self.size));
        }

        missing
    }

    pub fn find_variable_buffer(&self, full_name: &str) -> Option<&VariableBuffer> {
        let id = self.registry.find_variable(full_name)?;
        self.buffers.get(id.0)
    }

    /// Buffer id for `variable`'s full name, creating the namespace path, the
    /// variable and its buffer on this side when they do not exist yet.
    pub fn find_or_create_variable_buffer(&mut self, variable: &Variable) -> Result<VariableId> {
        let id = match self.registry.find_variable(variable.full_name()) {
            Some(id) => {
                let existing = self.registry.variable(id);
                if existing.kind() != variable.kind()
                    || existing.enum_constants() != variable.enum_constants()
                {
                    return Err(ChronicleError::VariableConflict(variable.full_name().to_string()));
                }
                id
            }
            None => {
                let registry = self.registry.ensure_path_exists(variable.namespace())?;
                let id = self.registry.duplicate_variable(registry, variable)?;
                log::info!("Created buffered variable {} on demand", variable.full_name());
                id
            }
        };

        self.register_missing_buffers();
        Ok(id)
    }

    pub fn variable_buffer(&self, id: VariableId) -> &VariableBuffer {
        &self.buffers[id.0]
    }

    pub(crate) fn variable_buffer_mut(&mut self, id: VariableId) -> &mut VariableBuffer {
        &mut self.buffers[id.0]
    }

    /// Apply the same circular slice `[from, from + new_size)` to every buffer
    pub fn resize(&mut self, from: usize, new_size: usize) {
        for buffer in &mut self.buffers {
            buffer.resize(from, new_size);
        }
        self.size = new_size;
    }

    pub fn write(&mut self, index: usize) {
        let size = self.size;
        for buffer in &mut self.buffers {
            assert_eq!(
                buffer.len(),
                size,
                "buffer of {} out of sync",
                buffer.variable().full_name()
            );
            buffer.write(index);
        }
    }

    /// Load every variable from `index`, returning whether any changed
    pub fn read(&self, index: usize) -> bool {
        let mut changed = false;
        for buffer in &self.buffers {
            assert_eq!(
                buffer.len(),
                self.size,
                "buffer of {} out of sync",
                buffer.variable().full_name()
            );
            changed |= buffer.read(index);
        }
        changed
    }

    pub fn fill(&mut self, zero_fill: bool, from: usize, length: usize) {
        for buffer in &mut self.buffers {
            buffer.fill(zero_fill, from, length);
        }
    }

    /// Bytes of one sample across all variables
    pub fn frame_memory_size(&self) -> usize {
        self.buffers.iter().map(|b| b.variable().kind().element_size()).sum()
    }

    /// Empty namespace mirror of `namespace` (or the whole tree) for a consumer.
    /// Returns the mirror and its registry corresponding to `namespace`.
    pub fn new_linked_registry(&self, namespace: Option<&str>) -> Result<(Registry, RegistryId)> {
        let source = match namespace {
            Some(namespace) => self
                .registry
                .find_registry(namespace)
                .ok_or_else(|| ChronicleError::UnknownVariable(namespace.to_string()))?,
            None => self.registry.root(),
        };
        self.registry.new_empty_clone(source)
    }
}
