//! Linked Registry - bulk subscription to a namespace subtree
//!
//! A consumer-owned copy of (part of) the recorded namespace tree where every
//! variable is linked to its buffer. The mirror starts empty and grows in both
//! directions on request: `update_from_buffer` pulls in variables the
//! simulation has added, `link_missing_variables` creates on the buffer side
//! the variables the consumer has added to its own copy.

use crate::error::{ChronicleError, Result};
use crate::linked_variable::LinkedVariable;
use crate::registry::{Registry, RegistryId};
use crate::shared_buffer::BufferLinker;
use std::collections::HashMap;

pub struct LinkedRegistry {
    registry: Registry,
    root: RegistryId,
    linker: BufferLinker,
    links: Vec<LinkedVariable>,
    by_full_name: HashMap<String, usize>,
}

impl LinkedRegistry {
    pub(crate) fn new(registry: Registry, root: RegistryId, linker: BufferLinker) -> Self {
        Self {
            registry,
            root,
            linker,
            links: Vec::new(),
            by_full_name: HashMap::new(),
        }
    }

    /// The consumer's copy of the namespace tree
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Add consumer variables here, then `link_missing_variables`
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Registry this mirror is rooted at
    pub fn root(&self) -> RegistryId {
        self.root
    }

    pub fn linked_variables(&self) -> &[LinkedVariable] {
        &self.links
    }

    pub fn linked_variable(&self, full_name: &str) -> Option<&LinkedVariable> {
        self.by_full_name.get(full_name).map(|&index| &self.links[index])
    }

    /// Mirror every recorded variable under the root that this copy lacks and
    /// link everything. Returns the number of new links.
    pub fn update_from_buffer(&mut self) -> Result<usize> {
        let created = {
            let registry_buffer = self.linker.registry_buffer();
            let buffer_registry = registry_buffer.registry();
            let namespace = self.registry.namespace(self.root);
            let source = buffer_registry
                .find_registry(namespace)
                .ok_or_else(|| ChronicleError::UnknownVariable(namespace.to_string()))?;
            buffer_registry.duplicate_missing_variables(source, &mut self.registry)?
        };

        if !created.is_empty() {
            log::debug!(
                "Mirrored {} new variables under {}",
                created.len(),
                self.registry.namespace(self.root)
            );
        }
        self.link_missing_variables()
    }

    /// Link every consumer variable under the root that is not linked yet,
    /// creating its counterpart on the buffer side when missing.
    pub fn link_missing_variables(&mut self) -> Result<usize> {
        let mut linked = 0;
        for id in self.registry.subtree_variables(self.root) {
            let variable = self.registry.variable(id);
            if self.by_full_name.contains_key(variable.full_name()) {
                continue;
            }

            let link = self.linker.new_linked_variable(variable.clone())?;
            self.by_full_name.insert(variable.full_name().to_string(), self.links.len());
            self.links.push(link);
            linked += 1;
        }
        Ok(linked)
    }

    /// Link one consumer variable of this mirror by full name
    pub fn link_variable(&mut self, full_name: &str) -> Result<&LinkedVariable> {
        if let Some(&index) = self.by_full_name.get(full_name) {
            return Ok(&self.links[index]);
        }

        let id = self
            .registry
            .find_variable(full_name)
            .ok_or_else(|| ChronicleError::UnknownVariable(full_name.to_string()))?;
        let link = self.linker.new_linked_variable(self.registry.variable(id).clone())?;

        let index = self.links.len();
        self.by_full_name.insert(full_name.to_string(), index);
        self.links.push(link);
        Ok(&self.links[index])
    }

    /// Pull every linked variable, returning whether any had a pending value
    pub fn pull(&self) -> bool {
        let mut pulled = false;
        for link in &self.links {
            pulled |= link.pull();
        }
        pulled
    }

    /// Push every linked variable
    pub fn push(&self) {
        for link in &self.links {
            link.push();
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
