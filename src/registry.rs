//! Registry - the namespace tree of variables
//!
//! An arena: registries and variables are addressed by stable indices that
//! never move, so parallel structures (one buffer per variable) can be kept in
//! lockstep by index.

use crate::error::{ChronicleError, Result};
use crate::types::ScalarKind;
use crate::variable::{validate_name, Variable};
use std::collections::HashMap;

/// Index of a registry node within its `Registry`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryId(pub usize);

/// Index of a variable within its `Registry`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub usize);

#[derive(Debug)]
struct RegistryNode {
    name: String,
    namespace: String,
    parent: Option<RegistryId>,
    children: Vec<RegistryId>,
    variables: Vec<VariableId>,
}

/// Namespace tree rooted at a single named registry
#[derive(Debug)]
pub struct Registry {
    nodes: Vec<RegistryNode>,
    variables: Vec<Variable>,
    by_namespace: HashMap<String, RegistryId>,
    by_full_name: HashMap<String, VariableId>,
}

impl Registry {
    pub fn new(root_name: &str) -> Result<Self> {
        validate_name(root_name)?;

        let root = RegistryNode {
            name: root_name.to_string(),
            namespace: root_name.to_string(),
            parent: None,
            children: Vec::new(),
            variables: Vec::new(),
        };

        let mut by_namespace = HashMap::new();
        by_namespace.insert(root_name.to_string(), RegistryId(0));

        Ok(Self {
            nodes: vec![root],
            variables: Vec::new(),
            by_namespace,
            by_full_name: HashMap::new(),
        })
    }

    pub fn root(&self) -> RegistryId {
        RegistryId(0)
    }

    pub fn name(&self, id: RegistryId) -> &str {
        &self.nodes[id.0].name
    }

    /// Dotted path from the root, e.g. `root.arm.elbow`
    pub fn namespace(&self, id: RegistryId) -> &str {
        &self.nodes[id.0].namespace
    }

    pub fn parent(&self, id: RegistryId) -> Option<RegistryId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: RegistryId) -> &[RegistryId] {
        &self.nodes[id.0].children
    }

    /// Variables declared directly in `id`
    pub fn variables_in(&self, id: RegistryId) -> &[VariableId] {
        &self.nodes[id.0].variables
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &Variable)> {
        self.variables.iter().enumerate().map(|(i, v)| (VariableId(i), v))
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn registry_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_registry(&self, namespace: &str) -> Option<RegistryId> {
        self.by_namespace.get(namespace).copied()
    }

    pub fn find_variable(&self, full_name: &str) -> Option<VariableId> {
        self.by_full_name.get(full_name).copied()
    }

    /// Child registry `name` of `parent`, created if absent
    pub fn add_child(&mut self, parent: RegistryId, name: &str) -> Result<RegistryId> {
        validate_name(name)?;

        let namespace = format!("{}.{}", self.nodes[parent.0].namespace, name);
        if let Some(existing) = self.by_namespace.get(&namespace) {
            return Ok(*existing);
        }

        let id = RegistryId(self.nodes.len());
        self.nodes.push(RegistryNode {
            name: name.to_string(),
            namespace: namespace.clone(),
            parent: Some(parent),
            children: Vec::new(),
            variables: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        self.by_namespace.insert(namespace, id);
        Ok(id)
    }

    /// Variable `name` in `registry`, created if absent
    pub fn add_variable(
        &mut self,
        registry: RegistryId,
        name: &str,
        kind: ScalarKind,
    ) -> Result<VariableId> {
        let variable = Variable::new(self.namespace(registry), name, kind)?;
        self.insert_variable(registry, variable)
    }

    pub fn add_enum_variable(
        &mut self,
        registry: RegistryId,
        name: &str,
        constants: &[&str],
    ) -> Result<VariableId> {
        let variable = Variable::new_enum(self.namespace(registry), name, constants)?;
        self.insert_variable(registry, variable)
    }

    /// Insert a copy of `template` (name, kind, constants, value) into `registry`.
    /// An existing variable of the same name and kind is returned as is.
    pub fn duplicate_variable(
        &mut self,
        registry: RegistryId,
        template: &Variable,
    ) -> Result<VariableId> {
        let variable = template.duplicate(self.namespace(registry));
        self.insert_variable(registry, variable)
    }

    fn insert_variable(&mut self, registry: RegistryId, variable: Variable) -> Result<VariableId> {
        if let Some(existing) = self.by_full_name.get(variable.full_name()) {
            let current = &self.variables[existing.0];
            if current.kind() != variable.kind()
                || current.enum_constants() != variable.enum_constants()
            {
                return Err(ChronicleError::VariableConflict(variable.full_name().to_string()));
            }
            return Ok(*existing);
        }

        let id = VariableId(self.variables.len());
        self.by_full_name.insert(variable.full_name().to_string(), id);
        self.nodes[registry.0].variables.push(id);
        self.variables.push(variable);
        Ok(id)
    }

    /// Walk (and create) the registries of a dotted `namespace`, which must
    /// start with this tree's root name.
    pub fn ensure_path_exists(&mut self, namespace: &str) -> Result<RegistryId> {
        if let Some(existing) = self.find_registry(namespace) {
            return Ok(existing);
        }

        let mut parts = namespace.split('.');
        let root_name = self.name(self.root()).to_string();
        if parts.next() != Some(root_name.as_str()) {
            return Err(ChronicleError::NamespaceMismatch {
                namespace: namespace.to_string(),
                root: root_name,
            });
        }

        let mut current = self.root();
        for part in parts {
            current = self.add_child(current, part)?;
        }
        Ok(current)
    }

    /// All variables at or below `id`, depth first
    pub fn subtree_variables(&self, id: RegistryId) -> Vec<VariableId> {
        let mut collected = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            collected.extend_from_slice(&self.nodes[node.0].variables);
            stack.extend(self.nodes[node.0].children.iter().rev());
        }
        collected
    }

    /// New registry tree holding only the namespace chain down to `id`, no
    /// variables. Returns the tree and the clone of `id` inside it.
    pub fn new_empty_clone(&self, id: RegistryId) -> Result<(Registry, RegistryId)> {
        let mut clone = Registry::new(self.name(self.root()))?;
        let leaf = clone.ensure_path_exists(self.namespace(id))?;
        Ok((clone, leaf))
    }

    /// Copy into `target` every registry and variable under `source_root` that
    /// `target` is missing. Returns the ids of the variables created in `target`.
    pub fn duplicate_missing_variables(
        &self,
        source_root: RegistryId,
        target: &mut Registry,
    ) -> Result<Vec<VariableId>> {
        let mut created = Vec::new();

        for source_id in self.subtree_variables(source_root) {
            let source = self.variable(source_id);
            if target.find_variable(source.full_name()).is_some() {
                continue;
            }

            let registry = target.ensure_path_exists(source.namespace())?;
            created.push(target.duplicate_variable(registry, source)?);
        }

        Ok(created)
    }
}
