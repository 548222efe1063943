//! Environment for variable bindings

use super::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Shared reference to an environment
pub type EnvRef = Rc<RefCell<Environment>>;

/// Environment holding variable bindings
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variable bindings in this scope
    bindings: HashMap<String, Value>,
    /// Parent environment for lexical scoping
    parent: Option<EnvRef>,
}

impl Environment {
    /// Create a new root environment
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    /// Create a new environment with a parent
    pub fn with_parent(parent: EnvRef) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Define a variable in the current scope, shadowing any earlier one
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Look up a variable in the scope chain
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            Some(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get(name)
        } else {
            None
        }
    }

    /// Whether this frame itself binds `name`; parents are not consulted
    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bindings of this frame only
    pub fn bindings(&self) -> &HashMap<String, Value> {
        &self.bindings
    }

    pub fn parent(&self) -> Option<&EnvRef> {
        self.parent.as_ref()
    }

    /// Drop every binding and the parent link
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.parent = None;
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a child environment from a parent reference
pub fn child_env(parent: &EnvRef) -> EnvRef {
    Environment::with_parent(Rc::clone(parent)).into_ref()
}

/// Every binding visible from `env`, outermost frame first and sorted by
/// name within a frame. Shadowed bindings are left out.
pub fn visible_bindings(env: &EnvRef) -> Vec<(String, Value)> {
    let mut frames = Vec::new();
    let mut current = Some(Rc::clone(env));
    while let Some(frame) = current {
        current = frame.borrow().parent().cloned();
        frames.push(frame);
    }

    let mut seen = HashSet::new();
    let mut visible_per_frame = Vec::with_capacity(frames.len());
    for frame in &frames {
        let frame = frame.borrow();
        let mut entries: Vec<_> = frame
            .bindings()
            .iter()
            .filter(|(name, _)| seen.insert(name.as_str().to_owned()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        visible_per_frame.push(entries);
    }

    visible_per_frame.into_iter().rev().flatten().collect()
}
