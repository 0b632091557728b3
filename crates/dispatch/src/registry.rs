use std::fmt;

use crate::module::InteractionModule;

/// The externally owned set of enabled modules, as seen by the scheduler.
///
/// The owner adds and removes modules between ticks and raises the dirty
/// flag when it does. The scheduler only looks modules up, calls them, and
/// clears the flag once it has re-sorted.
pub trait ModuleRegistry {
    /// Names in the registry's native order.
    fn names(&self) -> Vec<String>;

    fn module(&self, name: &str) -> Option<&dyn InteractionModule>;

    fn module_mut(&mut self, name: &str) -> Option<&mut (dyn InteractionModule + 'static)>;

    fn is_dirty(&self) -> bool;

    fn clear_dirty(&mut self);
}

/// Insertion-ordered module registry.
#[derive(Default)]
pub struct ModuleTable {
    entries: Vec<(String, Box<dyn InteractionModule>)>,
    dirty: bool,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a module under `name`. Replacing an existing name keeps its position.
    pub fn enable(&mut self, name: impl Into<String>, module: impl InteractionModule + 'static) {
        self.enable_boxed(name, Box::new(module));
    }

    pub fn enable_boxed(&mut self, name: impl Into<String>, module: Box<dyn InteractionModule>) {
        let name = name.into();
        tracing::debug!(module = %name, priority = module.priority(), "module enabled");
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = module,
            None => self.entries.push((name, module)),
        }
        self.dirty = true;
    }

    /// Remove a module. Returns false if no module had that name.
    pub fn disable(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        let removed = self.entries.len() != before;
        if removed {
            tracing::debug!(module = %name, "module disabled");
        }
        self.dirty = true;
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ModuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleTable")
            .field("names", &self.names())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl ModuleRegistry for ModuleTable {
    fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    fn module(&self, name: &str) -> Option<&dyn InteractionModule> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m.as_ref())
    }

    fn module_mut(&mut self, name: &str) -> Option<&mut (dyn InteractionModule + 'static)> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m.as_mut())
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Priority-ordered names of the registry's modules.
///
/// Rebuilt only on dirty ticks (and the first tick). Equal priorities are
/// ordered by name so the poll order does not depend on registration order.
#[derive(Debug, Clone, Default)]
pub struct RegistryView {
    ordered: Vec<String>,
    built: bool,
}

impl RegistryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-sort if the registry changed. Returns true if a re-sort happened.
    pub fn refresh(&mut self, registry: &mut dyn ModuleRegistry) -> bool {
        if self.built && !registry.is_dirty() {
            return false;
        }
        let mut keyed: Vec<(i32, String)> = registry
            .names()
            .into_iter()
            .filter_map(|name| registry.module(&name).map(|m| (m.priority(), name)))
            .collect();
        keyed.sort();
        self.ordered = keyed.into_iter().map(|(_, name)| name).collect();
        self.built = true;
        registry.clear_dirty();
        tracing::debug!(order = ?self.ordered, "module order rebuilt");
        true
    }

    pub fn ordered(&self) -> &[String] {
        &self.ordered
    }
}
