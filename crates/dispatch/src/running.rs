use handspace_common::EntityId;
use handspace_ports::LaserParams;

/// What the scheduler remembers about a running module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleRunState {
    /// Targets reported by the last execution step.
    pub targets: Vec<EntityId>,
    /// Laser made visible at start, hidden again at stop or eviction.
    pub laser: Option<LaserParams>,
}

/// Running modules in the order they started.
#[derive(Debug, Clone, Default)]
pub struct RunningSet {
    entries: Vec<(String, ModuleRunState)>,
}

impl RunningSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Returns false if it was already running.
    pub fn insert(&mut self, name: &str, laser: Option<LaserParams>) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.push((
            name.to_string(),
            ModuleRunState {
                targets: Vec::new(),
                laser,
            },
        ));
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<ModuleRunState> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleRunState> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn targets(&self, name: &str) -> Option<&[EntityId]> {
        self.get(name).map(|s| s.targets.as_slice())
    }

    /// Record a module's latest targets. Returns true if they changed.
    pub fn set_targets(&mut self, name: &str, targets: Vec<EntityId>) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, state)) if state.targets != targets => {
                state.targets = targets;
                true
            }
            _ => false,
        }
    }

    /// Snapshot of names in start order, safe to iterate while mutating the set.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Every recorded target of every running module.
    pub fn all_targets(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.iter().flat_map(|(_, s)| s.targets.iter().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleRunState)> + '_ {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn drain(&mut self) -> Vec<(String, ModuleRunState)> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
