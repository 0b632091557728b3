use handspace_common::EntityId;
use handspace_dispatch::TickReport;
use std::collections::VecDeque;
use std::fmt;

/// Lines kept by default, matching the in-world debug panel.
pub const DEFAULT_CAPACITY: usize = 9;

/// Rolling log of scheduler state transitions.
///
/// Oldest lines are dropped once the capacity is reached.
#[derive(Debug, Clone)]
pub struct DebugPanel {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for DebugPanel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DebugPanel {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        let line = line.into();
        tracing::debug!(target: "handspace::panel", "{line}");
        self.lines.push_back(line);
    }

    /// Add the lines for everything that changed in `report`.
    pub fn record(&mut self, report: &TickReport) {
        for name in &report.started {
            self.push(format!("running {name}"));
        }
        for (name, targets) in &report.target_changes {
            self.push(format!("targetIDs[{name}] = {}", id_list(targets)));
        }
        for fault in &report.faults {
            self.push(format!("fault: {fault}"));
        }
        for name in &report.stopped {
            self.push(format!("deleted targetIDs[{name}]"));
            self.push(format!("stopping {name}"));
        }
        for name in &report.evicted {
            self.push(format!("evicted {name}"));
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

fn id_list(ids: &[EntityId]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| format!("{ids:?}"))
}

impl fmt::Display for DebugPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
