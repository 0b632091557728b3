use handspace_common::EntityId;
use handspace_dispatch::{Dispatcher, ResourceSlot, TimingStats};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Read-only queries against a [`Dispatcher`] for debugging and the CLI.
pub struct DispatchInspector;

impl DispatchInspector {
    /// Produce a summary of the dispatcher state.
    pub fn summary(dispatcher: &Dispatcher) -> DispatchSummary {
        let timer = dispatcher.timer();
        DispatchSummary {
            tick: dispatcher.ticks(),
            module_count: dispatcher.order().len(),
            running: dispatcher.running().len(),
            free_slots: dispatcher.slots().free_count(),
            ignored_ids: dispatcher.ignore_lists().global().len(),
            average_interval: timer.average(),
            min_interval: timer.min(),
            max_interval: timer.max(),
            stats: *timer.stats(),
            torn_down: dispatcher.is_torn_down(),
        }
    }

    /// Every slot with its owner, in enumeration order.
    pub fn slots(dispatcher: &Dispatcher) -> Vec<SlotInfo> {
        dispatcher
            .slots()
            .iter()
            .map(|(slot, owner)| SlotInfo {
                slot,
                owner: owner.map(str::to_string),
            })
            .collect()
    }

    /// Running modules in start order with their latest targets.
    pub fn running(dispatcher: &Dispatcher) -> Vec<RunningInfo> {
        dispatcher
            .running()
            .iter()
            .map(|(name, state)| RunningInfo {
                name: name.to_string(),
                slots: dispatcher.slots().owned_by(name),
                targets: state.targets.clone(),
                has_laser: state.laser.is_some(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchSummary {
    pub tick: u64,
    pub module_count: usize,
    pub running: usize,
    pub free_slots: usize,
    pub ignored_ids: usize,
    pub average_interval: Duration,
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub stats: TimingStats,
    pub torn_down: bool,
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dispatcher: tick={} modules={} running={} free_slots={}/{} ignored={} \
             interval avg={:.2}ms min={:.2}ms max={:.2}ms jitter high={} very_high={}",
            self.tick,
            self.module_count,
            self.running,
            self.free_slots,
            ResourceSlot::COUNT,
            self.ignored_ids,
            ms(self.average_interval),
            ms(self.min_interval),
            ms(self.max_interval),
            self.stats.high_variance,
            self.stats.very_high_variance,
        )?;
        if self.torn_down {
            f.write_str(" (torn down)")?;
        }
        Ok(())
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotInfo {
    pub slot: ResourceSlot,
    pub owner: Option<String>,
}

impl fmt::Display for SlotInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{:<17} {owner}", self.slot.name()),
            None => write!(f, "{:<17} -", self.slot.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningInfo {
    pub name: String,
    pub slots: Vec<ResourceSlot>,
    pub targets: Vec<EntityId>,
    pub has_laser: bool,
}

impl fmt::Display for RunningInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<&str> = self.slots.iter().map(|s| s.name()).collect();
        write!(
            f,
            "{} slots=[{}] targets={}",
            self.name,
            slots.join(", "),
            self.targets.len()
        )?;
        if self.has_laser {
            f.write_str(" laser")?;
        }
        Ok(())
    }
}
