//! Named, step-wise rule number allocation.
//!
//! Every firewall rule set gets its own counter, and NAT destination rules
//! share a single reserved one. Counters are safe to use from several
//! threads; each call to [`RuleCounters::next`] hands out a distinct number.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::debug;

/// Identifies a counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleSet {
    /// A named firewall rule set, e.g. `LAN-IN`.
    Firewall(String),
    /// The NAT destination rule sequence.
    Nat,
}

impl Display for RuleSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RuleSet::Firewall(name) => f.write_str(name),
            RuleSet::Nat => f.write_str("<nat>"),
        }
    }
}

impl From<&str> for RuleSet {
    fn from(name: &str) -> Self {
        RuleSet::Firewall(name.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CounterError {
    #[error("no rule counter named {name}")]
    Unknown { name: RuleSet },
    #[error("rule counter {name} needs a non-zero step")]
    ZeroStep { name: RuleSet },
    #[error("rule counter {name} has run out of numbers")]
    Exhausted { name: RuleSet },
    #[error("rule counter {name} lock poisoned")]
    LockPoisoned { name: RuleSet },
}

/// A monotonically increasing rule number sequence.
#[derive(Debug)]
pub struct RuleCounter {
    name: RuleSet,
    step: u32,
    /// Next number to hand out; `None` once the sequence overflowed.
    number: Mutex<Option<u32>>,
}

impl RuleCounter {
    pub fn new(name: RuleSet, start: u32, step: u32) -> Result<Self, CounterError> {
        if step == 0 {
            return Err(CounterError::ZeroStep { name });
        }
        Ok(Self {
            name,
            step,
            number: Mutex::new(Some(start)),
        })
    }

    pub fn name(&self) -> &RuleSet {
        &self.name
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Return the current number and advance by `step`.
    pub fn next(&self) -> Result<u32, CounterError> {
        let mut number = self.lock()?;
        let current = number.ok_or_else(|| CounterError::Exhausted {
            name: self.name.clone(),
        })?;
        *number = current.checked_add(self.step);
        Ok(current)
    }

    /// The number the next call to [`RuleCounter::next`] would return.
    pub fn peek(&self) -> Result<u32, CounterError> {
        self.lock()?.ok_or_else(|| CounterError::Exhausted {
            name: self.name.clone(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<u32>>, CounterError> {
        self.number.lock().map_err(|_| CounterError::LockPoisoned {
            name: self.name.clone(),
        })
    }
}

/// Registry of rule counters keyed by [`RuleSet`].
#[derive(Debug, Default)]
pub struct RuleCounters {
    counters: Mutex<HashMap<RuleSet, Arc<RuleCounter>>>,
}

impl RuleCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a counter unless one already exists under `name`.
    ///
    /// Returns `true` when a counter was created. An existing counter keeps
    /// its position; `start` and `step` are then ignored.
    pub fn make_counter(&self, name: RuleSet, start: u32, step: u32) -> Result<bool, CounterError> {
        let mut counters = self.registry();
        if counters.contains_key(&name) {
            return Ok(false);
        }
        let counter = RuleCounter::new(name.clone(), start, step)?;
        debug!(counter = %name, start, step, "registered rule counter");
        counters.insert(name, Arc::new(counter));
        Ok(true)
    }

    pub fn has_counter(&self, name: &RuleSet) -> bool {
        self.registry().contains_key(name)
    }

    pub fn counter(&self, name: &RuleSet) -> Option<Arc<RuleCounter>> {
        self.registry().get(name).cloned()
    }

    /// Next number from the counter registered under `name`.
    pub fn next(&self, name: &RuleSet) -> Result<u32, CounterError> {
        let counter = self
            .counter(name)
            .ok_or_else(|| CounterError::Unknown { name: name.clone() })?;
        counter.next()
    }

    /// Registered counter names, sorted.
    pub fn names(&self) -> Vec<RuleSet> {
        let mut names: Vec<RuleSet> = self.registry().keys().cloned().collect();
        names.sort();
        names
    }

    // Registry updates are single map operations, so a poisoned guard still
    // protects a consistent map.
    fn registry(&self) -> MutexGuard<'_, HashMap<RuleSet, Arc<RuleCounter>>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
