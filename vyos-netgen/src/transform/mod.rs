//! Projection of an [`Inventory`] into a VyOS definition tree.
//!
//! One call to [`generate`] is one generation run: it owns a fresh
//! [`RuleCounters`] registry, so rule numbers depend only on the inventory
//! and the configured start/step values.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use vyos_config_core::{
    ConfigPath, CounterError, DefinitionError, DefinitionValue, Definitions, RuleCounters,
    RuleSet, SchemaNode,
};

use crate::config::{CounterSettings, GeneratorConfig};
use crate::model::{FirewallNames, Inventory};

pub mod host;
pub mod nat;
pub mod network;
pub mod port_group;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Counter(#[from] CounterError),
}

/// Mutable state of one generation run.
pub struct Projection<'a> {
    pub defs: Definitions,
    pub counters: RuleCounters,
    pub config: &'a GeneratorConfig,
}

impl<'a> Projection<'a> {
    pub fn new(schema: Arc<SchemaNode>, config: &'a GeneratorConfig) -> Self {
        Self {
            defs: Definitions::new(schema).with_policy(config.duplicate_policy()),
            counters: RuleCounters::new(),
            config,
        }
    }

    /// Set `value` at `path` unless the same value is already there.
    ///
    /// Rule sets and similar shared objects may be reached from several
    /// networks; repeating an identical value is not a duplicate.
    pub fn insert_shared(&mut self, path: &ConfigPath, value: &str) -> Result<(), DefinitionError> {
        let existing = self.defs.get(&path.literal_string()).map(|def| &def.value);
        if existing == Some(&DefinitionValue::Single(value.to_string())) {
            return Ok(());
        }
        self.defs.insert_value(path, value)
    }
}

/// Output of a generation run.
#[derive(Debug)]
pub struct Generation {
    pub definitions: Definitions,
    pub counters: RuleCounters,
}

/// Project `inventory` against `schema`.
pub fn generate(
    schema: &Arc<SchemaNode>,
    inventory: &Inventory,
    config: &GeneratorConfig,
) -> Result<Generation, GenerateError> {
    let mut proj = Projection::new(Arc::clone(schema), config);
    let nat = config.nat_counter();
    proj.counters
        .make_counter(RuleSet::Nat, nat.rule_start, nat.rule_step)?;

    proj.defs
        .insert_template(&ConfigPath::new(), &inventory.settings)?;
    for group in &inventory.port_groups {
        port_group::project(&mut proj.defs, group)?;
    }
    for network in &inventory.networks {
        ensure_counters(&proj.counters, &network.firewall, &config.firewall)?;
        network::project(&mut proj, network)?;
    }

    info!(
        definitions = proj.defs.len(),
        networks = inventory.networks.len(),
        counters = proj.counters.names().len(),
        "generated definition tree"
    );
    Ok(Generation {
        definitions: proj.defs,
        counters: proj.counters,
    })
}

/// Create the inbound, outbound and local counters of a network unless a
/// previous network already did.
pub fn ensure_counters(
    counters: &RuleCounters,
    names: &FirewallNames,
    settings: &CounterSettings,
) -> Result<(), CounterError> {
    for (direction, name) in names.all() {
        let key = RuleSet::from(name);
        if counters.has_counter(&key) {
            debug!(counter = %key, %direction, "reusing rule counter");
            continue;
        }
        counters.make_counter(key, settings.rule_start, settings.rule_step)?;
    }
    Ok(())
}
