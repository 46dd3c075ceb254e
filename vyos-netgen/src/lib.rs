//! Generate VyOS configuration trees from network inventories.
//!
//! An inventory describes networks, their DHCP subnets and hosts, the
//! firewall connections each host needs and the ports forwarded to it.
//! The generator projects that inventory onto a parsed VyOS template tree
//! (see [`vyos_config_core`]) and produces a validated definition tree.
//!
//! # Architecture
//!
//! - [`model`]: Inventory types read from YAML
//! - [`loader`]: Inventory file loading
//! - [`config`]: Generator settings (rule number ranges, duplicate policy)
//! - [`transform`]: Projection of networks, hosts, port groups and NAT
//!   forwards into definitions, with per-run rule counters
//! - [`inspect`]: Tree rendering for schema and definition trees
//! - [`report`]: Terminal rendering of diffs, counters and issues
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use vyos_config_core::parse_dir;
//! use vyos_netgen::config::default_config;
//! use vyos_netgen::loader::load_inventory;
//! use vyos_netgen::transform::generate;
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = Arc::new(parse_dir(Path::new("templates"))?);
//! let inventory = load_inventory(Path::new("site.yaml"))?;
//! let generation = generate(&schema, &inventory, &default_config())?;
//! assert!(generation.definitions.validate().is_empty());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod inspect;
pub mod loader;
pub mod model;
pub mod report;
pub mod transform;
