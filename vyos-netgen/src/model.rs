//! Device-agnostic network inventory.
//!
//! These types describe what the network should look like; [`crate::transform`]
//! turns them into VyOS configuration paths.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use vyos_config_core::{Scalar, Template};

/// Everything one inventory file describes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Inventory {
    /// Free-form configuration attached at the tree root.
    pub settings: Template,
    pub port_groups: Vec<PortGroup>,
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PortGroup {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub ports: Vec<Scalar>,
}

/// One layer-3 network behind a router interface.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Network {
    pub name: String,
    /// Router interface serving the network, e.g. `eth1`.
    pub interface: String,
    #[serde(default)]
    pub description: Option<String>,
    pub firewall: FirewallNames,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    /// Additional configuration attached under the interface.
    #[serde(default)]
    pub extra: Template,
}

/// Rule set names protecting a network interface.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FirewallNames {
    pub inbound: String,
    pub outbound: String,
    pub local: String,
    /// `default-action` applied to all three rule sets.
    #[serde(default)]
    pub default_action: Option<String>,
}

impl FirewallNames {
    pub fn name(&self, direction: Direction) -> &str {
        match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
            Direction::Local => &self.local,
        }
    }

    /// All three names paired with their direction.
    pub fn all(&self) -> [(Direction, &str); 3] {
        Direction::ALL.map(|direction| (direction, self.name(direction)))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Subnet {
    /// Network in CIDR notation, e.g. `192.168.10.0/24`.
    pub cidr: String,
    /// Router address inside the subnet.
    pub router: String,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    #[serde(default)]
    pub domain_name: Option<String>,
    /// DHCP lease time in seconds.
    #[serde(default)]
    pub lease: Option<u32>,
    #[serde(default)]
    pub range: Option<DhcpRange>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    /// Additional configuration attached under the DHCP subnet.
    #[serde(default)]
    pub extra: Template,
}

impl Subnet {
    /// Prefix length of `cidr`, if it has one.
    pub fn prefix_len(&self) -> Option<&str> {
        self.cidr.split_once('/').map(|(_, prefix)| prefix)
    }

    /// Router address with the subnet prefix, as assigned to the interface.
    pub fn interface_address(&self) -> String {
        match self.prefix_len() {
            Some(prefix) => format!("{}/{prefix}", self.router),
            None => self.router.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DhcpRange {
    pub start: String,
    pub stop: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Host {
    pub name: String,
    pub ip_address: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub connections: Vec<FirewallConnection>,
    /// External port to internal port.
    #[serde(default)]
    pub forwards: HashMap<u16, u16>,
    /// Additional configuration attached under the static mapping.
    #[serde(default)]
    pub extra: Template,
}

impl Host {
    /// Forwards in ascending external port order.
    pub fn sorted_forwards(&self) -> Vec<(u16, u16)> {
        let mut forwards: Vec<(u16, u16)> = self
            .forwards
            .iter()
            .map(|(external, internal)| (*external, *internal))
            .collect();
        forwards.sort_unstable();
        forwards
    }
}

/// One firewall intent of a host.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FirewallConnection {
    pub direction: Direction,
    pub allow: bool,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<ConnectionDetail>,
    #[serde(default)]
    pub destination: Option<ConnectionDetail>,
}

impl FirewallConnection {
    pub fn action(&self) -> &'static str {
        if self.allow {
            "accept"
        } else {
            "drop"
        }
    }

    pub fn log_value(&self) -> &'static str {
        if self.log {
            "enable"
        } else {
            "disable"
        }
    }
}

fn default_protocol() -> String {
    "all".to_string()
}

/// Source or destination match of a rule.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionDetail {
    pub address: Option<String>,
    pub port: Option<Scalar>,
    /// Name of a port group to match instead of a literal port.
    pub port_group: Option<String>,
}

impl ConnectionDetail {
    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.port.is_none() && self.port_group.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
    Local,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Inbound, Direction::Outbound, Direction::Local];

    /// Interface firewall attachment keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Inbound => "in",
            Direction::Outbound => "out",
            Direction::Local => "local",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
            Direction::Local => "local",
        };
        f.write_str(name)
    }
}
