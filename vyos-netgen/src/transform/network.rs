use vyos_config_core::{ConfigPath, Segment};

use super::{host, GenerateError, Projection};
use crate::model::{Network, Subnet};

/// Project one network: its router interface, the default action of its
/// rule sets and a DHCP subnet per entry of `subnets`.
pub fn project(proj: &mut Projection<'_>, network: &Network) -> Result<(), GenerateError> {
    let interface = ConfigPath::from_segments([
        Segment::fixed("interfaces"),
        Segment::fixed("ethernet"),
        Segment::value(&network.interface),
    ]);
    proj.defs.ensure(&interface)?;

    if let Some(description) = &network.description {
        proj.defs
            .insert_value(&interface.extend([Segment::fixed("description")]), description)?;
    }
    let addresses: Vec<String> = network.subnets.iter().map(Subnet::interface_address).collect();
    if !addresses.is_empty() {
        proj.defs
            .insert_values(&interface.extend([Segment::fixed("address")]), addresses)?;
    }

    let firewall = interface.extend([Segment::fixed("firewall")]);
    for (direction, name) in network.firewall.all() {
        let attachment =
            firewall.extend([Segment::fixed(direction.keyword()), Segment::fixed("name")]);
        proj.defs.insert_value(&attachment, name)?;
    }
    proj.defs.insert_template(&interface, &network.extra)?;

    if let Some(action) = &network.firewall.default_action {
        for (_, name) in network.firewall.all() {
            let path = ConfigPath::from_segments([
                Segment::fixed("firewall"),
                Segment::fixed("name"),
                Segment::value(name),
                Segment::fixed("default-action"),
            ]);
            proj.insert_shared(&path, action)?;
        }
    }

    for subnet in &network.subnets {
        project_subnet(proj, network, subnet)?;
    }
    Ok(())
}

fn project_subnet(
    proj: &mut Projection<'_>,
    network: &Network,
    subnet: &Subnet,
) -> Result<(), GenerateError> {
    let base = ConfigPath::from_segments([
        Segment::fixed("service"),
        Segment::fixed("dhcp-server"),
        Segment::fixed("shared-network-name"),
        Segment::value(&network.name),
        Segment::fixed("subnet"),
        Segment::value(&subnet.cidr),
    ]);
    proj.defs.ensure(&base)?;

    proj.defs
        .insert_value(&base.extend([Segment::fixed("default-router")]), &subnet.router)?;
    if !subnet.dns_servers.is_empty() {
        proj.defs.insert_values(
            &base.extend([Segment::fixed("dns-server")]),
            subnet.dns_servers.iter().cloned(),
        )?;
    }
    if let Some(domain) = &subnet.domain_name {
        proj.defs
            .insert_value(&base.extend([Segment::fixed("domain-name")]), domain)?;
    }
    if let Some(lease) = subnet.lease {
        proj.defs
            .insert_value(&base.extend([Segment::fixed("lease")]), lease.to_string())?;
    }
    if let Some(range) = &subnet.range {
        let start = base.extend([
            Segment::fixed("range"),
            Segment::value("0"),
            Segment::fixed("start"),
        ]);
        proj.defs.insert_value(&start, &range.start)?;
        let stop = start.diverge_from(1, [Segment::fixed("stop")]);
        proj.defs.insert_value(&stop, &range.stop)?;
    }
    proj.defs.insert_template(&base, &subnet.extra)?;

    for entry in &subnet.hosts {
        host::project(proj, network, &base, entry)?;
    }
    Ok(())
}
