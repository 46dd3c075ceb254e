use vyos_config_core::{ConfigPath, RuleSet, Segment};

use super::{GenerateError, Projection};
use crate::model::Host;

/// Add one destination NAT rule per port forward of `host`, in ascending
/// external port order, and return the allocated rule numbers.
pub fn project(proj: &mut Projection<'_>, host: &Host) -> Result<Vec<u32>, GenerateError> {
    let mut numbers = Vec::with_capacity(host.forwards.len());

    for (external, internal) in host.sorted_forwards() {
        let number = proj.counters.next(&RuleSet::Nat)?;
        let rule = ConfigPath::from_segments([
            Segment::fixed("nat"),
            Segment::fixed("destination"),
            Segment::fixed("rule"),
            Segment::value(number.to_string()),
        ]);

        proj.defs.insert_value(
            &rule.extend([Segment::fixed("description")]),
            format!("{} port {external} to {internal}", host.name),
        )?;
        proj.defs.insert_value(
            &rule.extend([Segment::fixed("inbound-interface")]),
            &proj.config.nat.inbound_interface,
        )?;
        proj.defs
            .insert_value(&rule.extend([Segment::fixed("protocol")]), "tcp_udp")?;
        proj.defs.insert_value(
            &rule.extend([Segment::fixed("destination"), Segment::fixed("port")]),
            external.to_string(),
        )?;

        let translation = rule.extend([Segment::fixed("translation")]);
        proj.defs.insert_value(
            &translation.extend([Segment::fixed("address")]),
            &host.ip_address,
        )?;
        proj.defs.insert_value(
            &translation.extend([Segment::fixed("port")]),
            internal.to_string(),
        )?;
        numbers.push(number);
    }
    Ok(numbers)
}
