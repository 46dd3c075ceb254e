use tracing::debug;
use vyos_config_core::{ConfigPath, RuleSet, Segment};

use super::{nat, GenerateError, Projection};
use crate::model::{ConnectionDetail, FirewallConnection, Host, Network};

/// Project one host: its DHCP static mapping below `subnet`, a firewall
/// rule per connection and a NAT rule per port forward.
pub fn project(
    proj: &mut Projection<'_>,
    network: &Network,
    subnet: &ConfigPath,
    host: &Host,
) -> Result<(), GenerateError> {
    let mapping = subnet.extend([Segment::fixed("static-mapping"), Segment::value(&host.name)]);
    proj.defs
        .insert_value(&mapping.extend([Segment::fixed("ip-address")]), &host.ip_address)?;
    if let Some(mac) = &host.mac_address {
        proj.defs
            .insert_value(&mapping.extend([Segment::fixed("mac-address")]), mac)?;
    }
    proj.defs.insert_template(&mapping, &host.extra)?;

    for connection in &host.connections {
        let rule_set = network.firewall.name(connection.direction);
        let number = project_rule(proj, rule_set, connection)?;
        debug!(host = %host.name, rule_set, number, "projected firewall rule");
    }
    nat::project(proj, host)?;
    Ok(())
}

/// Add `connection` as the next rule of `rule_set` and return its number.
pub fn project_rule(
    proj: &mut Projection<'_>,
    rule_set: &str,
    connection: &FirewallConnection,
) -> Result<u32, GenerateError> {
    let number = proj.counters.next(&RuleSet::from(rule_set))?;
    let rule = ConfigPath::from_segments([
        Segment::fixed("firewall"),
        Segment::fixed("name"),
        Segment::value(rule_set),
        Segment::fixed("rule"),
        Segment::value(number.to_string()),
    ]);

    proj.defs
        .insert_value(&rule.extend([Segment::fixed("action")]), connection.action())?;
    proj.defs
        .insert_value(&rule.extend([Segment::fixed("protocol")]), &connection.protocol)?;
    proj.defs
        .insert_value(&rule.extend([Segment::fixed("log")]), connection.log_value())?;
    if let Some(description) = &connection.description {
        proj.defs
            .insert_value(&rule.extend([Segment::fixed("description")]), description)?;
    }
    project_side(proj, &rule, "source", connection.source.as_ref())?;
    project_side(proj, &rule, "destination", connection.destination.as_ref())?;
    Ok(number)
}

fn project_side(
    proj: &mut Projection<'_>,
    rule: &ConfigPath,
    side: &str,
    detail: Option<&ConnectionDetail>,
) -> Result<(), GenerateError> {
    let Some(detail) = detail.filter(|detail| !detail.is_empty()) else {
        return Ok(());
    };
    let base = rule.extend([Segment::fixed(side)]);

    if let Some(address) = &detail.address {
        proj.defs
            .insert_value(&base.extend([Segment::fixed("address")]), address)?;
    }
    if let Some(port) = &detail.port {
        proj.defs
            .insert_value(&base.extend([Segment::fixed("port")]), port.to_string())?;
    }
    if let Some(group) = &detail.port_group {
        let path = base.extend([Segment::fixed("group"), Segment::fixed("port-group")]);
        proj.defs.insert_value(&path, group)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vyos_config_core::DefinitionValue;

    use crate::config::GeneratorConfig;
    use crate::transform::generate;
    use crate::transform::tests::{inventory, schema};

    const HOSTS: &str = r#"
networks:
  - name: LAN
    interface: eth1
    firewall: { inbound: LAN-IN, outbound: LAN-OUT, local: LAN-LOCAL }
    subnets:
      - cidr: 192.168.10.0/24
        router: 192.168.10.1
        hosts:
          - name: nas
            ip_address: 192.168.10.5
            mac_address: "00:11:22:33:44:55"
            connections:
              - direction: inbound
                allow: true
                protocol: tcp
                log: true
                description: Allow SMB from office
                source: { address: 192.168.20.0/24 }
                destination: { address: 192.168.10.5, port: 445 }
              - direction: inbound
                allow: false
                destination: { port_group: web }
              - direction: outbound
                allow: true
                source: {}
"#;

    fn value(defs: &vyos_config_core::Definitions, path: &str) -> Option<DefinitionValue> {
        defs.get(path).map(|d| d.value.clone())
    }

    #[test]
    fn static_mapping_holds_address_and_mac() {
        let generation =
            generate(&schema(), &inventory(HOSTS), &GeneratorConfig::default()).expect("generate");
        let mapping =
            "service/dhcp-server/shared-network-name/LAN/subnet/192.168.10.0/24/static-mapping/nas";
        assert_eq!(
            value(&generation.definitions, &format!("{mapping}/mac-address")),
            Some(DefinitionValue::Single("00:11:22:33:44:55".into()))
        );
    }

    #[test]
    fn connections_become_numbered_rules_per_direction() {
        let generation =
            generate(&schema(), &inventory(HOSTS), &GeneratorConfig::default()).expect("generate");
        let defs = &generation.definitions;

        let first = "firewall/name/LAN-IN/rule/1000";
        assert_eq!(
            value(defs, &format!("{first}/action")),
            Some(DefinitionValue::Single("accept".into()))
        );
        assert_eq!(
            value(defs, &format!("{first}/log")),
            Some(DefinitionValue::Single("enable".into()))
        );
        assert_eq!(
            value(defs, &format!("{first}/destination/port")),
            Some(DefinitionValue::Single("445".into()))
        );
        assert_eq!(
            value(defs, &format!("{first}/source/address")),
            Some(DefinitionValue::Single("192.168.20.0/24".into()))
        );

        let second = "firewall/name/LAN-IN/rule/1010";
        assert_eq!(
            value(defs, &format!("{second}/action")),
            Some(DefinitionValue::Single("drop".into()))
        );
        assert_eq!(
            value(defs, &format!("{second}/log")),
            Some(DefinitionValue::Single("disable".into()))
        );
        assert_eq!(
            value(defs, &format!("{second}/protocol")),
            Some(DefinitionValue::Single("all".into()))
        );
        assert_eq!(
            value(defs, &format!("{second}/destination/group/port-group")),
            Some(DefinitionValue::Single("web".into()))
        );
        assert!(!defs.contains(&format!("{second}/source")));

        let outbound = "firewall/name/LAN-OUT/rule/1000";
        assert!(defs.contains(outbound));
        assert!(!defs.contains(&format!("{outbound}/source")));
        assert!(defs.validate().is_empty());
    }
}
