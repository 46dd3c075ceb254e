use vyos_config_core::{ConfigPath, DefinitionError, Definitions, Segment};

use crate::model::PortGroup;

/// Add `firewall group port-group <name>` with its ports in caller order.
pub fn project(defs: &mut Definitions, group: &PortGroup) -> Result<(), DefinitionError> {
    let base = ConfigPath::from_segments([
        Segment::fixed("firewall"),
        Segment::fixed("group"),
        Segment::fixed("port-group"),
        Segment::value(&group.name),
    ]);
    defs.insert_values(
        &base.extend([Segment::fixed("port")]),
        group.ports.iter().map(ToString::to_string),
    )?;
    if let Some(description) = &group.description {
        defs.insert_value(&base.extend([Segment::fixed("description")]), description)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use vyos_config_core::{DefinitionValue, Definitions};

    use super::project;
    use crate::model::PortGroup;
    use crate::transform::tests::schema;

    #[test]
    fn ports_keep_caller_order() {
        let group: PortGroup =
            serde_yaml::from_str("name: mail\ndescription: Mail\nports: [993, smtp, 25]\n")
                .expect("group");
        let mut defs = Definitions::new(schema());
        project(&mut defs, &group).expect("project");

        assert_eq!(
            defs.get("firewall/group/port-group/mail/port")
                .map(|d| d.value.clone()),
            Some(DefinitionValue::Multi(vec![
                "993".into(),
                "smtp".into(),
                "25".into()
            ]))
        );
        assert!(defs.contains("firewall/group/port-group/mail/description"));
        assert!(defs.validate().is_empty());
    }
}
