use serde_json::{json, Map, Value};

use crate::utils::expand_interface_name;

fn is_mac(token: &str) -> bool {
    let groups: Vec<&str> = token.split('.').collect();
    groups.len() == 3
        && groups
            .iter()
            .all(|g| g.len() == 4 && g.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parse `show mac address-table`
pub fn parse_mac_address_table(output: &str) -> Value {
    let mut vlans = Map::new();
    let mut total: Option<u64> = None;

    for line in output.lines() {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("Total Mac Addresses for this criterion:") {
            total = rest.trim().parse().ok();
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() < 4 || !is_mac(tokens[1]) {
            continue;
        }

        let vlan = tokens[0];
        let mac = tokens[1].to_lowercase();
        let entry_type = tokens[2].to_lowercase();
        let ports = tokens[tokens.len() - 1];

        let vlan_entry = vlans
            .entry(vlan.to_string())
            .or_insert_with(|| json!({ "vlan": vlan, "mac_addresses": {} }));
        let Some(macs) = vlan_entry
            .get_mut("mac_addresses")
            .and_then(Value::as_object_mut)
        else {
            continue;
        };
        let mac_entry = macs
            .entry(mac.clone())
            .or_insert_with(|| json!({ "mac_address": mac, "interfaces": {} }));

        if let Some(interfaces) = mac_entry.get_mut("interfaces").and_then(Value::as_object_mut) {
            for port in ports.split(',').filter(|p| !p.is_empty()) {
                let name = expand_interface_name(port);
                interfaces.insert(
                    name.clone(),
                    json!({ "interface": name, "entry_type": entry_type }),
                );
            }
        }
    }

    let mut root = Map::new();
    if !vlans.is_empty() {
        root.insert("mac_table".into(), json!({ "vlans": vlans }));
    }
    if let Some(total) = total {
        root.insert("total_mac_addresses".into(), json!(total));
    }
    Value::Object(root)
}
