use serde_json::{json, Map, Value};

use crate::utils::expand_interface_name;

const VLAN_PATTERN: &str = r"^(?P<id>\d+)\s+(?P<name>\S+)\s+(?P<state>active|suspended|act/unsup|act/lshut|sus/lshut|act/ishut|sus/ishut)(?:\s+(?P<ports>.*))?$";

fn split_ports(raw: &str) -> impl Iterator<Item = Value> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Value::String(expand_interface_name(p)))
}

/// Parse `show vlan brief`. Port lists that wrap onto indented continuation
/// lines are appended to the preceding VLAN.
pub fn parse_vlan_brief(output: &str) -> Value {
    let re = match regex_lite::Regex::new(VLAN_PATTERN) {
        Ok(re) => re,
        Err(e) => {
            tracing::error!("Invalid vlan pattern: {}", e);
            return Value::Object(Map::new());
        }
    };

    let mut vlans = Map::new();
    let mut last: Option<String> = None;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(caps) = re.captures(trimmed) {
            let id = caps["id"].to_string();
            let vlan_id: u64 = id.parse().unwrap_or_default();
            let ports: Vec<Value> = caps
                .name("ports")
                .map(|m| split_ports(m.as_str()).collect())
                .unwrap_or_default();
            let mut entry = json!({
                "vlan_id": vlan_id,
                "name": &caps["name"],
                "state": &caps["state"],
            });
            if !ports.is_empty() {
                entry["interfaces"] = Value::Array(ports);
            }
            vlans.insert(id.clone(), entry);
            last = Some(id);
            continue;
        }

        // Wrapped port list
        if line.starts_with(char::is_whitespace) {
            if let Some(entry) = last.as_ref().and_then(|id| vlans.get_mut(id)) {
                let extra: Vec<Value> = split_ports(trimmed).collect();
                if extra.is_empty() {
                    continue;
                }
                match entry.get_mut("interfaces").and_then(Value::as_array_mut) {
                    Some(existing) => existing.extend(extra),
                    None => entry["interfaces"] = Value::Array(extra),
                }
            }
        } else {
            last = None;
        }
    }

    let mut root = Map::new();
    if !vlans.is_empty() {
        root.insert("vlans".into(), Value::Object(vlans));
    }
    Value::Object(root)
}
