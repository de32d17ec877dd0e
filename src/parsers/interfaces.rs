use serde_json::{Map, Value};

use crate::utils::expand_interface_name;

const STATUS_PATTERN: &str = r"^(?P<intf>\S+)(?:\s+(?P<name>.+))?\s+(?P<status>connected|notconnect|suspended|inactive|disabled|err-disabled|monitoring|sfpAbsent|xcvrAbsent|noXcvr|not\s+present|sfp\s+absent)\s+(?P<vlan>\S+)\s+(?P<duplex>\S+)\s+(?P<speed>\S+)(?:\s+(?P<type>.+?))?\s*$";

/// Parse `show interfaces status`. The description is matched greedily, so a status
/// keyword inside it never shifts the remaining columns.
///
/// ```text
/// Port         Name               Status       Vlan       Duplex  Speed Type
/// Gi1/0/1      Printer            connected    10         a-full a-1000 10/100/1000BaseTX
/// Te1/1/1      Uplink             connected    trunk        full    10G SFP-10GBase-SR
/// ```
pub fn parse_interfaces_status(output: &str) -> Value {
    let re = match regex_lite::Regex::new(STATUS_PATTERN) {
        Ok(re) => re,
        Err(e) => {
            tracing::error!("Invalid interface status pattern: {}", e);
            return Value::Object(Map::new());
        }
    };

    let mut interfaces = Map::new();
    for line in output.lines() {
        let Some(caps) = re.captures(line.trim_end()) else {
            continue;
        };
        let full_name = expand_interface_name(&caps["intf"]);

        let mut entry = Map::new();
        if let Some(name) = caps.name("name").map(|m| m.as_str().trim()).filter(|n| !n.is_empty()) {
            entry.insert("name".into(), Value::String(name.to_string()));
        }
        entry.insert("status".into(), Value::String(caps["status"].to_string()));
        entry.insert("vlan".into(), Value::String(caps["vlan"].to_string()));
        entry.insert("duplex_code".into(), Value::String(caps["duplex"].to_string()));
        entry.insert("port_speed".into(), Value::String(caps["speed"].to_string()));
        if let Some(kind) = caps.name("type").map(|m| m.as_str().trim()).filter(|t| !t.is_empty()) {
            entry.insert("type".into(), Value::String(kind.to_string()));
        }
        interfaces.insert(full_name, Value::Object(entry));
    }

    let mut root = Map::new();
    if !interfaces.is_empty() {
        root.insert("interfaces".into(), Value::Object(interfaces));
    }
    Value::Object(root)
}
