use serde_json::{json, Map, Value};

use crate::utils::expand_interface_name;

const SESSION_PATTERN: &str = r"^(?P<intf>\S+)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+(?P<method>\S+)\s+(?P<domain>\S+)\s+(?P<status>\S+)(?:\s+(?P<fg>\S+))?\s+(?P<session>[0-9A-Fa-f]+)$";

/// Parse `show authentication sessions`
///
/// ```text
/// Interface    MAC Address     Method   Domain   Status  Fg Session ID
/// Gi1/0/1      0050.5685.dcb9  dot1x    DATA     Auth        0A0A0A0B0000000C1A2B3C4D
/// ```
pub fn parse_authentication_sessions(output: &str) -> Value {
    let re = match regex_lite::Regex::new(SESSION_PATTERN) {
        Ok(re) => re,
        Err(e) => {
            tracing::error!("Invalid authentication session pattern: {}", e);
            return Value::Object(Map::new());
        }
    };

    let mut root = Map::new();
    let mut interfaces = Map::new();

    for line in output.lines() {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("Session count =") {
            if let Ok(count) = rest.trim().parse::<u64>() {
                root.insert("session_count".into(), json!(count));
            }
            continue;
        }

        let Some(caps) = re.captures(trimmed) else {
            continue;
        };
        let name = expand_interface_name(&caps["intf"]);
        let mac = caps["mac"].to_lowercase();

        let intf_entry = interfaces
            .entry(name.clone())
            .or_insert_with(|| json!({ "interface": name, "client": {} }));
        if let Some(clients) = intf_entry.get_mut("client").and_then(Value::as_object_mut) {
            clients.insert(
                mac.clone(),
                json!({
                    "client": mac,
                    "method": &caps["method"],
                    "domain": &caps["domain"],
                    "status": &caps["status"],
                    "session_id": &caps["session"],
                }),
            );
        }
    }

    if !interfaces.is_empty() {
        root.insert("interfaces".into(), Value::Object(interfaces));
    }
    Value::Object(root)
}
