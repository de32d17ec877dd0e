use serde_json::Value;

/// Interfaces that are never access ports
const EXCLUDED_VLANS: &[&str] = &["trunk", "routed"];
const APP_HOSTING_PORT: &str = "Ap1/0/1";
const UPLINK_MODULE: &str = "/1/";

/// Keep only access interfaces from a parsed `show interfaces status`:
/// trunk and routed ports, the app-hosting port and uplink-module ports are dropped.
pub fn access_interfaces(interfaces_status: &Value) -> Vec<String> {
    let Some(interfaces) = interfaces_status.get("interfaces").and_then(Value::as_object) else {
        return Vec::new();
    };

    interfaces
        .iter()
        .filter(|(name, values)| {
            let vlan = values.get("vlan").and_then(Value::as_str).unwrap_or_default();
            !EXCLUDED_VLANS.contains(&vlan)
                && name.as_str() != APP_HOSTING_PORT
                && !name.contains(UPLINK_MODULE)
        })
        .map(|(name, _)| name.clone())
        .collect()
}
